//! Markdown summary generation
//!
//! Produces a human-readable report of one session: run metadata, crawl
//! counters and the links each category gained.

use crate::crawler::{LinkRecord, SeedMode};
use crate::output::{CrawlSummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary to `output_path`
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a session summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Sieve-Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Crawl Time**: {:.1} seconds\n",
        summary.stats.elapsed.as_secs_f64()
    ));
    md.push_str(&format!("- **Keywords**: {}\n", summary.keywords.join(", ")));
    let mode = match summary.mode {
        SeedMode::Search => "web search",
        SeedMode::Domains => "custom domains",
    };
    md.push_str(&format!("- **Seed Mode**: {}\n", mode));
    md.push_str(&format!("- **Seeds**: {}\n", summary.seed_count));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Crawl statistics
    let stats = &summary.stats;
    md.push_str("## Crawl Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| URLs visited | {} |\n", stats.claimed));
    md.push_str(&format!("| Fetched | {} |\n", stats.fetched));
    md.push_str(&format!("| Fetch failures | {} |\n", stats.failed));
    md.push_str(&format!("| Relevant pages | {} |\n", stats.relevant));
    md.push_str(&format!("| Duplicates skipped | {} |\n", stats.skipped_visited));
    md.push_str(&format!("| Depth levels | {} |\n\n", stats.levels));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        summary.success_rate()
    ));
    if stats.deadline_reached {
        md.push_str("- **Note**: the crawl deadline was reached; results are partial\n");
    }
    md.push('\n');

    push_links(&mut md, "New Open Links", &summary.open_added);
    push_links(&mut md, "New Form Links", &summary.form_added);

    if summary.pending > 0 {
        md.push_str("## Unwritten Links\n\n");
        md.push_str(&format!(
            "{} links could not be written and were saved for a retry.\n\n",
            summary.pending
        ));
    }

    md
}

fn push_links(md: &mut String, heading: &str, records: &[LinkRecord]) {
    md.push_str(&format!("## {} ({})\n\n", heading, records.len()));
    if records.is_empty() {
        md.push_str("None.\n\n");
        return;
    }

    md.push_str("| Score | Title | URL |\n");
    md.push_str("|-------|-------|-----|\n");
    for record in records {
        md.push_str(&format!(
            "| {:.3} | {} | {} |\n",
            record.score,
            escape_cell(&record.title),
            record.url
        ));
    }
    md.push('\n');
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::LinkCategory;
    use crate::crawler::CrawlStats;
    use chrono::Utc;

    fn summary() -> CrawlSummary {
        CrawlSummary {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            config_hash: "abc123".to_string(),
            keywords: vec!["upi".to_string(), "fraud".to_string()],
            mode: SeedMode::Domains,
            seed_count: 2,
            stats: CrawlStats {
                claimed: 10,
                fetched: 8,
                failed: 2,
                relevant: 1,
                ..CrawlStats::default()
            },
            open_added: vec![LinkRecord::new(
                "Pay | Home",
                "https://x.test/a",
                LinkCategory::Open,
                "",
                0.321,
            )],
            form_added: vec![],
            pending: 0,
        }
    }

    #[test]
    fn test_format_markdown_summary() {
        let md = format_markdown_summary(&summary());

        assert!(md.contains("# Sieve-Crawl Summary"));
        assert!(md.contains("- **Keywords**: upi, fraud"));
        assert!(md.contains("- **Seed Mode**: custom domains"));
        assert!(md.contains("| Fetched | 8 |"));
        assert!(md.contains("- **Success Rate**: 80.00%"));
        assert!(md.contains("## New Open Links (1)"));
        assert!(md.contains(r"| 0.321 | Pay \| Home | https://x.test/a |"));
        assert!(md.contains("## New Form Links (0)"));
        assert!(!md.contains("deadline"));
        assert!(!md.contains("Unwritten"));
    }

    #[test]
    fn test_partial_and_pending_notes() {
        let mut s = summary();
        s.stats.deadline_reached = true;
        s.pending = 3;

        let md = format_markdown_summary(&s);
        assert!(md.contains("crawl deadline was reached"));
        assert!(md.contains("3 links could not be written"));
    }

    #[test]
    fn test_generate_markdown_summary_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");

        generate_markdown_summary(&summary(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Sieve-Crawl Summary"));
    }
}
