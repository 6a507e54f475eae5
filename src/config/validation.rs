use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, ScoringConfig, ScoringStrategy, SeedsConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_scoring_config(&config.scoring)?;
    validate_search_endpoint(&config.search.endpoint)?;
    validate_seeds(&config.seeds)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler bounds
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.crawl_timeout == 0 {
        return Err(ConfigError::Validation(
            "crawl_timeout must be > 0 seconds".to_string(),
        ));
    }

    if config.fetch_timeout == 0 {
        return Err(ConfigError::Validation(
            "fetch_timeout must be > 0 seconds".to_string(),
        ));
    }

    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 64, got {}",
            config.max_concurrent_fetches
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates thresholds and the embedding endpoint
fn validate_scoring_config(config: &ScoringConfig) -> Result<(), ConfigError> {
    validate_threshold("lexical_threshold", config.lexical_threshold)?;
    validate_threshold("embedding_threshold", config.embedding_threshold)?;

    match (&config.strategy, &config.embedding) {
        (ScoringStrategy::Embedding, None) => Err(ConfigError::Validation(
            "strategy 'embedding' requires a [scoring.embedding] table".to_string(),
        )),
        (_, Some(embedding)) => {
            validate_http_url("scoring.embedding.endpoint", &embedding.endpoint)?;
            if embedding.model.is_empty() {
                return Err(ConfigError::Validation(
                    "scoring.embedding.model cannot be empty".to_string(),
                ));
            }
            if embedding.max_input_chars == 0 {
                return Err(ConfigError::Validation(
                    "scoring.embedding.max_input_chars must be greater than 0".to_string(),
                ));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Cosine similarity lives in [-1, 1]; anything outside can never match
fn validate_threshold(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be within [-1, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_search_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    validate_http_url("search.endpoint", endpoint)
}

/// Validates the static seed list
fn validate_seeds(config: &SeedsConfig) -> Result<(), ConfigError> {
    for seed in &config.custom_domains {
        validate_http_url("custom domain", seed)?;
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.open_path.is_empty() {
        return Err(ConfigError::Validation(
            "open_path cannot be empty".to_string(),
        ));
    }

    if config.form_path.is_empty() {
        return Err(ConfigError::Validation(
            "form_path cannot be empty".to_string(),
        ));
    }

    if config.open_path == config.form_path {
        return Err(ConfigError::Validation(format!(
            "open_path and form_path must differ, both are '{}'",
            config.open_path
        )));
    }

    if config.pending_path.is_empty() {
        return Err(ConfigError::Validation(
            "pending_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_http_url(what: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            what, value
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
