use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - System time zone is a known IANA zone
/// - Ticket prefix is non-empty and has no `-` (it separates id segments)
/// - Retry and dispatch bounds are at least 1
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.queue.system_zone().is_none() {
        return Err(ConfigError::ValidationError(format!(
            "queue.system_timezone '{}' is not a known time zone",
            config.queue.system_timezone
        )));
    }

    let prefix = config.queue.ticket_prefix.trim();
    if prefix.is_empty() || prefix.contains('-') {
        return Err(ConfigError::ValidationError(
            "queue.ticket_prefix must be non-empty and must not contain '-'".to_string(),
        ));
    }

    if config.sequence.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "sequence.max_attempts must be at least 1".to_string(),
        ));
    }

    if config.dispatch.candidate_batch == 0 {
        return Err(ConfigError::ValidationError(
            "dispatch.candidate_batch must be at least 1".to_string(),
        ));
    }

    if config.dispatch.max_rounds == 0 {
        return Err(ConfigError::ValidationError(
            "dispatch.max_rounds must be at least 1".to_string(),
        ));
    }

    Ok(())
}
