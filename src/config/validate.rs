// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CotaskError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = CotaskError;

    fn try_from(mut raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        // Normalise the base URL so path joining stays predictable.
        while raw.remote.base_url.ends_with('/') {
            raw.remote.base_url.pop();
        }

        Ok(ConfigFile::new_unchecked(
            raw.remote,
            raw.session,
            raw.sequence,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_remote(cfg)?;
    validate_session(cfg)?;
    validate_sequence(cfg)?;
    Ok(())
}

fn validate_remote(cfg: &RawConfigFile) -> Result<()> {
    if cfg.remote.base_url.trim().is_empty() {
        return Err(CotaskError::ConfigError(
            "[remote].base_url must not be empty".to_string(),
        ));
    }
    if cfg.remote.timeout_secs == 0 {
        return Err(CotaskError::ConfigError(
            "[remote].timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.remote.poll_interval_secs == 0 {
        return Err(CotaskError::ConfigError(
            "[remote].poll_interval_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_session(cfg: &RawConfigFile) -> Result<()> {
    if let Some(participant) = &cfg.session.participant {
        if participant.trim().is_empty() {
            return Err(CotaskError::ConfigError(
                "[session].participant must not be empty when set".to_string(),
            ));
        }
    }

    if let Some(order) = &cfg.session.saved_block_order {
        for (index, name) in order.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(CotaskError::ConfigError(format!(
                    "[session].saved_block_order entry {index} must not be empty"
                )));
            }
        }
    }

    Ok(())
}

fn validate_sequence(cfg: &RawConfigFile) -> Result<()> {
    if cfg.sequence.terminal_category.trim().is_empty() {
        return Err(CotaskError::ConfigError(
            "[sequence].terminal_category must not be empty".to_string(),
        ));
    }

    for (keyword, label) in cfg.sequence.extra_categories.iter() {
        if keyword.trim().is_empty() {
            return Err(CotaskError::ConfigError(
                "[sequence].extra_categories keys must not be empty".to_string(),
            ));
        }
        if label.trim().is_empty() {
            return Err(CotaskError::ConfigError(format!(
                "[sequence].extra_categories entry '{keyword}' must not have an empty label"
            )));
        }
    }

    Ok(())
}
