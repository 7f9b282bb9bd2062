use std::collections::HashSet;

use super::*;
use crate::decoders::{ChannelPolicy, ControlMarkers};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &DecoderConfig) -> ConfigResult<()> {
        match config {
            DecoderConfig::Bracketed { tag, .. } => Self::validate_tag(tag),
            DecoderConfig::ControlSequence {
                markers, policy, ..
            } => {
                Self::validate_markers(markers)?;
                Self::validate_policy(policy)
            }
            DecoderConfig::Passthrough => Ok(()),
        }
    }

    fn validate_tag(tag: &str) -> ConfigResult<()> {
        if tag.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "tag".to_string(),
            });
        }

        if tag
            .chars()
            .any(|c| c.is_whitespace() || c == '<' || c == '>' || c == '/')
        {
            return Err(ConfigError::InvalidValue {
                field: "tag".to_string(),
                value: tag.to_string(),
                reason: "Must not contain whitespace, '<', '>' or '/'".to_string(),
            });
        }

        Ok(())
    }

    fn validate_markers(markers: &ControlMarkers) -> ConfigResult<()> {
        let named = [
            ("markers.start", &markers.start),
            ("markers.channel", &markers.channel),
            ("markers.message", &markers.message),
            ("markers.end", &markers.end),
        ];

        for (field, value) in named {
            if value.is_empty() {
                return Err(ConfigError::MissingRequired {
                    field: field.to_string(),
                });
            }
        }

        for alias in &markers.end_aliases {
            if alias.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "markers.end_aliases".to_string(),
                    value: String::new(),
                    reason: "Marker must not be empty".to_string(),
                });
            }
        }

        let mut seen = HashSet::new();
        let all = named
            .iter()
            .map(|(_, value)| value.as_str())
            .chain(markers.end_aliases.iter().map(String::as_str));
        for marker in all {
            if !seen.insert(marker) {
                return Err(ConfigError::InvalidValue {
                    field: "markers".to_string(),
                    value: marker.to_string(),
                    reason: "Markers must be distinct".to_string(),
                });
            }
        }

        Ok(())
    }

    fn validate_policy(policy: &ChannelPolicy) -> ConfigResult<()> {
        let name = policy.channel_name();
        if name.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "policy.channel".to_string(),
            });
        }

        if name.split_whitespace().count() > 1 {
            return Err(ConfigError::InvalidValue {
                field: "policy.channel".to_string(),
                value: name.to_string(),
                reason: "Channel names are compared on a single word".to_string(),
            });
        }

        Ok(())
    }
}
