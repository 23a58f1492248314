//! Registry limits and their validation.

use thiserror::Error;

/// Limits enforced by a [`BufferRegistry`](crate::BufferRegistry).
///
/// `None` means unlimited. Element counts are additionally bounded by the
/// tensor format itself (`u32` element and byte counts).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Maximum number of simultaneously live buffers.
    pub max_live_buffers: Option<usize>,
    /// Maximum element count of a single buffer.
    pub max_elements: Option<usize>,
}

/// Errors detected by [`RegistryConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A limit was set to zero, which would reject every allocation.
    #[error("{field} must be at least 1 when set")]
    ZeroLimit {
        /// Name of the offending field.
        field: &'static str,
    },
}

impl RegistryConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_live_buffers == Some(0) {
            return Err(ConfigError::ZeroLimit {
                field: "max_live_buffers",
            });
        }
        if self.max_elements == Some(0) {
            return Err(ConfigError::ZeroLimit {
                field: "max_elements",
            });
        }
        Ok(())
    }

    /// Build from the raw C representation where 0 means unlimited.
    pub fn from_raw(max_live_buffers: u64, max_elements: u64) -> Self {
        let limit = |v: u64| (v != 0).then(|| usize::try_from(v).unwrap_or(usize::MAX));
        Self {
            max_live_buffers: limit(max_live_buffers),
            max_elements: limit(max_elements),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unlimited_and_valid() {
        let cfg = RegistryConfig::default();
        assert_eq!(cfg.max_live_buffers, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_limits_rejected() {
        let cfg = RegistryConfig {
            max_live_buffers: Some(0),
            max_elements: None,
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ZeroLimit {
                field: "max_live_buffers"
            })
        );
        let cfg = RegistryConfig {
            max_live_buffers: None,
            max_elements: Some(0),
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn raw_zero_means_unlimited() {
        let cfg = RegistryConfig::from_raw(0, 16);
        assert_eq!(cfg.max_live_buffers, None);
        assert_eq!(cfg.max_elements, Some(16));
        assert!(cfg.validate().is_ok());
    }
}
