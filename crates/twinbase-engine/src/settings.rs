//! Engine settings
//!
//! Loaded from TOML. Every field has a default, so an empty document is a
//! valid configuration:
//!
//! ```toml
//! [invocation]
//! default_timeout_ms = 60000
//! late_completion = "overwrite"
//!
//! [pagination]
//! default_limit = 100
//! max_limit = 1000
//!
//! [logging]
//! profile = "development"
//! ```

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use twinbase_core::logging_facility::{self, Profile};
use twinbase_core::pagination::DEFAULT_PAGE_LIMIT;
use twinbase_core::{Result, TwinError};
use twinbase_invocation::{InvocationSettings, LateCompletion};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    pub invocation: InvocationSection,
    pub pagination: PaginationSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InvocationSection {
    /// Deadline for requests without their own timeout
    pub default_timeout_ms: u64,
    pub late_completion: LateCompletion,
}

impl Default for InvocationSection {
    fn default() -> Self {
        Self {
            default_timeout_ms: twinbase_invocation::engine::DEFAULT_TIMEOUT.as_millis() as u64,
            late_completion: LateCompletion::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationSection {
    /// Page size when the caller gives none
    pub default_limit: usize,
    /// Larger requested page sizes are clamped to this
    pub max_limit: usize,
}

impl Default for PaginationSection {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: 1000,
        }
    }
}

impl PaginationSection {
    /// Effective page size for a requested limit
    ///
    /// Zero is passed through so pagination can reject it.
    pub fn limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .min(self.max_limit)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub profile: Profile,
}

impl EngineSettings {
    /// # Errors
    /// * `Config` - If the document is not valid TOML or has unknown or
    ///   mistyped fields, or a limit is zero
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let settings: EngineSettings = toml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// # Errors
    /// * `Config` - If the file cannot be read, or as for
    ///   [`EngineSettings::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| TwinError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&source)
    }

    /// Install the global subscriber for the configured profile
    ///
    /// See [`logging_facility::init`]; later calls have no effect.
    pub fn init_logging(&self) {
        logging_facility::init(self.logging.profile);
    }

    pub fn invocation_settings(&self) -> InvocationSettings {
        InvocationSettings {
            default_timeout: Duration::from_millis(self.invocation.default_timeout_ms),
            late_completion: self.invocation.late_completion,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.pagination.default_limit == 0 || self.pagination.max_limit == 0 {
            return Err(TwinError::Config {
                message: "pagination limits must be at least 1".to_string(),
            });
        }
        if self.invocation.default_timeout_ms == 0 {
            return Err(TwinError::Config {
                message: "invocation.default_timeout_ms must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let settings = EngineSettings::from_toml_str("").unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert_eq!(settings.invocation.default_timeout_ms, 60_000);
        assert_eq!(settings.pagination.default_limit, 100);
        assert_eq!(settings.logging.profile, Profile::Development);
    }

    #[test]
    fn test_sections_override_defaults() {
        let settings = EngineSettings::from_toml_str(
            r#"
            [invocation]
            default_timeout_ms = 250
            late_completion = "discard"

            [pagination]
            max_limit = 10

            [logging]
            profile = "production"
            "#,
        )
        .unwrap();

        let invocation = settings.invocation_settings();
        assert_eq!(invocation.default_timeout, Duration::from_millis(250));
        assert_eq!(invocation.late_completion, LateCompletion::Discard);
        assert_eq!(settings.pagination.default_limit, 100);
        assert_eq!(settings.logging.profile, Profile::Production);
    }

    #[test]
    fn test_limit_clamps_to_max() {
        let pagination = PaginationSection {
            default_limit: 5,
            max_limit: 10,
        };
        assert_eq!(pagination.limit(None), 5);
        assert_eq!(pagination.limit(Some(3)), 3);
        assert_eq!(pagination.limit(Some(50)), 10);
        assert_eq!(pagination.limit(Some(0)), 0);
    }

    #[test]
    fn test_invalid_documents_are_config_errors() {
        for source in [
            "[invocation\n",
            "[invocation]\nlate_completion = \"sometimes\"\n",
            "[pagination]\nmax_limit = 0\n",
            "[unknown]\n",
        ] {
            assert!(
                matches!(
                    EngineSettings::from_toml_str(source),
                    Err(TwinError::Config { .. })
                ),
                "accepted {:?}",
                source
            );
        }
    }
}
