/// Façade configuration.
use crate::path::RefPath;
use serde::{Deserialize, Serialize};

/// Environment variable selecting the runtime environment.
pub const ENV_VAR: &str = "REFDB_ENV";

/// Path prefix applied to every ref in the test environment.
pub const TEST_PREFIX: &str = "__test__";

/// Configuration for a [`crate::RefDb`] instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefDbConfig {
    /// Prefix joined in front of every path the façade touches.
    pub path_prefix: Option<String>,
}

impl RefDbConfig {
    /// Configuration for tests: every path is moved under `/__test__`.
    pub fn testing() -> Self {
        Self {
            path_prefix: Some(TEST_PREFIX.to_string()),
        }
    }

    /// Read the configuration from the environment.
    ///
    /// `REFDB_ENV=test` selects [`RefDbConfig::testing`]; anything else
    /// (or an unset variable) selects the default.
    pub fn from_env() -> Self {
        Self::for_environment(std::env::var(ENV_VAR).ok().as_deref())
    }

    fn for_environment(env: Option<&str>) -> Self {
        match env {
            Some("test") => Self::testing(),
            _ => Self::default(),
        }
    }

    /// Set the path prefix.
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    /// Apply the configured prefix to `path`.
    pub fn resolve(&self, path: &str) -> RefPath {
        let path = RefPath::new(path);
        match &self.path_prefix {
            Some(prefix) => path.under(&RefPath::new(prefix)),
            None => path,
        }
    }
}
