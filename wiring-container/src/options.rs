//! Container configuration.

use serde::{Deserialize, Serialize};

/// Behaviour switches for a container and the scopes created from it.
///
/// Deserializable, so hosts can keep these next to their own settings:
///
/// ```
/// use wiring_container::options::ContainerOptions;
///
/// let options: ContainerOptions = serde_json::from_str(r#"{ "suggestion_limit": 5 }"#).unwrap();
/// assert_eq!(options.suggestion_limit, 5);
/// assert!(options.verify_on_build);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// Run verification in `ContainerBuilder::build` and refuse invalid graphs.
    pub verify_on_build: bool,
    /// Maximum number of "did you mean" suggestions in not-registered errors.
    pub suggestion_limit: usize,
    /// Dispose cached instances when the last handle to a container drops.
    pub dispose_on_drop: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            verify_on_build: true,
            suggestion_limit: 3,
            dispose_on_drop: true,
        }
    }
}
