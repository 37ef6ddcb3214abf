//! Error types for container operations.
//!
//! Every resolution failure carries the key that failed and, where it
//! matters, the resolution path that led to it.

use std::fmt;

use wiring_support::rendering::render_chain;

use crate::key::ServiceKey;
use crate::verify::VerificationResult;

/// Boxed error raised by user code inside factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all container operations.
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    /// No binding (and no satisfied conditional binding) for the requested key.
    #[error("{}", .0)]
    ServiceNotRegistered(NotRegisteredError),

    /// A named lookup found no binding with that name.
    #[error("{}", .0)]
    NamedServiceNotFound(NamedServiceNotFoundError),

    /// The requested key is already being resolved further up the path.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// The container (or the container owning the binding) was disposed.
    #[error("Container has been disposed")]
    ContainerDisposed,

    /// A factory or constructor failed while building an instance.
    #[error("Failed to construct {key}: {source}{}", render_path(.path))]
    ConstructionFailure {
        key: ServiceKey,
        path: Vec<ServiceKey>,
        #[source]
        source: BoxError,
    },

    /// A produced instance did not have the type the binding promised.
    #[error("Type mismatch for {key}: expected {expected}")]
    TypeMismatch {
        key: ServiceKey,
        expected: &'static str,
    },

    /// An error raised by user code inside a factory.
    ///
    /// The engine rewrites it into [`WiringError::ConstructionFailure`]
    /// once it knows which binding was being built.
    #[error("{0}")]
    Custom(BoxError),

    /// Verification ran at build time and found errors.
    #[error("Container configuration is invalid:\n{0}")]
    InvalidConfiguration(Box<VerificationResult>),
}

impl WiringError {
    /// Wraps any error raised inside a factory.
    ///
    /// ```
    /// use wiring_container::error::WiringError;
    ///
    /// let err = WiringError::custom("connection refused");
    /// assert_eq!(err.to_string(), "connection refused");
    /// ```
    pub fn custom(source: impl Into<BoxError>) -> Self {
        WiringError::Custom(source.into())
    }

    /// Returns `true` if this is a not-registered failure for `key` itself,
    /// as opposed to one of its dependencies.
    pub fn is_not_registered(&self, key: &ServiceKey) -> bool {
        matches!(self, WiringError::ServiceNotRegistered(e) if e.requested == *key)
    }

    /// Attaches the binding being built to user-raised errors.
    pub(crate) fn during_construction(self, key: &ServiceKey, path: Vec<ServiceKey>) -> Self {
        match self {
            WiringError::Custom(source) => WiringError::ConstructionFailure {
                key: key.clone(),
                path,
                source,
            },
            other => other,
        }
    }
}

fn render_path(path: &[ServiceKey]) -> String {
    if path.len() < 2 {
        return String::new();
    }
    let names: Vec<String> = path.iter().map(ServiceKey::short_name).collect();
    format!("\n  Resolution path: {}", render_chain(&names))
}

/// Error when a service was not registered.
///
/// Includes helpful hints about what went wrong.
#[derive(Debug)]
pub struct NotRegisteredError {
    /// The service that was requested
    pub requested: ServiceKey,
    /// What required this service (if known)
    pub required_by: Option<ServiceKey>,
    /// Keys being resolved when the miss happened, outermost first
    pub path: Vec<ServiceKey>,
    /// Similar types that ARE registered (for "did you mean?" suggestions)
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Service not registered: {}", self.requested)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        write!(f, "{}", render_path(&self.path))?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: register a binding for {} or resolve it with try_resolve",
            self.requested.short_name()
        )
    }
}

/// Error when a named lookup misses.
#[derive(Debug)]
pub struct NamedServiceNotFoundError {
    /// The named key that was requested
    pub requested: ServiceKey,
    /// Names that are registered for the same service type
    pub available: Vec<String>,
}

impl fmt::Display for NamedServiceNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No binding named {:?} for {}",
            self.requested.name().unwrap_or_default(),
            self.requested.type_name()
        )?;

        if self.available.is_empty() {
            write!(f, "\n  No named bindings exist for this type")
        } else {
            write!(f, "\n  Available names: {}", self.available.join(", "))
        }
    }
}

/// Error when a circular dependency is detected.
///
/// Shows the full dependency chain so you can see WHERE the cycle is.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// The chain of keys that forms the cycle, e.g. `[A, B, A]`.
    pub chain: Vec<ServiceKey>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.chain.iter().map(ServiceKey::short_name).collect();
        write!(f, "Circular dependency detected:\n  {}", render_chain(&names))?;
        write!(
            f,
            "\n  Hint: resolve one side lazily through the resolver, or restructure the services"
        )
    }
}

/// Convenient Result type for container operations.
pub type Result<T> = std::result::Result<T, WiringError>;

#[cfg(test)]
mod tests {
    use super::*;

    struct Database;

    #[test]
    fn not_registered_error_display() {
        let err = WiringError::ServiceNotRegistered(NotRegisteredError {
            requested: ServiceKey::of::<String>(),
            required_by: Some(ServiceKey::of::<Vec<u8>>()),
            path: vec![ServiceKey::of::<Vec<u8>>(), ServiceKey::of::<String>()],
            suggestions: vec!["alloc::string::Str".into()],
        });

        let msg = format!("{err}");
        assert!(msg.contains("not registered"));
        assert!(msg.contains("String"));
        assert!(msg.contains("Required by"));
        assert!(msg.contains("Vec<u8> → String"));
        assert!(msg.contains("Did you mean"));
    }

    #[test]
    fn circular_dependency_error_display() {
        let err = WiringError::CircularDependency(CircularDependencyError {
            chain: vec![
                ServiceKey::of::<String>(),
                ServiceKey::of::<i32>(),
                ServiceKey::of::<String>(),
            ],
        });

        let msg = format!("{err}");
        assert!(msg.contains("Circular"));
        assert!(msg.contains("String → i32 → String"));
    }

    #[test]
    fn named_not_found_lists_alternatives() {
        let err = WiringError::NamedServiceNotFound(NamedServiceNotFoundError {
            requested: ServiceKey::named::<Database>("replica"),
            available: vec!["primary".into()],
        });

        let msg = err.to_string();
        assert!(msg.contains("\"replica\""));
        assert!(msg.contains("primary"));
    }

    #[test]
    fn custom_becomes_construction_failure() {
        let key = ServiceKey::of::<Database>();
        let err = WiringError::custom("boom").during_construction(&key, vec![key.clone()]);

        match err {
            WiringError::ConstructionFailure { key: failed, source, .. } => {
                assert_eq!(failed, key);
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("Expected ConstructionFailure, got: {other:?}"),
        }
    }

    #[test]
    fn other_errors_pass_through_construction() {
        let key = ServiceKey::of::<Database>();
        let err = WiringError::ContainerDisposed.during_construction(&key, vec![]);
        assert!(matches!(err, WiringError::ContainerDisposed));
    }

    #[test]
    fn is_not_registered_only_matches_the_requested_key() {
        let err = WiringError::ServiceNotRegistered(NotRegisteredError {
            requested: ServiceKey::of::<String>(),
            required_by: None,
            path: vec![],
            suggestions: vec![],
        });

        assert!(err.is_not_registered(&ServiceKey::of::<String>()));
        assert!(!err.is_not_registered(&ServiceKey::of::<Database>()));
    }
}
