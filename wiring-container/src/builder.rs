//! Builds a [`Container`] from registrations, providers and options.

use tracing::{debug, info, instrument, warn};

use crate::binding::{Binding, DecoratorBinding};
use crate::container::Container;
use crate::error::{Result, WiringError};
use crate::generic::OpenGeneric;
use crate::options::ContainerOptions;
use crate::provider::{Provider, ProviderRegistry, discovered_providers};

enum Pending {
    Binding(Binding),
    Decorator(DecoratorBinding),
    OpenGeneric(OpenGeneric),
}

/// Collects registrations, then creates a root [`Container`].
///
/// The builder implements [`ProviderRegistry`], so the typed
/// [`RegistrationApi`](crate::provider::RegistrationApi) methods work on it
/// directly.
///
/// # Examples
/// ```rust
/// use std::sync::Arc;
/// use wiring_container::prelude::*;
///
/// let mut builder = Container::builder();
/// builder.register_singleton_instance::<String>(Arc::new("postgres://localhost".into()))?;
///
/// let container = builder.build().unwrap();
/// assert_eq!(container.resolve::<String>().unwrap().as_str(), "postgres://localhost");
/// # Ok::<(), WiringError>(())
/// ```
pub struct ContainerBuilder {
    pending: Vec<Pending>,
    options: ContainerOptions,
    /// First error raised by a provider or `configure` closure.
    failure: Option<WiringError>,
}

impl ContainerBuilder {
    pub(crate) fn new() -> Self {
        Self {
            pending: Vec::new(),
            options: ContainerOptions::default(),
            failure: None,
        }
    }

    /// Replaces the container options.
    pub fn options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    /// Enables or disables verification in [`build`](ContainerBuilder::build).
    pub fn verify_on_build(mut self, verify: bool) -> Self {
        self.options.verify_on_build = verify;
        self
    }

    /// Applies a [`Provider`] module.
    ///
    /// An error from the provider is kept and returned by
    /// [`build`](ContainerBuilder::build).
    pub fn add_provider(mut self, provider: &dyn Provider) -> Self {
        debug!(provider = provider.name(), "Applying provider");
        let outcome = provider.register(&mut self);
        self.keep_failure(outcome);
        self
    }

    /// Applies every provider submitted with
    /// [`submit_provider!`](crate::submit_provider).
    pub fn discover_providers(mut self) -> Self {
        for registration in discovered_providers() {
            debug!(provider = registration.name, "Applying discovered provider");
            let outcome = (registration.register)(&mut self);
            self.keep_failure(outcome);
        }
        self
    }

    /// Applies registrations through a closure, keeping the builder chain.
    pub fn configure(mut self, configure: impl FnOnce(&mut Self) -> Result<()>) -> Self {
        let outcome = configure(&mut self);
        self.keep_failure(outcome);
        self
    }

    fn keep_failure(&mut self, outcome: Result<()>) {
        if let Err(error) = outcome {
            warn!(error = %error, "Registration failed");
            self.failure.get_or_insert(error);
        }
    }

    /// Creates the container, verifying the graph if enabled.
    ///
    /// # Errors
    /// The first error raised by a provider or `configure` closure, or
    /// [`WiringError::InvalidConfiguration`] if verification finds errors.
    #[instrument(skip(self), name = "container_build", fields(pending = self.pending.len()))]
    pub fn build(self) -> Result<Container> {
        if let Some(error) = self.failure {
            return Err(error);
        }

        let verify = self.options.verify_on_build;
        let container = Container::with_options(self.options);

        for pending in self.pending {
            match pending {
                Pending::Binding(binding) => container.register(binding)?,
                Pending::Decorator(decorator) => container.decorate(decorator)?,
                Pending::OpenGeneric(open) => container.register_family(open)?,
            }
        }

        if verify {
            let report = container.verify();
            if !report.is_valid {
                container.dispose();
                return Err(WiringError::InvalidConfiguration(Box::new(report)));
            }
        }

        info!(bindings = container.all_bindings().len(), "Container built");
        Ok(container)
    }
}

impl ProviderRegistry for ContainerBuilder {
    fn add_binding(&mut self, binding: Binding) -> Result<()> {
        self.pending.push(Pending::Binding(binding));
        Ok(())
    }

    fn add_decorator(&mut self, decorator: DecoratorBinding) -> Result<()> {
        self.pending.push(Pending::Decorator(decorator));
        Ok(())
    }

    fn add_open_generic(&mut self, open: OpenGeneric) -> Result<()> {
        self.pending.push(Pending::OpenGeneric(open));
        Ok(())
    }
}

impl std::fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("pending", &self.pending.len())
            .field("options", &self.options)
            .field("failed", &self.failure.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injectable::Injectable;
    use crate::key::ServiceKey;
    use crate::provider::RegistrationApi;
    use crate::resolver::{Resolver, ResolverApi};
    use std::sync::Arc;

    struct Database;
    struct Repository {
        _db: Arc<Database>,
    }

    impl Injectable for Repository {
        fn dependencies() -> Vec<ServiceKey> {
            vec![ServiceKey::of::<Database>()]
        }

        fn inject(resolver: &dyn Resolver) -> Result<Self> {
            Ok(Repository { _db: resolver.resolve()? })
        }
    }

    #[test]
    fn build_with_valid_graph() {
        let container = Container::builder()
            .configure(|b| {
                b.register_singleton_instance(Arc::new(Database))?
                    .register_transient::<Repository, Repository>()?;
                Ok(())
            })
            .build()
            .unwrap();

        assert!(container.resolve::<Repository>().is_ok());
    }

    #[test]
    fn build_rejects_dangling_dependency() {
        let result = Container::builder()
            .configure(|b| {
                b.register_transient::<Repository, Repository>()?;
                Ok(())
            })
            .build();

        match result {
            Err(WiringError::InvalidConfiguration(report)) => {
                assert_eq!(report.errors.len(), 1);
                assert!(report.errors[0].contains("Database"));
            }
            other => panic!("Expected InvalidConfiguration, got: {other:?}"),
        }
    }

    #[test]
    fn verification_can_be_disabled() {
        let container = Container::builder()
            .verify_on_build(false)
            .configure(|b| {
                b.register_transient::<Repository, Repository>()?;
                Ok(())
            })
            .build()
            .unwrap();

        assert!(container.resolve::<Repository>().is_err());
    }

    #[test]
    fn options_reach_the_container() {
        let options = ContainerOptions {
            suggestion_limit: 1,
            ..ContainerOptions::default()
        };
        let container = Container::builder().options(options.clone()).build().unwrap();
        assert_eq!(container.options(), &options);
    }

    #[test]
    fn provider_failure_fails_the_build() {
        struct Broken;
        impl Provider for Broken {
            fn register(&self, registry: &mut dyn ProviderRegistry) -> Result<()> {
                registry.register_singleton_instance(Arc::new(Database))?;
                Err(WiringError::custom("missing connection string"))
            }
        }

        let result = Container::builder().add_provider(&Broken).build();
        assert!(matches!(result, Err(WiringError::Custom(_))), "{result:?}");
    }
}
