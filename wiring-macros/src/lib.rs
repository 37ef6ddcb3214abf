//! Procedural macros for wiring.
//!
//! Use them through the `wiring` crate, which re-exports everything the
//! generated code refers to.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod injectable;

/// Derives `wiring::Injectable` for a struct.
///
/// Every field is resolved from the container:
///
/// | Field                                    | Resolved with            |
/// |------------------------------------------|--------------------------|
/// | `Arc<T>`                                 | `resolve::<T>()`         |
/// | `#[inject(name = "x")] Arc<T>`           | `resolve_named::<T>("x")`|
/// | `#[inject(optional)] Option<Arc<T>>`     | `try_resolve::<T>()`     |
/// | `#[inject(all)] Vec<Arc<T>>`             | `resolve_all::<T>()`     |
/// | `#[inject(default)] T`                   | `T::default()`           |
///
/// Plain and named fields are reported as dependencies for verification.
///
/// Struct-level options:
/// - `#[injectable(provides = "dyn Trait")]`, repeatable, implements
///   `Upcast<dyn Trait>` so the type can be bound to the trait object.
/// - `#[injectable(dispose)]` hands cached instances to the type's
///   `Dispose` implementation on container disposal.
///
/// ```rust,ignore
/// #[derive(Injectable)]
/// #[injectable(provides = "dyn UserService")]
/// struct DefaultUserService {
///     repo: Arc<dyn UserRepository>,
///     #[inject(name = "audit")]
///     log: Arc<dyn Logger>,
///     #[inject(optional)]
///     metrics: Option<Arc<Metrics>>,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(inject, injectable))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    injectable::expand(&input)
        .unwrap_or_else(darling::Error::write_errors)
        .into()
}
