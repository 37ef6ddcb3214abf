use darling::ast::{Data, Style};
use darling::util::Ignored;
use darling::{FromDeriveInput, FromField};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, GenericArgument, Ident, LitStr, PathArguments, Type};

#[derive(FromDeriveInput)]
#[darling(attributes(injectable), supports(struct_any))]
struct InjectableInput {
    ident: Ident,
    generics: syn::Generics,
    data: Data<Ignored, InjectField>,
    #[darling(multiple)]
    provides: Vec<LitStr>,
    #[darling(default)]
    dispose: bool,
}

#[derive(FromField)]
#[darling(attributes(inject))]
struct InjectField {
    ident: Option<Ident>,
    ty: Type,
    #[darling(default)]
    name: Option<String>,
    #[darling(default)]
    optional: bool,
    #[darling(default)]
    all: bool,
    #[darling(default)]
    default: bool,
}

/// How one field is filled in.
struct FieldPlan {
    dependency: Option<TokenStream>,
    value: TokenStream,
}

impl InjectField {
    fn plan(&self) -> darling::Result<FieldPlan> {
        let modes = [self.name.is_some(), self.optional, self.all, self.default];
        if modes.iter().filter(|&&set| set).count() > 1 {
            return Err(darling::Error::custom(
                "`name`, `optional`, `all` and `default` are mutually exclusive",
            )
            .with_span(&self.ty));
        }

        if self.default {
            return Ok(FieldPlan {
                dependency: None,
                value: quote!(::core::default::Default::default()),
            });
        }

        if self.all {
            let service = unwrap_type(&self.ty, &["Vec", "Arc"])?;
            return Ok(FieldPlan {
                dependency: None,
                value: quote!(::wiring::ResolverApi::resolve_all::<#service>(resolver)?),
            });
        }

        if self.optional {
            let service = unwrap_type(&self.ty, &["Option", "Arc"])?;
            return Ok(FieldPlan {
                dependency: None,
                value: quote!(::wiring::ResolverApi::try_resolve::<#service>(resolver)?),
            });
        }

        let service = unwrap_type(&self.ty, &["Arc"])?;
        Ok(match &self.name {
            Some(name) => FieldPlan {
                dependency: Some(quote!(::wiring::ServiceKey::named::<#service>(#name))),
                value: quote!(::wiring::ResolverApi::resolve_named::<#service>(resolver, #name)?),
            },
            None => FieldPlan {
                dependency: Some(quote!(::wiring::ServiceKey::of::<#service>())),
                value: quote!(::wiring::ResolverApi::resolve::<#service>(resolver)?),
            },
        })
    }
}

/// Peels `wrappers` off `ty` from the outside in, e.g. `Option<Arc<T>>` to `T`.
fn unwrap_type<'a>(ty: &'a Type, wrappers: &[&str]) -> darling::Result<&'a Type> {
    let mut current = ty;
    for wrapper in wrappers {
        current = generic_argument(current, wrapper).ok_or_else(|| {
            let expected = wrappers
                .iter()
                .rev()
                .fold("T".to_string(), |inner, outer| format!("{outer}<{inner}>"));
            darling::Error::custom(format!("expected a field of type `{expected}`")).with_span(ty)
        })?;
    }
    Ok(current)
}

fn generic_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };
    match arguments.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

pub(crate) fn expand(input: &DeriveInput) -> darling::Result<TokenStream> {
    let input = InjectableInput::from_derive_input(input)?;
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = input
        .data
        .as_ref()
        .take_struct()
        .ok_or_else(|| darling::Error::unsupported_shape("enum"))?;

    let mut errors = darling::Error::accumulator();
    let mut dependencies = Vec::new();
    let mut values = Vec::new();
    for field in fields.fields.iter() {
        if let Some(plan) = errors.handle(field.plan()) {
            dependencies.extend(plan.dependency);
            values.push((field.ident.clone(), plan.value));
        }
    }

    let mut services = Vec::new();
    for literal in &input.provides {
        if let Some(service) = errors.handle(literal.parse::<Type>().map_err(darling::Error::from)) {
            services.push(service);
        }
    }
    errors.finish()?;

    let construct = match fields.style {
        Style::Struct => {
            let assignments = values.iter().map(|(name, value)| quote!(#name: #value));
            quote!(Self { #(#assignments),* })
        }
        Style::Tuple => {
            let values = values.iter().map(|(_, value)| value);
            quote!(Self( #(#values),* ))
        }
        Style::Unit => quote!(Self),
    };

    let disposer = input.dispose.then(|| {
        quote! {
            fn disposer(
                this: &::std::sync::Arc<Self>,
            ) -> ::core::option::Option<::std::sync::Arc<dyn ::wiring::Dispose>> {
                ::core::option::Option::Some(
                    ::std::sync::Arc::clone(this) as ::std::sync::Arc<dyn ::wiring::Dispose>
                )
            }
        }
    });

    let upcasts = services.iter().map(|service| {
        quote! {
            impl #impl_generics ::wiring::Upcast<#service> for #ident #ty_generics #where_clause {
                #[inline]
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<#service> {
                    self
                }
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::wiring::Injectable for #ident #ty_generics #where_clause {
            fn dependencies() -> ::std::vec::Vec<::wiring::ServiceKey> {
                ::std::vec![#(#dependencies),*]
            }

            #[allow(unused_variables)]
            fn inject(resolver: &dyn ::wiring::Resolver) -> ::wiring::Result<Self> {
                ::core::result::Result::Ok(#construct)
            }

            #disposer
        }

        #(#upcasts)*
    })
}
