use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input, spanned::Spanned};

/// Implements `HasActivityKey` for a struct.
///
/// The key is the field marked `#[activity_key]`, or otherwise the field named `activity_key`.
#[proc_macro_derive(ActivityKey, attributes(activity_key))]
pub fn derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new(
                    input.ident.span(),
                    "ActivityKey can only be derived for structs with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(input.span(), "ActivityKey can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let marked = fields.iter().find(|field| {
        field
            .attrs
            .iter()
            .any(|attr| attr.path().is_ident("activity_key"))
    });
    let named = fields.iter().find(|field| {
        field
            .ident
            .as_ref()
            .is_some_and(|ident| ident == "activity_key")
    });

    let field = match marked.or(named).and_then(|field| field.ident.as_ref()) {
        Some(field) => field,
        None => {
            return syn::Error::new(
                input.ident.span(),
                "no activity key found: mark a field with #[activity_key] or name it `activity_key`",
            )
            .to_compile_error()
            .into();
        }
    };

    let ident = &input.ident;
    let (impl_generics, type_generics, where_clause) = input.generics.split_for_impl();

    quote! {
        impl #impl_generics crate::ebi_framework::activity_key::HasActivityKey for #ident #type_generics #where_clause {
            fn get_activity_key(&self) -> &crate::ebi_framework::activity_key::ActivityKey {
                &self.#field
            }

            fn get_activity_key_mut(&mut self) -> &mut crate::ebi_framework::activity_key::ActivityKey {
                &mut self.#field
            }
        }
    }
    .into()
}
