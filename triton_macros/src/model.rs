use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, LitStr};

pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let collection = extract_collection(input)?;
    let fields = named_fields(input)?;
    let id_field = extract_id_field(input, fields)?;
    let id_ident = &id_field.ident;
    let id_ty = &id_field.ty;

    let version_methods = match find_flagged(fields, "row_version")? {
        Some(field) => {
            let version_ident = &field.ident;
            quote! {
                fn row_version(&self) -> ::core::option::Option<&::triton::RowVersion> {
                    ::core::option::Option::Some(&self.#version_ident)
                }

                fn set_row_version(&mut self, version: ::triton::RowVersion) {
                    self.#version_ident = version;
                }
            }
        }
        None => quote! {},
    };

    Ok(quote! {
        impl #impl_generics ::triton::Model for #name #ty_generics #where_clause {
            type Key = #id_ty;

            const COLLECTION: &'static str = #collection;

            fn id(&self) -> &Self::Key {
                &self.#id_ident
            }

            #version_methods
        }
    })
}

fn named_fields(input: &DeriveInput) -> syn::Result<&syn::punctuated::Punctuated<Field, syn::Token![,]>> {
    if let Data::Struct(data_struct) = &input.data {
        if let Fields::Named(fields) = &data_struct.fields {
            return Ok(&fields.named);
        }
    }
    Err(syn::Error::new_spanned(
        &input.ident,
        "Model derive: only structs with named fields are supported",
    ))
}

fn extract_collection(input: &DeriveInput) -> syn::Result<String> {
    for attr in &input.attrs {
        if !attr.path().is_ident("model") {
            continue;
        }

        let mut collection = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                collection = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `collection = \"...\"`"))
            }
        })?;

        if let Some(c) = collection {
            return Ok(c);
        }
    }

    // Default: snake_case struct name + "s"
    let name = input.ident.to_string();
    Ok(format!("{}s", to_snake_case(&name)))
}

/// Field carrying `#[model(<flag>)]`, if any.
fn find_flagged<'a>(
    fields: &'a syn::punctuated::Punctuated<Field, syn::Token![,]>,
    flag: &str,
) -> syn::Result<Option<&'a Field>> {
    for field in fields {
        for attr in &field.attrs {
            if !attr.path().is_ident("model") {
                continue;
            }
            let mut flagged = false;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident(flag) {
                    flagged = true;
                }
                Ok(())
            })?;
            if flagged {
                return Ok(Some(field));
            }
        }
    }
    Ok(None)
}

fn extract_id_field<'a>(
    input: &DeriveInput,
    fields: &'a syn::punctuated::Punctuated<Field, syn::Token![,]>,
) -> syn::Result<&'a Field> {
    if let Some(field) = find_flagged(fields, "id")? {
        return Ok(field);
    }

    // Default: look for a field named "id"
    fields
        .iter()
        .find(|field| field.ident.as_ref().is_some_and(|ident| ident == "id"))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                &input.ident,
                "Model derive: no field marked with #[model(id)] and no field named `id`",
            )
        })
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}
