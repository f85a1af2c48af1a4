extern crate proc_macro;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput};

/// Derives `Display` and `std::error::Error` for a type implementing
/// `UserError`. The rendered form is `Error {code}: {message}`, where the
/// message is the user message followed by the technical message when a
/// user message exists, or the technical message alone otherwise.
#[proc_macro_derive(UserErrorDisplay)]
pub fn user_error_display_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    expand(&ast)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(ast: &DeriveInput) -> syn::Result<TokenStream2> {
    if let Data::Union(_) = &ast.data {
        return Err(syn::Error::new_spanned(
            &ast.ident,
            "UserErrorDisplay can only be derived for enums and structs",
        ));
    }
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.user_message() {
                    Some(user_message) => write!(
                        f,
                        "Error {}: {}\n\tCaused by:\n\t{}",
                        self.code(),
                        user_message,
                        self.technical_message()
                    ),
                    None => write!(f, "Error {}: {}", self.code(), self.technical_message()),
                }
            }
        }

        impl #impl_generics std::error::Error for #name #ty_generics #where_clause {}
    })
}
