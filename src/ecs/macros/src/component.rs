use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

pub fn derive_component(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let struct_name = &ast.ident;

    // Use ::rusty_engine::ecs::component::Component which works both inside and outside the crate.
    // Inside the crate, this works because of `extern crate self as rusty_engine;` in lib.rs
    // Outside the crate, this naturally resolves to the rusty_engine dependency.
    TokenStream::from(quote! {
        impl ::rusty_engine::ecs::component::Component for #struct_name {
        }
    })
}
