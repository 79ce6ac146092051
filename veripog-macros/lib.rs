//! Derive macros for veripog

extern crate proc_macro;

use quote::quote;

/// Default implementation of `HeapSpace` in `veripog_common::memory`.
/// Use by adding `#[derive(HeapSpace)]` to your struct.
#[proc_macro_derive(HeapSpace)]
pub fn heap_space(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let ast: syn::DeriveInput = syn::parse(input).expect("failed to parse derive input");
    let name = ast.ident;
    let (impl_generics, type_generics, where_clause) = ast.generics.split_for_impl();
    let fields = match ast.data {
        syn::Data::Struct(data) => data.fields,
        _ => panic!("HeapSpace can only be derived for structs"),
    };
    let mut sum = quote!(0);
    for (position, field) in fields.iter().enumerate() {
        let member = match &field.ident {
            Some(name) => syn::Member::Named(name.clone()),
            None => syn::Member::Unnamed(syn::Index::from(position)),
        };
        sum = quote!(#sum + self.#member.heap_space());
    }
    let implementation = quote!(
        impl #impl_generics HeapSpace for #name #type_generics #where_clause {
            fn heap_space(&self) -> usize {
                #sum
            }
        }
    );
    implementation.into()
}
