//! Derive macros for the fhirkit element model.
//!
//! `#[derive(FhirElement)]` turns a plain struct into a model type: it emits a
//! static `TypeDescriptor`, index-based field accessors and `serde` impls that
//! delegate to the generic JSON engine in `fhirkit::json`.
//!
//! `#[derive(FhirChoice)]` turns an enum of single-field variants into a
//! polymorphic value (`value[x]`), or with `#[fhir(resource_union)]` into the
//! type-name-keyed resource dispatcher.
//!
//! Generated code refers to the model crate as `::fhirkit`, so the model crate
//! itself declares `extern crate self as fhirkit;`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod choice;
mod element;

#[proc_macro_derive(FhirElement, attributes(fhir))]
pub fn derive_fhir_element(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    element::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[proc_macro_derive(FhirChoice, attributes(fhir))]
pub fn derive_fhir_choice(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    choice::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
