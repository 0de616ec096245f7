use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, GenericArgument, PathArguments, Type};

use crate::attrs::TypeAttrs;

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "FhirChoice cannot be derived for generic types",
        ));
    }
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            ident,
            "FhirChoice can only be derived for enums",
        ));
    };
    let type_attrs = TypeAttrs::parse(&input.attrs)?;

    let mut variants = Vec::new();
    for variant in &data.variants {
        let Fields::Unnamed(fields) = &variant.fields else {
            return Err(syn::Error::new_spanned(
                variant,
                "FhirChoice variants must hold exactly one value",
            ));
        };
        if fields.unnamed.len() != 1 {
            return Err(syn::Error::new_spanned(
                variant,
                "FhirChoice variants must hold exactly one value",
            ));
        }
        variants.push((&variant.ident, &fields.unnamed[0].ty));
    }
    if variants.is_empty() {
        return Err(syn::Error::new_spanned(
            ident,
            "FhirChoice needs at least one variant",
        ));
    }

    let instantiate = variants.iter().map(|(variant, ty)| {
        quote! {
            if type_name == <#ty as ::fhirkit::FhirType>::TYPE_NAME {
                return <#ty as ::fhirkit::FhirValue>::instantiate(type_name).map(Self::#variant);
            }
        }
    });
    let as_value = variants.iter().map(|(variant, _)| {
        quote!(Self::#variant(value) => ::fhirkit::FhirValue::as_value(value),)
    });
    let as_value_mut = variants.iter().map(|(variant, _)| {
        quote!(Self::#variant(value) => ::fhirkit::FhirValue::as_value_mut(value),)
    });

    let (kind, type_names) = if type_attrs.resource_union {
        (
            quote!(::fhirkit::ValueKind::Resource),
            quote!(&["Resource"]),
        )
    } else {
        let names = variants
            .iter()
            .map(|(_, ty)| quote!(<#ty as ::fhirkit::FhirType>::TYPE_NAME));
        (quote!(::fhirkit::ValueKind::Choice), quote!(&[#(#names),*]))
    };

    let value_impl = quote! {
        impl ::fhirkit::FhirValue for #ident {
            const KIND: ::fhirkit::ValueKind = #kind;
            const TYPE_NAMES: &'static [&'static str] = #type_names;

            fn instantiate(type_name: &str) -> ::core::option::Option<Self> {
                #(#instantiate)*
                ::core::option::Option::None
            }

            fn as_value(&self) -> ::fhirkit::ValueRef<'_> {
                match self {
                    #(#as_value)*
                }
            }

            fn as_value_mut(&mut self) -> ::fhirkit::ValueMut<'_> {
                match self {
                    #(#as_value_mut)*
                }
            }
        }
    };

    if !type_attrs.resource_union {
        return Ok(value_impl);
    }

    let from_impls = variants.iter().map(|(variant, ty)| {
        let unboxed = boxed_type(ty).map(|inner| {
            quote! {
                impl ::core::convert::From<#inner> for #ident {
                    fn from(value: #inner) -> Self {
                        Self::#variant(::std::boxed::Box::new(value))
                    }
                }
            }
        });
        quote! {
            impl ::core::convert::From<#ty> for #ident {
                fn from(value: #ty) -> Self {
                    Self::#variant(value)
                }
            }

            #unboxed
        }
    });
    let resource_types = variants.iter().map(|(variant, ty)| {
        quote!(Self::#variant(_) => <#ty as ::fhirkit::FhirType>::TYPE_NAME,)
    });

    Ok(quote! {
        #value_impl

        impl ::fhirkit::FhirType for #ident {
            const TYPE_NAME: &'static str = "Resource";
        }

        impl #ident {
            /// The `resourceType` of the held resource.
            pub fn resource_type(&self) -> &'static str {
                match self {
                    #(#resource_types)*
                }
            }
        }

        #(#from_impls)*

        impl ::fhirkit::__private::serde::Serialize for #ident {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: ::fhirkit::__private::serde::Serializer,
            {
                ::fhirkit::json::serialize_value(::fhirkit::FhirValue::as_value(self), serializer)
            }
        }

        impl<'de> ::fhirkit::__private::serde::Deserialize<'de> for #ident {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::fhirkit::__private::serde::Deserializer<'de>,
            {
                ::fhirkit::json::deserialize_resource(deserializer)
            }
        }
    })
}

/// `T` for a variant written as `Box<T>`.
fn boxed_type(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Box" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}
