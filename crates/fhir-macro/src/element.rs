use proc_macro2::{Literal, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput, Fields};

use crate::attrs::{FieldAttrs, Shape, TypeAttrs, shape, wire_name};

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "FhirElement cannot be derived for generic types",
        ));
    }
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            ident,
            "FhirElement can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            ident,
            "FhirElement requires named fields",
        ));
    };

    let type_attrs = TypeAttrs::parse(&input.attrs)?;
    let type_name = type_attrs.name.unwrap_or_else(|| ident.to_string());
    let base = match (&type_attrs.base, type_attrs.resource) {
        (Some(base), _) => quote!(::core::option::Option::Some(#base)),
        (None, true) => quote!(::core::option::Option::Some("DomainResource")),
        (None, false) => quote!(::core::option::Option::Some("Element")),
    };
    let kind = if type_attrs.resource {
        quote!(::fhirkit::ValueKind::Resource)
    } else {
        quote!(::fhirkit::ValueKind::Complex)
    };

    let mut descriptors = Vec::new();
    let mut getters = Vec::new();
    let mut setters = Vec::new();

    for (index, field) in fields.named.iter().enumerate() {
        let attrs = FieldAttrs::parse(&field.attrs)?;
        let name = wire_name(field, &attrs);
        let member = &field.ident;
        let index = Literal::usize_unsuffixed(index);
        let field_shape = shape(&field.ty);

        let cardinality = match field_shape {
            Shape::Optional(_) => quote!(::fhirkit::Cardinality::Optional),
            Shape::Repeated(_) => quote!(::fhirkit::Cardinality::Repeated),
            Shape::Required(_) => quote!(::fhirkit::Cardinality::Required),
        };

        if attrs.attribute {
            let getter = match field_shape {
                Shape::Optional(_) => quote!(self.#member.as_deref()),
                Shape::Required(_) => {
                    quote!(::core::option::Option::Some(self.#member.as_str()).filter(|s| !s.is_empty()))
                }
                Shape::Repeated(_) => {
                    return Err(syn::Error::new_spanned(
                        field,
                        "attribute fields cannot be repeated",
                    ));
                }
            };
            descriptors.push(quote! {
                ::fhirkit::FieldDescriptor {
                    name: #name,
                    cardinality: #cardinality,
                    kind: ::fhirkit::ValueKind::System,
                    types: &["string"],
                }
            });
            getters.push(quote! {
                #index => ::fhirkit::FieldRef::Attribute(#getter),
            });
            setters.push(quote! {
                #index => ::core::option::Option::Some(::fhirkit::FieldMut::Attribute(&mut self.#member)),
            });
            continue;
        }

        let (inner, getter, setter) = match field_shape {
            Shape::Optional(inner) => (
                inner,
                quote!(::fhirkit::FieldRef::Single(
                    self.#member.as_ref().map(::fhirkit::FhirValue::as_value)
                )),
                quote!(::fhirkit::FieldMut::Optional(&mut self.#member)),
            ),
            Shape::Repeated(inner) => (
                inner,
                quote!(::fhirkit::FieldRef::Many(
                    self.#member.iter().map(::fhirkit::FhirValue::as_value).collect()
                )),
                quote!(::fhirkit::FieldMut::Repeated(&mut self.#member)),
            ),
            Shape::Required(inner) => (
                inner,
                quote!(::fhirkit::FieldRef::Single(::core::option::Option::Some(
                    ::fhirkit::FhirValue::as_value(&self.#member)
                ))),
                quote!(::fhirkit::FieldMut::Required(&mut self.#member)),
            ),
        };
        descriptors.push(quote! {
            ::fhirkit::FieldDescriptor {
                name: #name,
                cardinality: #cardinality,
                kind: <#inner as ::fhirkit::FhirValue>::KIND,
                types: <#inner as ::fhirkit::FhirValue>::TYPE_NAMES,
            }
        });
        getters.push(quote!(#index => #getter,));
        setters.push(quote!(#index => ::core::option::Option::Some(#setter),));
    }

    let field_count = Literal::usize_unsuffixed(descriptors.len());

    Ok(quote! {
        impl ::fhirkit::FhirType for #ident {
            const TYPE_NAME: &'static str = #type_name;
        }

        impl ::fhirkit::StaticDescriptor for #ident {
            fn static_descriptor() -> &'static ::fhirkit::TypeDescriptor {
                static FIELDS: [::fhirkit::FieldDescriptor; #field_count] = [#(#descriptors),*];
                static DESCRIPTOR: ::fhirkit::TypeDescriptor =
                    ::fhirkit::TypeDescriptor::new(#type_name, #base, #kind, &FIELDS);
                &DESCRIPTOR
            }
        }

        impl ::fhirkit::FhirValue for #ident {
            const KIND: ::fhirkit::ValueKind = #kind;
            const TYPE_NAMES: &'static [&'static str] = &[#type_name];

            fn instantiate(type_name: &str) -> ::core::option::Option<Self> {
                if type_name == #type_name {
                    ::core::option::Option::Some(<Self as ::core::default::Default>::default())
                } else {
                    ::core::option::Option::None
                }
            }

            fn as_value(&self) -> ::fhirkit::ValueRef<'_> {
                ::fhirkit::ValueRef::Element(self)
            }

            fn as_value_mut(&mut self) -> ::fhirkit::ValueMut<'_> {
                ::fhirkit::ValueMut::Element(self)
            }
        }

        impl ::fhirkit::Element for #ident {
            fn descriptor(&self) -> &'static ::fhirkit::TypeDescriptor {
                <Self as ::fhirkit::StaticDescriptor>::static_descriptor()
            }

            fn field(&self, index: usize) -> ::fhirkit::FieldRef<'_> {
                match index {
                    #(#getters)*
                    _ => ::fhirkit::FieldRef::Single(::core::option::Option::None),
                }
            }

            fn field_mut(&mut self, index: usize) -> ::core::option::Option<::fhirkit::FieldMut<'_>> {
                match index {
                    #(#setters)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl ::fhirkit::__private::serde::Serialize for #ident {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: ::fhirkit::__private::serde::Serializer,
            {
                ::fhirkit::json::serialize_element(self, serializer)
            }
        }

        impl<'de> ::fhirkit::__private::serde::Deserialize<'de> for #ident {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::fhirkit::__private::serde::Deserializer<'de>,
            {
                let mut value = <Self as ::core::default::Default>::default();
                ::fhirkit::json::deserialize_element(&mut value, deserializer)?;
                ::core::result::Result::Ok(value)
            }
        }
    })
}
