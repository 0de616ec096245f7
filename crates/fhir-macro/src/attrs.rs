use heck::ToLowerCamelCase;
use syn::{Attribute, Field, GenericArgument, LitStr, PathArguments, Type};

/// `#[fhir(...)]` options on a struct.
#[derive(Default)]
pub struct TypeAttrs {
    pub name: Option<String>,
    pub base: Option<String>,
    pub resource: bool,
    pub resource_union: bool,
}

impl TypeAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = TypeAttrs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("fhir")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let lit: LitStr = meta.value()?.parse()?;
                    out.name = Some(lit.value());
                } else if meta.path.is_ident("base") {
                    let lit: LitStr = meta.value()?.parse()?;
                    out.base = Some(lit.value());
                } else if meta.path.is_ident("resource") {
                    out.resource = true;
                } else if meta.path.is_ident("resource_union") {
                    out.resource_union = true;
                } else {
                    return Err(meta.error("unsupported fhir type attribute"));
                }
                Ok(())
            })?;
        }
        Ok(out)
    }
}

/// `#[fhir(...)]` options on a field.
#[derive(Default)]
pub struct FieldAttrs {
    pub rename: Option<String>,
    pub attribute: bool,
}

impl FieldAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = FieldAttrs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("fhir")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let lit: LitStr = meta.value()?.parse()?;
                    out.rename = Some(lit.value());
                } else if meta.path.is_ident("attribute") {
                    out.attribute = true;
                } else {
                    return Err(meta.error("unsupported fhir field attribute"));
                }
                Ok(())
            })?;
        }
        Ok(out)
    }
}

/// Wire name of a field: explicit rename, else lowerCamelCase of the Rust
/// name without a trailing underscore (`type_` is `type`).
pub fn wire_name(field: &Field, attrs: &FieldAttrs) -> String {
    if let Some(rename) = &attrs.rename {
        return rename.clone();
    }
    let ident = field
        .ident
        .as_ref()
        .map(|i| i.to_string())
        .unwrap_or_default();
    let ident = ident.strip_prefix("r#").unwrap_or(&ident);
    ident.trim_end_matches('_').to_lower_camel_case()
}

/// How a field type maps onto a cardinality.
pub enum Shape<'a> {
    Optional(&'a Type),
    Repeated(&'a Type),
    Required(&'a Type),
}

pub fn shape(ty: &Type) -> Shape<'_> {
    if let Some(inner) = single_generic_arg(ty, "Option") {
        Shape::Optional(inner)
    } else if let Some(inner) = single_generic_arg(ty, "Vec") {
        Shape::Repeated(inner)
    } else {
        Shape::Required(ty)
    }
}

fn single_generic_arg<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
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
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_wire_name_defaults() {
        let field: Field = parse_quote!(pub user_selected: Option<Boolean>);
        assert_eq!(wire_name(&field, &FieldAttrs::default()), "userSelected");

        let field: Field = parse_quote!(pub type_: CodeableConcept);
        assert_eq!(wire_name(&field, &FieldAttrs::default()), "type");

        let field: Field = parse_quote!(pub value: Option<ExtensionValue>);
        let attrs = FieldAttrs {
            rename: Some("amount".to_string()),
            attribute: false,
        };
        assert_eq!(wire_name(&field, &attrs), "amount");
    }

    #[test]
    fn test_shape_detection() {
        let ty: Type = parse_quote!(Option<Coding>);
        assert!(matches!(shape(&ty), Shape::Optional(_)));
        let ty: Type = parse_quote!(Vec<Coding>);
        assert!(matches!(shape(&ty), Shape::Repeated(_)));
        let ty: Type = parse_quote!(CodeableConcept);
        assert!(matches!(shape(&ty), Shape::Required(_)));
        let ty: Type = parse_quote!(std::option::Option<Box<Reference>>);
        assert!(matches!(shape(&ty), Shape::Optional(_)));
    }
}
