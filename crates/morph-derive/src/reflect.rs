// #[derive(Reflect)] implementation
//
// Structs map to `ShapeKind::Struct` and round-trip through `Record`;
// enums map to `ShapeKind::Enum` and round-trip through `EnumValue`.

use proc_macro2::{Literal, TokenStream};
use quote::quote;
use syn::{
    Data, DataEnum, DataStruct, DeriveInput, Error, Expr, ExprLit, ExprUnary, Fields, Lit, Result,
    UnOp,
};

use crate::attrs::MorphAttrs;

/// Expands #[derive(Reflect)].
pub fn expand_reflect(input: DeriveInput) -> Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "#[derive(Reflect)] does not support generic types",
        ));
    }

    let type_attrs = MorphAttrs::parse(&input.attrs)?;
    if let Some(rename) = &type_attrs.rename {
        return Err(Error::new_spanned(rename, "`rename` applies to fields and variants only"));
    }
    let type_description = type_attrs
        .description
        .as_ref()
        .map(|d| quote!(.with_description(#d)));

    match &input.data {
        Data::Struct(data) => expand_struct(&input, data, type_description),
        Data::Enum(data) => expand_enum(&input, data, type_description),
        Data::Union(_) => Err(Error::new_spanned(
            &input.ident,
            "#[derive(Reflect)] does not support unions",
        )),
    }
}

fn expand_struct(
    input: &DeriveInput,
    data: &DataStruct,
    type_description: Option<TokenStream>,
) -> Result<TokenStream> {
    let ident = &input.ident;
    let Fields::Named(fields) = &data.fields else {
        return Err(Error::new_spanned(
            ident,
            "#[derive(Reflect)] requires a struct with named fields",
        ));
    };

    let mut field_idents = Vec::new();
    let mut member_names = Vec::new();
    let mut field_infos = Vec::new();

    for field in &fields.named {
        let attrs = MorphAttrs::parse(&field.attrs)?;
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let name = match &attrs.rename {
            Some(rename) => rename.value(),
            None => field_ident.to_string(),
        };
        let ty = &field.ty;
        let builders = attrs.builder_calls();
        field_infos.push(quote! {
            ::morph_core::FieldInfo::new::<#ty>(#name)#builders
        });
        field_idents.push(field_ident.clone());
        member_names.push(name);
    }

    Ok(quote! {
        impl ::morph_core::Reflect for #ident {
            fn shape() -> ::morph_core::Shape {
                ::morph_core::Shape::new(::morph_core::ShapeKind::Struct(::std::vec![
                    #(#field_infos),*
                ]))#type_description
            }
        }

        impl ::morph_core::FromValue for #ident {
            #[allow(unused_mut)]
            fn from_value(value: ::morph_core::Value) -> ::morph_core::CoerceResult<Self> {
                let mut record = ::morph_core::Record::expect::<Self>(value)?;
                ::std::result::Result::Ok(#ident {
                    #(#field_idents: record.take(#member_names)?,)*
                })
            }
        }

        impl ::morph_core::IntoValue for #ident {
            #[allow(unused_mut)]
            fn into_value(self) -> ::morph_core::Value {
                let mut record = ::morph_core::Record::of::<Self>();
                #(
                    record.insert(#member_names, ::morph_core::IntoValue::into_value(self.#field_idents));
                )*
                ::morph_core::Value::Record(record)
            }
        }
    })
}

fn expand_enum(
    input: &DeriveInput,
    data: &DataEnum,
    type_description: Option<TokenStream>,
) -> Result<TokenStream> {
    let ident = &input.ident;

    let mut variant_idents = Vec::new();
    let mut member_names = Vec::new();
    let mut discriminants = Vec::new();
    let mut variant_infos = Vec::new();
    let mut next: i64 = 0;

    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(Error::new_spanned(
                variant,
                "#[derive(Reflect)] supports only fieldless enum variants",
            ));
        }
        let attrs = MorphAttrs::parse(&variant.attrs)?;
        let discriminant = match &variant.discriminant {
            Some((_, expr)) => parse_discriminant(expr)?,
            None => next,
        };
        next = discriminant.wrapping_add(1);

        let name = match &attrs.rename {
            Some(rename) => rename.value(),
            None => variant.ident.to_string(),
        };
        let disc_tokens = discriminant_tokens(discriminant);
        let builders = attrs.builder_calls();
        variant_infos.push(quote! {
            ::morph_core::VariantInfo::new(#name, #disc_tokens)#builders
        });
        variant_idents.push(variant.ident.clone());
        member_names.push(name);
        discriminants.push(disc_tokens);
    }

    Ok(quote! {
        impl ::morph_core::Reflect for #ident {
            fn shape() -> ::morph_core::Shape {
                ::morph_core::Shape::new(::morph_core::ShapeKind::Enum(::std::vec![
                    #(#variant_infos),*
                ]))#type_description
            }
        }

        impl ::morph_core::FromValue for #ident {
            fn from_value(value: ::morph_core::Value) -> ::morph_core::CoerceResult<Self> {
                let target = ::morph_core::TypeHandle::of::<Self>();
                if let ::morph_core::Value::Enum(e) = &value {
                    if e.ty == target {
                        #(
                            if e.discriminant == #discriminants {
                                return ::std::result::Result::Ok(#ident::#variant_idents);
                            }
                        )*
                    }
                }
                ::std::result::Result::Err(::morph_core::CoerceError::conversion(&value, &target))
            }
        }

        impl ::morph_core::IntoValue for #ident {
            fn into_value(self) -> ::morph_core::Value {
                let (discriminant, name): (i64, &'static str) = match self {
                    #(#ident::#variant_idents => (#discriminants, #member_names),)*
                };
                ::morph_core::Value::Enum(::morph_core::EnumValue::new(
                    ::morph_core::TypeHandle::of::<Self>(),
                    discriminant,
                    name,
                ))
            }
        }
    })
}

/// Integer literal discriminant, optionally negated.
fn parse_discriminant(expr: &Expr) -> Result<i64> {
    match expr {
        Expr::Lit(ExprLit { lit: Lit::Int(lit), .. }) => lit.base10_parse::<i64>(),
        Expr::Unary(ExprUnary { op: UnOp::Neg(_), expr, .. }) => match &**expr {
            Expr::Lit(ExprLit { lit: Lit::Int(lit), .. }) => {
                let magnitude = lit.base10_parse::<u64>()?;
                if magnitude > i64::MAX as u64 + 1 {
                    return Err(Error::new_spanned(lit, "discriminant out of range for i64"));
                }
                Ok((magnitude as i64).wrapping_neg())
            }
            other => Err(Error::new_spanned(other, "expected an integer literal")),
        },
        other => Err(Error::new_spanned(
            other,
            "#[derive(Reflect)] requires integer literal discriminants",
        )),
    }
}

fn discriminant_tokens(value: i64) -> TokenStream {
    if value < 0 {
        let magnitude = Literal::u64_suffixed(value.unsigned_abs());
        quote!((#magnitude as i64).wrapping_neg())
    } else {
        let literal = Literal::i64_suffixed(value);
        quote!(#literal)
    }
}
