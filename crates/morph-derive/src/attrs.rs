// #[morph(...)] attribute parsing

use syn::{Attribute, LitStr, Result};

/// Parsed `#[morph(...)]` options for a type, field or variant.
#[derive(Default)]
pub struct MorphAttrs {
    pub description: Option<LitStr>,
    pub display: Option<LitStr>,
    pub rename: Option<LitStr>,
}

impl MorphAttrs {
    /// Collect every `#[morph(...)]` attribute in `attrs`.
    pub fn parse(attrs: &[Attribute]) -> Result<Self> {
        let mut out = MorphAttrs::default();
        for attr in attrs {
            if !attr.path().is_ident("morph") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                let slot = if meta.path.is_ident("description") {
                    &mut out.description
                } else if meta.path.is_ident("display") {
                    &mut out.display
                } else if meta.path.is_ident("rename") {
                    &mut out.rename
                } else {
                    return Err(meta.error("expected `description`, `display` or `rename`"));
                };
                if slot.is_some() {
                    return Err(meta.error("duplicate morph attribute"));
                }
                *slot = Some(meta.value()?.parse()?);
                Ok(())
            })?;
        }
        Ok(out)
    }

    /// `.with_description(..)` / `.with_display(..)` builder calls.
    pub fn builder_calls(&self) -> proc_macro2::TokenStream {
        let description = self
            .description
            .as_ref()
            .map(|d| quote::quote!(.with_description(#d)));
        let display = self.display.as_ref().map(|d| quote::quote!(.with_display(#d)));
        quote::quote!(#description #display)
    }
}
