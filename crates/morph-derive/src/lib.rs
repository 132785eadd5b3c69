// morph-derive: #[derive(Reflect)] for morph-core
//
// Generates, for named structs and fieldless enums:
// - `Reflect` (shape with members, discriminants and annotations)
// - `FromValue` (record / enum value -> Rust value)
// - `IntoValue` (Rust value -> record / enum value)
//
// Example:
// ```
// #[derive(Reflect)]
// #[morph(description = "A customer order")]
// struct Order {
//     id: u32,
//     #[morph(display = "Customer name")]
//     customer: String,
// }
// ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod attrs;
mod reflect;

/// Derives `Reflect`, `FromValue` and `IntoValue`.
///
/// Supported on structs with named fields and on enums whose variants carry
/// no data. Generic types are not supported.
///
/// # Attributes
///
/// `#[morph(...)]` on the type, a field or a variant:
///
/// - `description = "..."`: human-readable description
/// - `display = "..."`: display name (used for CSV headers and captions)
/// - `rename = "..."`: member name used in records (fields and variants only)
///
/// # Example
///
/// ```ignore
/// #[derive(Reflect)]
/// enum Status {
///     #[morph(display = "Not started")]
///     Pending = 0,
///     Active = 1,
///     Closed = 9,
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(morph))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    reflect::expand_reflect(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
