mod model;

use proc_macro::TokenStream;

/// Derive macro for the `Model` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Model)]
/// #[model(collection = "accounts")]
/// struct Account {
///     #[model(id)]
///     pub number: u64,
///     pub balance: i64,
///     #[model(row_version)]
///     #[serde(default)]
///     pub version: RowVersion,
/// }
/// ```
///
/// - `#[model(collection = "...")]` sets the collection name.
///   If omitted, defaults to snake_case struct name + "s".
/// - `#[model(id)]` marks the key field; its type becomes `Model::Key`.
///   If omitted, defaults to a field named `id`.
/// - `#[model(row_version)]` marks a `RowVersion` field and makes the model
///   optimistically concurrent.
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    model::derive_model(input)
}
