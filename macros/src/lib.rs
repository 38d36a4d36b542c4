mod patch;
mod route;

use proc_macro::TokenStream;

/// Creates a new documentation function for the route, named after the original function with the suffix `_docs`.
///
/// The first line of the doc comment becomes the summary, the remaining lines the description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Creates a `XPatch` struct next to a `CreateXInput` struct, where every field is optional.
///
/// Fields marked `#[patch(skip)]` only exist on the input, fields marked `#[patch(only)]`
/// only exist on the patch. All other attributes are forwarded verbatim.
#[proc_macro_attribute]
pub fn patch(_args: TokenStream, input: TokenStream) -> TokenStream {
	patch::from_input(input)
}
