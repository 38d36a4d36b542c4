use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{punctuated::Punctuated, Field, Fields, ItemStruct};

/// Which of the two generated structs a field belongs to.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Presence {
	Both,
	InputOnly,
	PatchOnly,
}

pub fn from_input(input: TokenStream) -> TokenStream {
	let mut input = syn::parse_macro_input!(input as ItemStruct);

	match expand(&mut input) {
		Ok(tokens) => tokens.into(),
		Err(e) => e.into_compile_error().into(),
	}
}

fn expand(input: &mut ItemStruct) -> syn::Result<proc_macro2::TokenStream> {
	let patch_ident = patch_ident(&input.ident);
	let doc = format!(
		"Partial update derived from [`{}`], absent fields are left unchanged.",
		input.ident
	);

	let Fields::Named(fields) = &mut input.fields else {
		return Err(syn::Error::new_spanned(
			&input.ident,
			"#[patch] only supports structs with named fields",
		));
	};

	let mut input_fields = Punctuated::new();
	let mut patch_fields = Vec::new();

	for mut field in std::mem::take(&mut fields.named) {
		let presence = presence(&field)?;
		field.attrs.retain(|attr| !attr.path().is_ident("patch"));

		if presence != Presence::InputOnly {
			let mut patched = field.clone();

			if !is_option(&patched.ty) {
				let ty = &patched.ty;
				patched.ty = syn::parse_quote!(Option<#ty>);
			}

			patch_fields.push(patched);
		}

		if presence != Presence::PatchOnly {
			input_fields.push(field);
		}
	}

	fields.named = input_fields;

	let attrs = input.attrs.iter().filter(|attr| !attr.path().is_ident("doc"));
	let vis = &input.vis;
	let generics = &input.generics;

	Ok(quote! {
		#input

		#[doc = #doc]
		#(#attrs)*
		#vis struct #patch_ident #generics {
			#(#patch_fields,)*
		}
	})
}

fn presence(field: &Field) -> syn::Result<Presence> {
	let mut presence = Presence::Both;

	for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("patch")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("skip") {
				presence = Presence::InputOnly;
				Ok(())
			} else if meta.path.is_ident("only") {
				presence = Presence::PatchOnly;
				Ok(())
			} else {
				Err(meta.error("expected `skip` or `only`"))
			}
		})?;
	}

	Ok(presence)
}

fn is_option(ty: &syn::Type) -> bool {
	let syn::Type::Path(path) = ty else {
		return false;
	};

	path.qself.is_none()
		&& path
			.path
			.segments
			.last()
			.is_some_and(|segment| segment.ident == "Option")
}

/// `CreatePostInput` becomes `PostPatch`.
fn patch_ident(ident: &syn::Ident) -> syn::Ident {
	let name = ident.to_string();
	let name = name.strip_prefix("Create").unwrap_or(&name);
	let name = name.strip_suffix("Input").unwrap_or(name);

	format_ident!("{}Patch", name)
}
