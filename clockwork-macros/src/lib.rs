//! Procedural macros for the clockwork interception runtime.
//!
//! - `#[derive(Marker)]`: Implements `clockwork::Marker` for a unit struct.
//! - `#[derive(Intercepted)]`: Exposes the component's `Dispatcher` field.
//! - `#[intercept(...)]`: Routes the methods of an impl block through the interceptors
//!   bound to the given markers, and emits the component's declaration table.
//!
//! Usage:
//! ```rust,ignore
//! use clockwork::{Dispatcher, Intercepted, LogTime, Marker, intercept};
//!
//! #[derive(Marker)]
//! struct Audited;
//!
//! #[derive(Intercepted)]
//! struct Accounts {
//!     dispatcher: Dispatcher,
//! }
//!
//! // Every method with a `self` receiver is timed; `close` is audited as well.
//! #[intercept(LogTime)]
//! impl Accounts {
//!     fn open(&self, owner: String) -> u64 { /* ... */ }
//!
//!     #[intercept(Audited)]
//!     async fn close(&self, id: u64) -> Result<(), AccountError> { /* ... */ }
//! }
//! ```
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::{
    Attribute, Data, DeriveInput, Fields, FnArg, ImplItem, ImplItemFn, Item, ItemImpl, Pat, Path,
    ReturnType, Token, Type, parse::Parser, parse_macro_input, punctuated::Punctuated,
};

type MarkerList = Punctuated<Path, Token![,]>;

/// Derives `clockwork::Marker`, using the type name as the marker name.
#[proc_macro_derive(Marker)]
pub fn derive_marker(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = &input.ident;
    let name = ident.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::clockwork::Marker for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;
        }
    };
    TokenStream::from(expanded)
}

/// Derives `clockwork::Intercepted` for a struct holding a `clockwork::Dispatcher`.
///
/// The dispatcher is the field marked `#[dispatcher]`, or else the field named
/// `dispatcher`.
#[proc_macro_derive(Intercepted, attributes(dispatcher))]
pub fn derive_intercepted(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match dispatcher_field(&input) {
        Ok(field) => {
            let ident = &input.ident;
            let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
            let expanded = quote! {
                impl #impl_generics ::clockwork::Intercepted for #ident #ty_generics #where_clause {
                    fn dispatcher(&self) -> &::clockwork::Dispatcher {
                        &self.#field
                    }
                }
            };
            TokenStream::from(expanded)
        }
        Err(e) => e.to_compile_error().into(),
    }
}

fn dispatcher_field(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "#[derive(Intercepted)] only works on structs",
        ));
    };

    let marked = data
        .fields
        .iter()
        .enumerate()
        .find(|(_, f)| f.attrs.iter().any(|a| a.path().is_ident("dispatcher")));

    if let Some((index, field)) = marked {
        return Ok(match &field.ident {
            Some(ident) => ident.to_token_stream(),
            None => syn::Index::from(index).to_token_stream(),
        });
    }

    if let Fields::Named(fields) = &data.fields {
        if let Some(ident) = fields
            .named
            .iter()
            .filter_map(|f| f.ident.as_ref())
            .find(|i| *i == "dispatcher")
        {
            return Ok(ident.to_token_stream());
        }
    }

    Err(syn::Error::new_spanned(
        &input.ident,
        "no dispatcher field: mark the `clockwork::Dispatcher` field with #[dispatcher]",
    ))
}

/// Routes calls through the interceptors bound to the given markers.
///
/// On an impl block, the markers apply to every method with a `self` receiver. Inside
/// such a block, `#[intercept(...)]` on a method adds markers for that method only;
/// they come after the impl-level ones. The first marker is the outermost interceptor.
///
/// Methods may return any type. When the interceptor chain fails, the method returns
/// `Err` if its return type is a `Result` whose error converts from `clockwork::Error`,
/// and panics with the error otherwise; see `clockwork::outcome`.
///
/// The impl block also gets a `clockwork::Declared` implementation listing the marked
/// operations, so use one `#[intercept]` impl block per type.
#[proc_macro_attribute]
pub fn intercept(attr: TokenStream, item: TokenStream) -> TokenStream {
    let markers = match MarkerList::parse_terminated.parse(attr) {
        Ok(markers) => markers,
        Err(e) => return e.to_compile_error().into(),
    };

    match parse_macro_input!(item as Item) {
        Item::Impl(item_impl) => expand_impl(markers, item_impl)
            .unwrap_or_else(|e| e.to_compile_error())
            .into(),
        other => syn::Error::new_spanned(
            other,
            "#[intercept] on a method only works inside an #[intercept] impl block",
        )
        .to_compile_error()
        .into(),
    }
}

fn expand_impl(impl_markers: MarkerList, mut item: ItemImpl) -> syn::Result<TokenStream2> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[intercept] works on inherent impl blocks only",
        ));
    }

    let component = component_name(&item.self_ty)?;
    let mut declarations = Vec::new();

    for impl_item in &mut item.items {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };

        let own_markers = take_markers(&mut method.attrs)?;
        if method.sig.receiver().is_none() {
            if let Some(marker) = own_markers.first() {
                return Err(syn::Error::new_spanned(
                    marker,
                    "intercepted operations need a `self` receiver",
                ));
            }
            continue;
        }

        let markers: Vec<Path> = impl_markers.iter().cloned().chain(own_markers).collect();
        if markers.is_empty() {
            continue;
        }
        check_unique(&markers)?;

        let declaration = declaration_of(&component, method, &markers);
        rewrite(method, &declaration);
        declarations.push(declaration);
    }

    let (impl_generics, _, where_clause) = item.generics.split_for_impl();
    let self_ty = &item.self_ty;

    Ok(quote! {
        #item

        impl #impl_generics ::clockwork::Declared for #self_ty #where_clause {
            const DECLARATIONS: &'static [::clockwork::Declaration] = &[#(#declarations),*];
        }
    })
}

fn component_name(ty: &Type) -> syn::Result<String> {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|s| s.ident.to_string())
            .ok_or_else(|| syn::Error::new_spanned(ty, "expected a type name")),
        _ => Err(syn::Error::new_spanned(
            ty,
            "#[intercept] needs a named self type",
        )),
    }
}

/// Removes the `#[intercept(...)]` attributes of a method and returns their markers.
fn take_markers(attrs: &mut Vec<Attribute>) -> syn::Result<Vec<Path>> {
    let mut markers = Vec::new();
    let mut kept = Vec::with_capacity(attrs.len());
    for attr in attrs.drain(..) {
        let is_intercept = attr
            .path()
            .segments
            .last()
            .is_some_and(|s| s.ident == "intercept");
        if !is_intercept {
            kept.push(attr);
            continue;
        }
        if let syn::Meta::List(_) = &attr.meta {
            markers.extend(attr.parse_args_with(MarkerList::parse_terminated)?);
        }
    }
    *attrs = kept;
    Ok(markers)
}

fn check_unique(markers: &[Path]) -> syn::Result<()> {
    let names: Vec<String> = markers
        .iter()
        .map(|m| m.to_token_stream().to_string())
        .collect();
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            return Err(syn::Error::new_spanned(
                &markers[i],
                format!("marker `{name}` is attached twice to the same operation"),
            ));
        }
    }
    Ok(())
}

fn declaration_of(component: &str, method: &ImplItemFn, markers: &[Path]) -> TokenStream2 {
    let operation = method.sig.ident.to_string();
    let flavor = if method.sig.asyncness.is_some() {
        format_ident!("Async")
    } else {
        format_ident!("Blocking")
    };

    let parameters = method.sig.inputs.iter().filter_map(|arg| match arg {
        FnArg::Receiver(_) => None,
        FnArg::Typed(pat_type) => {
            let name = match pat_type.pat.as_ref() {
                Pat::Ident(p) => p.ident.to_string(),
                _ => "_".to_string(),
            };
            let type_name = type_name(&pat_type.ty);
            Some(quote! { ::clockwork::Parameter::new(#name, #type_name) })
        }
    });

    quote! {
        ::clockwork::Declaration {
            target: ::clockwork::Target::new(#component, #operation),
            markers: &[#(::clockwork::MarkerKey::of::<#markers>()),*],
            parameters: &[#(#parameters),*],
            flavor: ::clockwork::Flavor::#flavor,
        }
    }
}

/// Type as written in the signature, without the token spacing.
fn type_name(ty: &Type) -> String {
    let raw = ty.to_token_stream().to_string();
    raw.replace(" < ", "<")
        .replace("< ", "<")
        .replace(" >", ">")
        .replace(" :: ", "::")
        .replace(":: ", "::")
        .replace(" ,", ",")
        .replace("& ", "&")
        .replace(" ;", ";")
}

/// Replaces the method body with a call through the component's dispatcher.
fn rewrite(method: &mut ImplItemFn, declaration: &TokenStream2) {
    let block = &method.block;
    let output = match &method.sig.output {
        ReturnType::Default => quote! { () },
        ReturnType::Type(_, ty) => ty.to_token_stream(),
    };

    let call = if method.sig.asyncness.is_some() {
        quote! {
            __clockwork_dispatcher
                .dispatch_async::<#output, _>(&__CLOCKWORK_DECLARATION, async move #block)
                .await
        }
    } else {
        quote! {
            __clockwork_dispatcher
                .dispatch::<#output, _>(&__CLOCKWORK_DECLARATION, move || -> #output #block)
        }
    };

    method.block = syn::parse_quote! {
        {
            static __CLOCKWORK_DECLARATION: ::clockwork::Declaration = #declaration;
            let __clockwork_dispatcher = {
                use ::clockwork::Intercepted as _;
                ::std::clone::Clone::clone(self.dispatcher())
            };
            match #call {
                ::core::result::Result::Ok(__clockwork_value) => __clockwork_value,
                ::core::result::Result::Err(__clockwork_error) => {
                    #[allow(unused_imports)]
                    use ::clockwork::outcome::{ReturnDefault as _, ReturnErr as _, Unwind as _};
                    #[allow(clippy::needless_borrow)]
                    let __clockwork_surface = &&&::clockwork::outcome::Surface::<#output>::new();
                    __clockwork_surface.surface(__clockwork_error)
                }
            }
        }
    };
}
