// prologue - swi-prolog bindings for rust
// Copyright (C) 2025  Andrew Chi

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.

mod fn_args;
mod macro_args;

use {
    crate::{
        fn_args::FnArgs,
        macro_args::{Args, Config},
    },
    proc_macro::TokenStream,
    proc_macro2::{Literal, Span, TokenStream as TokenStream2},
    quote::{ToTokens, quote},
    syn::{
        Attribute, FnArg, GenericParam, Generics, Ident, ItemFn, Meta, MetaList, MetaNameValue,
        PatType, Path, Signature, spanned::Spanned,
    },
};

fn attr_path(
    Attribute {
        meta:
            Meta::Path(path)
            | Meta::List(MetaList { path, .. })
            | Meta::NameValue(MetaNameValue { path, .. }),
        ..
    }: &Attribute,
) -> &Path {
    path
}

/// Expose a function as a prolog predicate.
///
/// Each argument of the function is one argument of the predicate and receives a
/// `&Decoded<'_>` or `&mut Decoded<'_>`. A final argument marked `#[control]` receives the
/// `Control` of the call and makes the predicate nondeterministic. Such a function is called once
/// more with `Control::Pruned` when its choice point is cut. The return type can be anything
/// implementing `IntoOutcome`.
///
/// This generates a unit struct implementing `ForeignPredicate`, registered with
/// `ForeignPredicate::register`.
///
/// # Arguments
///
/// - `name = "..."`: name of the predicate. Defaults to the function name.
/// - `module = "..."`: module to define the predicate in. Defaults to `user`.
/// - `struct_ident = Ident`: name of the generated struct. Defaults to the function name in
///   pascal case.
/// - `doc = "..." | false`: documentation of the generated struct. Defaults to the documentation
///   of the function.
/// - `prologue_root = path`: path of the `prologue` crate.
///
/// # Examples
///
/// ```ignore
/// #[foreign_predicate(name = "add")]
/// fn add(left: &Decoded<'_>, right: &Decoded<'_>, sum: &mut Decoded<'_>) -> Result<bool, Error> {
///     sum.as_variable_mut()?.unify(&(left.as_i64()? + right.as_i64()?))
/// }
///
/// Add::register()?;
/// ```
#[proc_macro_attribute]
pub fn foreign_predicate(args: TokenStream, input: TokenStream) -> TokenStream {
    syn::parse::<Args>(args)
        .and_then(|args| syn::parse::<ItemFn>(input).map(|item| (args, item)))
        .and_then(|(args, item)| {
            let Signature {
                asyncness,
                unsafety,
                generics: Generics { params, .. },
                ..
            } = &item.sig;

            (asyncness.is_none()
                && unsafety.is_none()
                && params
                    .iter()
                    .all(|param| matches!(param, GenericParam::Lifetime(_))))
            .then_some(())
            .ok_or_else(|| {
                syn::Error::new(
                    item.sig.span(),
                    "function signature cannot be async, unsafe, or generic",
                )
            })
            .and_then(|_| FnArgs::try_from(&item))
            .map(|fn_args| (Config::new(args, &item), fn_args, item))
        })
        .map(
            |(
                Config {
                    name,
                    module,
                    struct_ident,
                    doc,
                    prologue_root: root,
                },
                FnArgs { arity, control },
                mut item,
            )| {
                let ident = item.sig.ident.clone();
                let vis = item.vis.clone();
                let doc = doc.into_iter();
                let arity_lit = Literal::usize_unsuffixed(arity);

                let args = Ident::new("args", Span::mixed_site());
                let control_ident = Ident::new("control", Span::mixed_site());
                let arg_idents = (0..arity)
                    .map(|i| Ident::new(&format!("arg_{i}"), Span::mixed_site()))
                    .collect::<Vec<_>>();
                let control_arg = control.then(|| control_ident.clone()).into_iter();
                let ignore_control = (!control)
                    .then(|| quote! { let _ = #control_ident; })
                    .into_iter();

                let foreign_predicate = quote! {
                    #(#[doc = #doc])*
                    #vis struct #struct_ident;
                    #[automatically_derived]
                    impl #root::ForeignPredicate for #struct_ident {
                        const MODULE: &'static ::core::primitive::str = #module;
                        const NAME: &'static ::core::primitive::str = #name;
                        const ARITY: ::core::primitive::usize = #arity_lit;
                        const NONDETERMINISTIC: ::core::primitive::bool = #control;

                        fn call(
                            #args: &mut [#root::Decoded<'_>],
                            #control_ident: #root::Control,
                        ) -> ::core::result::Result<#root::Outcome, #root::Error> {
                            #(#ignore_control)*
                            let [#(#arg_idents),*] = #args else {
                                return ::core::result::Result::Err(#root::Error::InvalidArgument(
                                    ::core::concat!(#name, "/", #arity_lit, " called with the wrong number of arguments"),
                                ));
                            };

                            #root::foreign::IntoOutcome::into_outcome(#ident(#(#arg_idents,)* #(#control_arg)*))
                        }
                    }
                };

                item.sig
                    .inputs
                    .iter_mut()
                    .filter_map(|arg| match arg {
                        FnArg::Typed(PatType { attrs, .. }) => Some(attrs),
                        FnArg::Receiver(_) => None,
                    })
                    .for_each(|attrs| attrs.retain(|attr| !attr_path(attr).is_ident("control")));

                [item.into_token_stream(), foreign_predicate]
                    .into_iter()
                    .collect::<TokenStream2>()
            },
        )
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
