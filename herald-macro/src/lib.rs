/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![forbid(unsafe_code)]

//! Herald Macro Library
//!
//! Procedural macros for Herald's by-name dispatch.
//!
//! # Dispatch targets
//!
//! [`dispatch_target`] turns an inherent `impl` block into a dispatch target
//! whose methods can be called by name through `MethodBinder` and
//! `MethodBinderWithArgument`:
//!
//! ```ignore
//! use herald::prelude::*;
//!
//! struct Greeter;
//!
//! #[dispatch_target]
//! impl Greeter {
//!     fn greet(&self) -> String {
//!         "hello".to_string()
//!     }
//!
//!     #[dispatch(name = "greet")]
//!     fn greet_name(&self, name: &String) -> String {
//!         format!("hello {}", name)
//!     }
//!
//!     #[dispatch(skip)]
//!     fn internal(&self) {}
//! }
//! ```

use proc_macro::TokenStream;

use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::spanned::Spanned;
use syn::{parse_macro_input, Attribute, FnArg, ImplItem, ImplItemFn, ItemImpl, LitStr, ReturnType, Type};

#[derive(Default)]
struct DispatchOptions {
    name: Option<String>,
    skip: bool,
}

/// Removes the `#[dispatch(..)]` helper attributes from `attrs` and returns
/// what they asked for.
fn take_dispatch_options(attrs: &mut Vec<Attribute>) -> syn::Result<DispatchOptions> {
    let mut options = DispatchOptions::default();
    let mut error = None;
    attrs.retain(|attr| {
        if !attr.path().is_ident("dispatch") {
            return true;
        }
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
                Ok(())
            } else if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(syn::Error::new(value.span(), "dispatch name must not be empty"));
                }
                options.name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `name = \"..\"` or `skip`"))
            }
        });
        if let Err(err) = parsed {
            error.get_or_insert(err);
        }
        false
    });
    match error {
        Some(err) => Err(err),
        None => Ok(options),
    }
}

fn is_unit(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(tuple) if tuple.elems.is_empty())
}

/// `&dyn Any`, spelled with or without a path.
fn is_dyn_any(ty: &Type) -> bool {
    let Type::TraitObject(object) = ty else {
        return false;
    };
    object.bounds.len() == 1
        && object.bounds.iter().all(|bound| match bound {
            syn::TypeParamBound::Trait(bound) => bound
                .path
                .segments
                .last()
                .is_some_and(|segment| segment.ident == "Any"),
            _ => false,
        })
}

/// Builder call registering `method`, or `None` when the method cannot be
/// called by name (no `&self` receiver, generic, async, more than one
/// argument).
fn table_entry(method: &ImplItemFn, name: &str) -> syn::Result<Option<TokenStream2>> {
    let sig = &method.sig;
    let mut inputs = sig.inputs.iter();
    let Some(FnArg::Receiver(receiver)) = inputs.next() else {
        return Ok(None);
    };
    if receiver.reference.is_none() || receiver.mutability.is_some() || receiver.colon_token.is_some() {
        return Ok(None);
    }
    if !sig.generics.params.is_empty() || sig.asyncness.is_some() {
        return Ok(None);
    }
    let parameters: Vec<&syn::PatType> = inputs
        .filter_map(|input| match input {
            FnArg::Typed(typed) => Some(typed),
            FnArg::Receiver(_) => None,
        })
        .collect();
    if parameters.len() > 1 {
        return Ok(None);
    }

    let returns_value = match &sig.output {
        ReturnType::Default => false,
        ReturnType::Type(_, ty) if is_unit(ty) => false,
        ReturnType::Type(_, ty) if matches!(**ty, Type::Reference(_)) => {
            return Err(syn::Error::new(
                ty.span(),
                "methods returning references cannot be dispatched by name; add #[dispatch(skip)]",
            ));
        }
        ReturnType::Type(..) => true,
    };

    let ident = &sig.ident;
    let entry = match parameters.first() {
        None if returns_value => quote! {
            .function(#name, |target: &Self| target.#ident())
        },
        None => quote! {
            .action(#name, |target: &Self| { target.#ident(); })
        },
        Some(parameter) => {
            let (argument_ty, call) = match &*parameter.ty {
                Type::Reference(reference) if reference.mutability.is_some() => {
                    return Err(syn::Error::new(
                        reference.span(),
                        "`&mut` parameters cannot be dispatched by name",
                    ));
                }
                Type::Reference(reference) if is_dyn_any(&reference.elem) => {
                    let call = if returns_value {
                        quote! {
                            .function_with_any(#name, |target: &Self, argument: &dyn ::std::any::Any| {
                                target.#ident(argument)
                            })
                        }
                    } else {
                        quote! {
                            .action_with_any(#name, |target: &Self, argument: &dyn ::std::any::Any| {
                                target.#ident(argument);
                            })
                        }
                    };
                    return Ok(Some(call));
                }
                Type::Reference(reference) => (reference.elem.to_token_stream(), quote! { argument }),
                owned => (
                    owned.to_token_stream(),
                    quote! { ::std::clone::Clone::clone(argument) },
                ),
            };
            if returns_value {
                quote! {
                    .function_with_argument(#name, |target: &Self, argument: &#argument_ty| {
                        target.#ident(#call)
                    })
                }
            } else {
                quote! {
                    .action_with_argument(#name, |target: &Self, argument: &#argument_ty| {
                        target.#ident(#call);
                    })
                }
            }
        }
    };
    Ok(Some(entry))
}

/// Implements `DispatchTarget` for the type of an inherent `impl` block.
///
/// Every `&self` method taking zero or one argument becomes callable by
/// name. Arguments taken by value are cloned out of the borrowed argument,
/// so their types must be `Clone`; `&T` arguments are passed through, and a
/// `&dyn Any` argument accepts values of every type. Return values must be
/// owned, `Send`, `Sync` and `'static`.
///
/// * `#[dispatch(name = "..")]` registers the method under another name. Two
///   methods with the same name and different parameters act as overloads.
/// * `#[dispatch(skip)]` leaves the method out.
///
/// The method table is built on first use and shared for the lifetime of the
/// process.
#[proc_macro_attribute]
pub fn dispatch_target(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            TokenStream2::from(attr).span(),
            "#[dispatch_target] takes no arguments",
        )
        .to_compile_error()
        .into();
    }

    let mut input = parse_macro_input!(item as ItemImpl);
    if let Some((_, path, _)) = &input.trait_ {
        return syn::Error::new_spanned(path, "#[dispatch_target] must be placed on an inherent impl block")
            .to_compile_error()
            .into();
    }
    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "#[dispatch_target] does not support generic types")
            .to_compile_error()
            .into();
    }

    let mut entries = Vec::new();
    let mut errors = Vec::new();
    for item in &mut input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        let options = match take_dispatch_options(&mut method.attrs) {
            Ok(options) => options,
            Err(err) => {
                errors.push(err.to_compile_error());
                continue;
            }
        };
        if options.skip {
            continue;
        }
        let name = options.name.unwrap_or_else(|| method.sig.ident.to_string());
        match table_entry(method, &name) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {}
            Err(err) => errors.push(err.to_compile_error()),
        }
    }

    let self_ty = &input.self_ty;
    let output = quote! {
        #input

        #(#errors)*

        impl ::herald::prelude::DispatchTarget for #self_ty {
            fn method_table(&self) -> &'static ::herald::prelude::MethodTable {
                static TABLE: ::std::sync::OnceLock<::herald::prelude::MethodTable> =
                    ::std::sync::OnceLock::new();
                TABLE.get_or_init(|| {
                    ::herald::prelude::MethodTable::builder::<Self>()
                        #(#entries)*
                        .build()
                })
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };

    output.into()
}
