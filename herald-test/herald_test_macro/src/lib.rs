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

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, ItemFn};

/// Runs an `async fn` test on a fresh multi-threaded tokio runtime.
///
/// The body executes inside a `herald_test` tracing span. Panics raised on the
/// test thread or on one of the runtime's worker threads are recorded, logged
/// with `tracing::error!`, and re-raised with their source location once the
/// runtime has finished, so a panic inside a spawned task still fails the test.
/// Panics on threads that belong to other tests are ignored.
///
/// The test function must return a `Result` whose error type is `Debug`.
#[proc_macro_attribute]
pub fn herald_test(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    let vis = &input.vis;
    let sig = &input.sig;
    let body = &input.block;
    let attrs = &input.attrs;
    let name = &sig.ident;
    let inputs = &sig.inputs;
    let output = &sig.output;

    if sig.asyncness.is_none() {
        return syn::Error::new_spanned(sig.fn_token, "#[herald_test] requires an async fn")
            .to_compile_error()
            .into();
    }

    let async_name = syn::Ident::new(&format!("__{}_async", name), name.span());
    let worker_name = format!("herald-test-{}", name);

    let output = quote! {
        #[test]
        #(#attrs)*
        #vis fn #name() {
            use std::sync::atomic::{AtomicBool, Ordering};
            use std::sync::Arc;
            use std::panic;
            use tracing::error;

            #[derive(Default)]
            struct PanicInfo {
                occurred: AtomicBool,
                message: parking_lot::Mutex<Option<String>>,
                location: parking_lot::Mutex<Option<String>>,
            }

            let panic_info = Arc::new(PanicInfo::default());
            let panic_info_clone = Arc::clone(&panic_info);
            let test_thread = std::thread::current().id();

            let orig_hook = panic::take_hook();
            panic::set_hook(Box::new(move |info| {
                let current = std::thread::current();
                let ours = current.id() == test_thread || current.name() == Some(#worker_name);
                if ours {
                    panic_info_clone.occurred.store(true, Ordering::SeqCst);
                    let payload = info
                        .payload()
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| info.payload().downcast_ref::<String>().cloned());
                    *panic_info_clone.message.lock() = payload;
                    *panic_info_clone.location.lock() =
                        info.location().map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));

                    let cleaned_message = panic_info_clone
                        .message
                        .lock()
                        .clone()
                        .unwrap_or_else(|| "No error message".to_string())
                        .trim()
                        .replace('\n', " ");
                    error!("Panic: {}", cleaned_message);
                }
                orig_hook(info);
            }));

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .thread_name(#worker_name)
                .enable_all()
                .build()
                .expect("failed to build the herald_test runtime");

            let result = runtime.block_on(async {
                let test_span = tracing::info_span!("herald_test", name = stringify!(#name));
                let _enter = test_span.enter();

                #async_name().await
            });
            drop(runtime);

            if panic_info.occurred.load(Ordering::SeqCst) {
                let location = panic_info
                    .location
                    .lock()
                    .clone()
                    .unwrap_or_else(|| "unknown location".to_string());
                let cleaned_message = panic_info
                    .message
                    .lock()
                    .clone()
                    .unwrap_or_else(|| "No error message".to_string())
                    .trim()
                    .replace('\n', " ");
                panic!("Panic at {}: {}", location, cleaned_message);
            }

            result.unwrap()
        }

        async fn #async_name(#inputs) #output #body
    };

    output.into()
}
