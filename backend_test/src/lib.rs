use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one running against a
/// fresh server instance with its own empty session registry.
///
/// The only injectable dependency is [`rocket::local::asynchronous::Client`].
/// Pass `reject_recreate` to configure the server to refuse re-creating a
/// session for an existing proposal.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract arguments to inject and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Choose the server configuration.
    let config = match parse_macro_input!(args as Option<Ident>) {
        None => quote! { crate::config::Config::default() },
        Some(arg) if arg == "reject_recreate" => quote! {
            crate::config::Config::new(false, crate::config::Config::default().max_id_length())
        },
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected no argument or `reject_recreate`")
                .into_compile_error()
                .into();
        }
    };

    quote! {
        #[test]
        fn #name() {
            log4rs_test_utils::test_logging::init_logging_once_for(
                ["nullivote_backend"],
                None,
                None,
            );

            /// Test setup.
            async fn setup() -> rocket::local::asynchronous::Client {
                rocket::local::asynchronous::Client::tracked(crate::build_with_config(#config))
                    .await
                    .unwrap()
            }

            /// The test itself.
            #item_fn

            // Several worker threads so that concurrent requests really race.
            let runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(4)
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                let rocket_client = setup().await;
                #new_name(#(#test_args),*).await;
            });
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut args = vec![];
    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let (Pat::Ident(_), Type::Path(type_path)) = (&*pat_type.pat, &*pat_type.ty) {
                let is_client = type_path
                    .path
                    .segments
                    .last()
                    .map_or(false, |segment| segment.ident == "Client");
                if is_client {
                    if !args.is_empty() {
                        return Err(syn::Error::new(
                            input.span(),
                            "Test cannot accept more than one `rocket::local::asynchronous::Client`",
                        ));
                    }
                    args.push(quote! { rocket_client });
                    continue;
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected `client_ident: Client`",
        ));
    }

    Ok(args)
}
