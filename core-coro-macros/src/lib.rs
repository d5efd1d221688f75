use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, ItemFn, ReturnType};

/// Runs an `async fn` test to completion through `core_coro::Task::wait`.
///
/// A test returning `anyhow::Result<T>` reports failures through its return
/// value; a test returning `()` panics with the captured failure.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, MacroKind::Test)
}

/// Runs an `async fn main` to completion through `core_coro::Task::wait`.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, MacroKind::Main)
}

enum MacroKind {
    Test,
    Main,
}

fn expand(attr: TokenStream, item: TokenStream, kind: MacroKind) -> TokenStream {
    if !attr.is_empty() {
        let tokens = TokenStream2::from(attr);
        return syn::Error::new_spanned(tokens, "core_coro attribute macros take no arguments")
            .to_compile_error()
            .into();
    }

    let input = parse_macro_input!(item as ItemFn);

    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(
            input.sig.fn_token,
            "core_coro attribute macros require `async fn`",
        )
        .to_compile_error()
        .into();
    }

    if !input.sig.inputs.is_empty() {
        return syn::Error::new_spanned(
            &input.sig.inputs,
            "core_coro attribute macros require a function without arguments",
        )
        .to_compile_error()
        .into();
    }

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;

    // The annotated body becomes a nested `async fn` so its return type is
    // spelled out for the task it is wrapped in.
    let body_ident = format_ident!("__core_coro_body");
    let mut body_sig = sig.clone();
    body_sig.ident = body_ident.clone();

    let mut outer_sig = sig;
    outer_sig.asyncness = None;

    let drive = match &outer_sig.output {
        ReturnType::Default => quote! {
            let task = ::core_coro::Task::new(async move {
                #body_ident().await;
                ::core_coro::__private::anyhow::Ok(())
            });
            if let ::core::result::Result::Err(error) = task.wait() {
                ::core::panic!("{}", error);
            }
        },
        ReturnType::Type(..) => quote! {
            ::core_coro::Task::new(#body_ident())
                .wait()
                .map_err(::core::convert::Into::into)
        },
    };

    let marker = match kind {
        MacroKind::Test => quote!(#[test]),
        MacroKind::Main => quote!(),
    };

    quote! {
        #(#attrs)*
        #marker
        #vis #outer_sig {
            #body_sig #block
            #drive
        }
    }
    .into()
}
