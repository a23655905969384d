use proc_macro::TokenStream as TokenStream1;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::{parse_macro_input, Ident, ImplItemFn};

/// This macro is added before a method of `EpisodeDriver` struct in the impl block.
/// Use this macro to first check if current episode phase is exactly the phase in
/// the attribute.
///
/// For example, `#[allowed_phase(PlayerActing)]` will make a method first check
/// if current episode phase is `PlayerActing`. If not, the method returns
/// `Err(Error::WrongPhase { .. })` before touching any state.
///
/// The annotated method must return `Result<_, E>` where `E: From<crate::Error>`.
#[proc_macro_attribute]
pub fn allowed_phase(attr: TokenStream1, item: TokenStream1) -> TokenStream1 {
    let phase = parse_macro_input!(attr as Ident);
    let mut ast = parse_macro_input!(item as ImplItemFn);
    let method = ast.sig.ident.to_string();

    let early_return: syn::Stmt = syn::parse2(phase_check(&phase, &method))
        .expect("phase check must be a single statement");
    ast.block.stmts.insert(0, early_return);
    ast.into_token_stream().into()
}

fn phase_check(phase: &Ident, method: &str) -> TokenStream2 {
    quote! {
        if self.phase != EpisodePhase::#phase {
            return Err(crate::Error::WrongPhase {
                method: #method,
                expected: EpisodePhase::#phase,
                actual: self.phase,
            }
            .into());
        }
    }
}
