// Copyright 2022 Oxide Computer Company

//! `use_tables!` expands to the Rust simulation backend of every table in a
//! resolved program.
//!
//! ```ignore
//! p4_macro::use_tables!("programs/port.json");
//!
//! p4_macro::use_tables! {
//!     program: "programs/port.json",
//!     alignment: 8,
//! }
//! ```
//!
//! Paths are relative to the manifest directory of the invoking crate.

use std::fs;
use std::path::PathBuf;

use p4::ast::AST;
use p4_cg::Settings;
use proc_macro::TokenStream;
use proc_macro2::Span;
use serde::Deserialize;
use serde_tokenstream::ParseWrapper;
use syn::{parse, LitStr};

#[derive(Deserialize)]
struct MacroSettings {
    program: ParseWrapper<LitStr>,
    alignment: Option<usize>,
    channel_bound: Option<usize>,
    table_size: Option<usize>,
}

#[proc_macro]
pub fn use_tables(item: TokenStream) -> TokenStream {
    match do_use_tables(item) {
        Err(err) => err.to_compile_error().into(),
        Ok(out) => out,
    }
}

fn do_use_tables(item: TokenStream) -> Result<TokenStream, syn::Error> {
    let (program, settings) = if let Ok(program) = parse::<LitStr>(item.clone())
    {
        (program, Settings::default())
    } else {
        let MacroSettings {
            program,
            alignment,
            channel_bound,
            table_size,
        } = serde_tokenstream::from_tokenstream(&item.into())?;
        let mut settings = Settings::default();
        if let Some(a) = alignment {
            settings.alignment = a;
        }
        if let Some(b) = channel_bound {
            settings.channel_bound = b;
        }
        if let Some(s) = table_size {
            settings.default_table_capacity = s;
        }
        (program.into_inner(), settings)
    };

    generate_rs(&program, &settings)
}

fn generate_rs(
    program: &LitStr,
    settings: &Settings,
) -> Result<TokenStream, syn::Error> {
    let path = resolve(&program.value());
    let contents = fs::read_to_string(&path).map_err(|e| {
        syn::Error::new(
            program.span(),
            format!("read {}: {}", path.display(), e),
        )
    })?;
    let ast: AST = serde_json::from_str(&contents).map_err(|e| {
        syn::Error::new(
            program.span(),
            format!("parse {}: {}", path.display(), e),
        )
    })?;

    let log = slog::Logger::root(slog::Discard, slog::o!());
    let lowering = p4_cg::lower_program(&ast, settings, &log);
    check(&lowering.diags)?;

    Ok(p4_rust::emit_tokens(&lowering).into())
}

fn resolve(program: &str) -> PathBuf {
    match std::env::var_os("CARGO_MANIFEST_DIR") {
        Some(dir) => PathBuf::from(dir).join(program),
        None => PathBuf::from(program),
    }
}

fn check(diagnostics: &p4::check::Diagnostics) -> Result<(), syn::Error> {
    let mut result: Option<syn::Error> = None;
    for e in diagnostics.errors() {
        let err = syn::Error::new(
            Span::call_site(),
            format!("table {}: {}", e.table, e.message),
        );
        match result.as_mut() {
            Some(r) => r.combine(err),
            None => result = Some(err),
        }
    }
    match result {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
