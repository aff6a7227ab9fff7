// Copyright 2024 Oxide Computer Company

//! Rust simulation backend.
//!
//! For every lowered table this emits a static lookup store, a
//! [`p4rs::TableShape`] constant describing its layout, and the
//! `extern "C"` read and write functions the Bluespec simulation imports
//! through BDPI.

use std::fs;
use std::io;
use std::path::Path;

use p4_cg::Lowering;
use proc_macro2::TokenStream;
use quote::quote;

mod sim;

use sim::SimGenerator;

pub fn emit_tokens(lowering: &Lowering) -> TokenStream {
    let mut tokens = TokenStream::new();
    let mut registry = Vec::new();

    for table in &lowering.tables {
        let gen = SimGenerator::new(table);
        tokens.extend(gen.generate());
        let (shape, store) = (gen.shape(), gen.store());
        registry.push(quote! { (&#shape, &#store) });
    }

    tokens.extend(quote! {
        /// Every simulated table of the program with its layout.
        pub static MATCH_TABLES: &[(
            &p4rs::TableShape,
            &p4rs::table::SharedMatchTable,
        )] = &[#(#registry),*];
    });

    tokens
}

/// Format the generated backend as Rust source.
pub fn emit_source(lowering: &Lowering) -> Result<String, syn::Error> {
    let f: syn::File = syn::parse2(emit_tokens(lowering))?;
    Ok(prettyplease::unparse(&f))
}

pub fn emit(lowering: &Lowering, filename: &Path) -> io::Result<()> {
    let source = emit_source(lowering)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(filename, source)
}
