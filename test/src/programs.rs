// Copyright 2022 Oxide Computer Company

//! Loading of the resolved programs under `programs/`.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use p4::ast::AST;
use p4_cg::{Lowering, Settings};
use slog::Logger;

pub fn path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("programs")
        .join(name)
}

pub fn load(name: &str) -> Result<AST> {
    let path = path(name);
    let contents = fs::read_to_string(&path)
        .map_err(|e| anyhow!("read {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Load and lower a program, failing if any table did not lower.
pub fn lower(name: &str, settings: &Settings, log: &Logger) -> Result<Lowering> {
    let ast = load(name)?;
    let lowering = p4_cg::lower_program(&ast, settings, log);
    if let Some(e) = lowering.diags.errors().first() {
        return Err(anyhow!("{}", e));
    }
    Ok(lowering)
}
