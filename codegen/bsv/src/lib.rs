// Copyright 2024 Oxide Computer Company

//! Bluespec SystemVerilog backend.
//!
//! Each lowered table produces its API type definitions, which go to the
//! `ConnectalTypes` file, and its pipeline types, simulation imports and
//! pipeline module, which go to the `Control` file.

use std::path::{Path, PathBuf};

use p4_cg::naming::camel_case;
use p4_cg::{LoweredTable, Lowering};
use slog::{debug, Logger};

pub use builder::BsvBuilder;
pub use error::EmitError;

pub mod arbiter;
mod builder;
mod error;
pub mod sim;
mod table;
pub mod types;

/// Bluespec type names of one table.
pub(crate) struct Names {
    pub(crate) ty: String,
}

impl Names {
    pub(crate) fn new(table: &LoweredTable) -> Self {
        Self {
            ty: camel_case(table.name()),
        }
    }

    pub(crate) fn req(&self) -> String {
        format!("{}ReqT", self.ty)
    }

    pub(crate) fn rsp(&self) -> String {
        format!("{}RspT", self.ty)
    }

    pub(crate) fn action_t(&self) -> String {
        format!("{}ActionT", self.ty)
    }

    pub(crate) fn action_req(&self) -> String {
        format!("{}ActionReq", self.ty)
    }

    pub(crate) fn action_rsp(&self) -> String {
        format!("{}ActionRsp", self.ty)
    }
}

/// Everything emitted for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableArtifacts {
    pub name: String,
    pub connectal_types: String,
    pub control_types: String,
    pub sim: String,
    pub module: String,
}

pub fn emit_table(table: &LoweredTable, log: &Logger) -> TableArtifacts {
    let mut connectal = BsvBuilder::new();
    types::emit_connectal_types(&mut connectal, table);

    let mut control = BsvBuilder::new();
    types::emit_control_types(&mut control, table);

    let mut sim = BsvBuilder::new();
    sim::emit_sim(&mut sim, table);

    let mut module = BsvBuilder::new();
    table::TableGenerator::new(table, log).generate(&mut module);

    TableArtifacts {
        name: table.name().to_owned(),
        connectal_types: connectal.finish(),
        control_types: control.finish(),
        sim: sim.finish(),
        module: module.finish(),
    }
}

/// The two Bluespec source files of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BsvOutput {
    pub connectal_types: String,
    pub control: String,
}

const HEADER: &str = "// Generated by x4c. Do not edit.";

const CONTROL_IMPORTS: &[&str] = &[
    "ClientServer",
    "ConfigReg",
    "ConnectalTypes",
    "FIFOF",
    "GetPut",
    "MatchTable",
    "MatchTableSim",
    "Pipe",
    "Vector",
];

pub fn emit_program(lowering: &Lowering, log: &Logger) -> BsvOutput {
    let mut connectal = BsvBuilder::new();
    connectal.line(HEADER).blank();

    let mut control = BsvBuilder::new();
    control.line(HEADER);
    for i in CONTROL_IMPORTS {
        control.line(format!("import {}::*;", i));
    }

    for table in &lowering.tables {
        let a = emit_table(table, log);
        debug!(log, "emitted bsv"; "table" => &a.name);

        connectal.line(format!("// {}", a.name));
        connectal.append(&BsvBuilder::from(a.connectal_types));
        connectal.blank();

        control.blank();
        for part in [a.control_types, a.sim, a.module] {
            control.append(&BsvBuilder::from(part));
        }
    }

    BsvOutput {
        connectal_types: connectal.finish(),
        control: control.finish(),
    }
}

/// Write `<prefix>.connectal.bsv` and `<prefix>.control.bsv`.
pub fn emit(
    lowering: &Lowering,
    prefix: &Path,
    log: &Logger,
) -> Result<Vec<PathBuf>, EmitError> {
    let out = emit_program(lowering, log);
    let connectal = with_suffix(prefix, "connectal.bsv");
    let control = with_suffix(prefix, "control.bsv");
    std::fs::write(&connectal, out.connectal_types)?;
    std::fs::write(&control, out.control)?;
    Ok(vec![connectal, control])
}

pub(crate) fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut s = prefix.as_os_str().to_owned();
    s.push(".");
    s.push(suffix);
    PathBuf::from(s)
}
