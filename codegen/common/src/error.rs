// Copyright 2024 Oxide Computer Company

use p4::check::{Diagnostic, Level};
use thiserror::Error;

/// Conditions that abort generation for a single table. Sibling tables are
/// not affected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("action list is empty, no action tag width can be computed")]
    EmptyActionList { table: String },

    #[error(
        "parameter {parameter} is bit<{first_width}> in action {first_action} \
        but bit<{width}> in action {action}"
    )]
    ConflictingParameterWidth {
        table: String,
        parameter: String,
        first_action: String,
        first_width: usize,
        action: String,
        width: usize,
    },

    #[error("key element {expression} cannot be used: {reason}")]
    UnresolvedKeyFieldType {
        table: String,
        expression: String,
        reason: String,
    },

    #[error("no usable key fields")]
    EmptyKey { table: String },

    #[error("key field {field} appears more than once")]
    DuplicateKeyField { table: String, field: String },

    #[error("{field} is reserved for the generated layout")]
    ReservedFieldName { table: String, field: String },

    #[error("actions {first} and {second} are both emitted as {emitted}")]
    ActionNameClash {
        table: String,
        first: String,
        second: String,
        emitted: String,
    },
}

impl CodegenError {
    pub fn table(&self) -> &str {
        match self {
            CodegenError::EmptyActionList { table } => table,
            CodegenError::ConflictingParameterWidth { table, .. } => table,
            CodegenError::UnresolvedKeyFieldType { table, .. } => table,
            CodegenError::EmptyKey { table } => table,
            CodegenError::DuplicateKeyField { table, .. } => table,
            CodegenError::ReservedFieldName { table, .. } => table,
            CodegenError::ActionNameClash { table, .. } => table,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic {
            level: Level::Error,
            message: self.to_string(),
            table: self.table().to_owned(),
        }
    }
}

/// Recoverable conditions. Generation continues with the offending element
/// left out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableWarning {
    /// The key element is skipped, which shrinks the key. Lookups that
    /// depended on the element will alias.
    #[error("key element {expression} skipped: {reason}")]
    UnresolvedKeyFieldType { expression: String, reason: String },

    #[error("unsupported action reference {reference} skipped")]
    UnsupportedActionReference { reference: String },

    #[error("action {action} has no parameter declaration, assuming none")]
    MissingActionParameters { action: String },

    #[error(
        "parameter {parameter} of action {action} has type {ty} with no \
        fixed width, skipped"
    )]
    UnsizedActionParameter {
        action: String,
        parameter: String,
        ty: String,
    },
}

impl TableWarning {
    pub fn to_diagnostic(&self, table: &str) -> Diagnostic {
        Diagnostic {
            level: Level::Warning,
            message: self.to_string(),
            table: table.to_owned(),
        }
    }
}
