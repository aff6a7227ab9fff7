// Copyright 2022 Oxide Computer Company

use colored::Colorize;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Level of this diagnostic.
    pub level: Level,

    /// Message associated with this diagnostic.
    pub message: String,

    /// Name of the table the diagnostic is attributed to.
    pub table: String,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Level {
    Info,
    Deprecation,
    Warning,
    Error,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            Level::Info => "info".bright_blue(),
            Level::Deprecation => "deprecated".yellow(),
            Level::Warning => "warning".bright_yellow(),
            Level::Error => "error".bright_red(),
        };
        let loc = format!("[table {}]", self.table);
        write!(f, "{} {}: {}", loc.bright_white(), level, self.message)
    }
}

#[derive(Debug, Default, Clone)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.0.iter().filter(|x| x.level == Level::Error).collect()
    }

    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.0.iter().filter(|x| x.level == Level::Warning).collect()
    }

    /// Diagnostics attributed to the named table.
    pub fn for_table(&self, table: &str) -> Vec<&Diagnostic> {
        self.0.iter().filter(|x| x.table == table).collect()
    }

    pub fn push(&mut self, d: Diagnostic) {
        self.0.push(d)
    }

    pub fn extend(&mut self, diags: &Diagnostics) {
        self.0.extend(diags.0.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }
}
