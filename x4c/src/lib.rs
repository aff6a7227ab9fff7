// Copyright 2022 Oxide Computer Company

use anyhow::{anyhow, Result};
use clap::Parser;
use colored::Colorize;
use p4::ast::AST;
use p4::check::Diagnostics;
use p4_cg::{
    KeyFieldPolicy, LoweredTable, Lowering, Settings, DEFAULT_ALIGNMENT,
    DEFAULT_CHANNEL_BOUND, DEFAULT_TABLE_CAPACITY,
};
use slog::{info, Drain, Logger};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(version = "0.1")]
pub struct Opts {
    /// Show the table descriptors produced by the lowering.
    #[arg(long)]
    pub show_descriptors: bool,

    /// Show the packed request and response layout of every table.
    #[arg(long)]
    pub show_layout: bool,

    /// Resolved program to compile, as JSON.
    pub filename: String,

    /// What target to generate code for.
    #[arg(long, value_enum, default_value_t = Target::All)]
    pub target: Target,

    /// Just check code, do not compile.
    #[arg(long)]
    pub check: bool,

    /// Prefix of the files to write generated code to.
    #[arg(short, long, default_value = "out")]
    pub out: String,

    /// Pad request layouts to a multiple of this many bits.
    #[arg(long, default_value_t = DEFAULT_ALIGNMENT)]
    pub alignment: usize,

    /// Number of hardware channels table ids wrap around.
    #[arg(long, default_value_t = DEFAULT_CHANNEL_BOUND)]
    pub channel_bound: usize,

    /// Lookup engine capacity for tables without a size property.
    #[arg(long, default_value_t = DEFAULT_TABLE_CAPACITY)]
    pub table_size: usize,

    /// Fail a table whose key references an unresolvable field instead of
    /// dropping the field.
    #[arg(long)]
    pub strict_keys: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Bsv,
    Rust,
    All,
}

impl Opts {
    pub fn settings(&self) -> Settings {
        Settings {
            alignment: self.alignment,
            channel_bound: self.channel_bound,
            default_table_capacity: self.table_size,
            key_field_policy: if self.strict_keys {
                KeyFieldPolicy::Abort
            } else {
                KeyFieldPolicy::Skip
            },
        }
    }
}

/// Root logger for the driver. `RUST_LOG` selects the level.
pub fn logger() -> Logger {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::new(drain).fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    Logger::root(drain, slog::o!())
}

pub fn load(filename: &Path) -> Result<AST> {
    let contents = fs::read_to_string(filename)
        .map_err(|e| anyhow!("read input: {}: {}", filename.display(), e))?;
    serde_json::from_str(&contents)
        .map_err(|e| anyhow!("parse input: {}: {}", filename.display(), e))
}

/// What a compilation produced.
#[derive(Debug, Default)]
pub struct Outcome {
    pub files: Vec<PathBuf>,
    /// Tables that did not lower and therefore have no generated code.
    pub failed: Vec<String>,
}

pub fn process_file(opts: &Opts, log: &Logger) -> Result<Lowering> {
    let ast = load(Path::new(&opts.filename))?;
    let lowering = p4_cg::lower_program(&ast, &opts.settings(), log);
    info!(log, "lowered";
        "tables" => lowering.tables.len(),
        "diagnostics" => lowering.diags.len()
    );

    report(&lowering.diags);
    if opts.show_descriptors {
        for t in &lowering.tables {
            println!("{:#?}", t.descriptor);
        }
    }
    if opts.show_layout {
        for t in &lowering.tables {
            print!("{}", layout_summary(t));
        }
    }
    Ok(lowering)
}

pub fn compile(opts: &Opts, log: &Logger) -> Result<Outcome> {
    let lowering = process_file(opts, log)?;
    let failed = lowering
        .diags
        .errors()
        .iter()
        .map(|d| d.table.clone())
        .collect();

    let mut outcome = Outcome {
        files: Vec::new(),
        failed,
    };
    if opts.check {
        return Ok(outcome);
    }

    if matches!(opts.target, Target::Bsv | Target::All) {
        let files = p4_bsv::emit(&lowering, Path::new(&opts.out), log)?;
        outcome.files.extend(files);
    }
    if matches!(opts.target, Target::Rust | Target::All) {
        let filename = PathBuf::from(format!("{}.rs", opts.out));
        p4_rust::emit(&lowering, &filename)?;
        outcome.files.push(filename);
    }
    for f in &outcome.files {
        info!(log, "wrote"; "file" => %f.display());
    }
    Ok(outcome)
}

fn report(diagnostics: &Diagnostics) {
    for d in diagnostics.iter() {
        eprintln!("{}", d);
    }
    let errors = diagnostics.errors().len();
    if errors > 0 {
        eprintln!(
            "{}",
            format!("{} table(s) failed to lower", errors).bright_red()
        );
    }
}

/// Field by field rendering of a table's packed layouts, most significant
/// field first.
pub fn layout_summary(table: &LoweredTable) -> String {
    let layout = &table.layout;
    let mut out = format!(
        "{} (id {}, {} entries)\n",
        table.name().bold(),
        table.descriptor.id(),
        table.descriptor.capacity()
    );
    out.push_str(&format!("  request {} bits\n", layout.request.width()));
    for f in layout.request.fields() {
        if let Some((offset, width)) = layout.request.offset_of(&f.name) {
            out.push_str(&format!("    [{}+:{}] {}\n", offset, width, f.name));
        }
    }
    out.push_str(&format!("  response {} bits\n", layout.response.width()));
    for f in layout.response.fields() {
        if let Some((offset, width)) = layout.response.offset_of(&f.name) {
            out.push_str(&format!("    [{}+:{}] {}\n", offset, width, f.name));
        }
    }
    out
}
