// Copyright 2024 Oxide Computer Company

//! Identifier conventions shared by every backend. The Bluespec text and the
//! simulation entry points must agree on these exactly.

use p4::ast::Table;
use regex::Regex;
use std::sync::OnceLock;

fn non_identifier() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new("[^A-Za-z0-9_]").expect("identifier regex")
    })
}

/// The name a table is emitted under. An `@name` annotation wins over the
/// declared name.
pub fn table_name(table: &Table) -> String {
    match &table.name_annotation {
        Some(annotation) => {
            non_identifier().replace_all(annotation, "_").into_owned()
        }
        None => table.name.clone(),
    }
}

/// `ipv4_lpm` -> `Ipv4Lpm`
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for part in name.split('_').filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// `ipv4_lpm` -> `ipv4Lpm`
pub fn lower_camel_case(name: &str) -> String {
    let upper = camel_case(name);
    let mut chars = upper.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_lowercase().collect();
            out.push_str(chars.as_str());
            out
        }
        None => upper,
    }
}

/// `ipv4_lpm` -> `IPV4_LPM`
pub fn upper_case(name: &str) -> String {
    name.to_uppercase()
}

/// Bluespec enum tag of an action: `set_nhop` -> `SET_NHOP`. Tags must start
/// with an uppercase letter, so leading underscores are dropped and a tag
/// that would start with a digit gets an `A` in front.
pub fn enum_tag(name: &str) -> String {
    let tag = upper_case(name.trim_start_matches('_'));
    match tag.chars().next() {
        Some(c) if c.is_ascii_uppercase() => tag,
        _ => format!("A{}", tag),
    }
}

/// Name of the simulation read entry point for a table.
pub fn sim_read_fn(table: &str) -> String {
    format!("matchtable_read_{}", lower_camel_case(table))
}

/// Name of the simulation write entry point for a table.
pub fn sim_write_fn(table: &str) -> String {
    format!("matchtable_write_{}", lower_camel_case(table))
}
