// Copyright 2024 Oxide Computer Company

//! Target independent lowering of match-action tables.
//!
//! A table of the resolved program is lowered in three steps. The key
//! extractor and the action catalog builder produce an immutable
//! [`TableDescriptor`], and the layout encoder derives the packed request
//! and response layouts from it. Every backend consumes the same
//! [`LoweredTable`] so the emitted artifacts agree bit for bit.

use p4::ast::{Control, Table, AST};
use p4::check::Diagnostics;
use serde::Deserialize;
use slog::{debug, warn, Logger};

pub mod action;
pub mod descriptor;
pub mod error;
pub mod key;
pub mod layout;
pub mod naming;

pub use descriptor::{
    ActionParam, ActionRef, KeyField, TableDescriptor, TableDescriptorBuilder,
};
pub use error::{CodegenError, TableWarning};
pub use layout::{Field, RequestLayout, ResponseLayout, TableLayout};

pub const DEFAULT_ALIGNMENT: usize = 9;
pub const DEFAULT_CHANNEL_BOUND: usize = 32;
pub const DEFAULT_TABLE_CAPACITY: usize = 256;

/// What to do with a key element that does not resolve to a fixed width
/// struct or header member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyFieldPolicy {
    /// Leave the element out of the key and warn.
    #[default]
    Skip,
    /// Fail the table.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Request layouts are padded to a multiple of this many bits.
    pub alignment: usize,
    /// Table ids are declaration indices modulo this bound.
    pub channel_bound: usize,
    /// Lookup engine capacity for tables without a `size` property.
    pub default_table_capacity: usize,
    pub key_field_policy: KeyFieldPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alignment: DEFAULT_ALIGNMENT,
            channel_bound: DEFAULT_CHANNEL_BOUND,
            default_table_capacity: DEFAULT_TABLE_CAPACITY,
            key_field_policy: KeyFieldPolicy::default(),
        }
    }
}

/// A table ready for emission.
#[derive(Debug, Clone)]
pub struct LoweredTable {
    pub descriptor: TableDescriptor,
    pub layout: TableLayout,
    /// Recoverable problems found while lowering this table.
    pub diagnostics: Diagnostics,
}

impl LoweredTable {
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }
}

/// The result of lowering every table of a program. Tables that failed are
/// absent from `tables` and have an error in `diags`.
#[derive(Debug, Default)]
pub struct Lowering {
    pub tables: Vec<LoweredTable>,
    pub diags: Diagnostics,
}

impl Lowering {
    pub fn has_errors(&self) -> bool {
        !self.diags.errors().is_empty()
    }
}

pub fn lower_table(
    ast: &AST,
    control: &Control,
    table: &Table,
    settings: &Settings,
    log: &Logger,
) -> Result<LoweredTable, CodegenError> {
    let mut diagnostics = Diagnostics::new();
    let (descriptor, layout) =
        lower_into(ast, control, table, settings, log, &mut diagnostics)?;
    Ok(LoweredTable {
        descriptor,
        layout,
        diagnostics,
    })
}

/// Lower one table, recording recoverable problems in `diagnostics` whether
/// or not the table lowers.
fn lower_into(
    ast: &AST,
    control: &Control,
    table: &Table,
    settings: &Settings,
    log: &Logger,
    diagnostics: &mut Diagnostics,
) -> Result<(TableDescriptor, TableLayout), CodegenError> {
    let name = naming::table_name(table);
    let log = log.new(slog::o!("table" => name.clone()));

    let scope = key::ControlScope::new(ast, control);
    let (key_fields, key_warnings) =
        key::extract_key_fields(&table.key, &scope, &log);
    if settings.key_field_policy == KeyFieldPolicy::Abort {
        if let Some(TableWarning::UnresolvedKeyFieldType { expression, reason }) =
            key_warnings.first()
        {
            return Err(CodegenError::UnresolvedKeyFieldType {
                table: name,
                expression: expression.clone(),
                reason: reason.clone(),
            });
        }
    }

    let (actions, action_warnings) = action::build_catalog(
        &table.actions,
        table.default_action.as_deref(),
        control,
        &log,
    );
    debug!(log, "catalog";
        "key_fields" => key_fields.len(),
        "actions" => actions.len()
    );

    for w in key_warnings.iter().chain(action_warnings.iter()) {
        warn!(log, "{}", w);
        diagnostics.push(w.to_diagnostic(&name));
    }

    let descriptor = TableDescriptor::builder(name)
        .id(table.declaration_index % settings.channel_bound.max(1))
        .capacity(table.size.unwrap_or(settings.default_table_capacity))
        .key_fields(key_fields)
        .actions(actions)
        .default_action(table.default_action.clone())
        .build();

    let layout = layout::encode(&descriptor, settings.alignment)?;
    debug!(log, "layout";
        "key_width" => layout.request.key_width(),
        "request_width" => layout.request.width(),
        "tag_width" => layout.response.tag_width,
        "response_width" => layout.response.width()
    );

    Ok((descriptor, layout))
}

/// Lower every table of the program in declaration order. A failing table
/// is reported and skipped; its siblings are lowered regardless.
pub fn lower_program(ast: &AST, settings: &Settings, log: &Logger) -> Lowering {
    let mut result = Lowering::default();
    for (control, table) in ast.tables() {
        let mut diagnostics = Diagnostics::new();
        match lower_into(ast, control, table, settings, log, &mut diagnostics)
        {
            Ok((descriptor, layout)) => {
                result.diags.extend(&diagnostics);
                result.tables.push(LoweredTable {
                    descriptor,
                    layout,
                    diagnostics,
                });
            }
            Err(e) => {
                warn!(log, "table skipped"; "error" => %e);
                // the warnings often explain the failure
                result.diags.extend(&diagnostics);
                result.diags.push(e.to_diagnostic());
            }
        }
    }
    result
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use p4::ast::{
        Action, ActionListElement, ActionParameter, ControlParameter,
        Direction, Header, HeaderMember, KeyElement, KeyExpression, MatchKind,
        Struct, StructMember, Type,
    };
    use p4::check::Level;
    use slog::Drain;
    use std::env;

    pub(crate) fn test_logger() -> Logger {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "info");
        }
        let decorator = slog_term::TermDecorator::new().build();
        let drain = slog_term::FullFormat::new(decorator).build().fuse();
        let drain = slog_envlogger::new(drain).fuse();
        Logger::root(std::sync::Mutex::new(drain).fuse(), slog::o!())
    }

    fn key(base: &str, member: &str) -> KeyElement {
        KeyElement {
            expression: KeyExpression::Member {
                base: base.into(),
                member: member.into(),
            },
            match_kind: MatchKind::Exact,
        }
    }

    fn call(name: &str) -> ActionListElement {
        ActionListElement::DirectCall(name.into())
    }

    fn action(name: &str, params: &[(&str, Type)]) -> Action {
        let mut a = Action::new(name.into());
        for (n, ty) in params {
            a.parameters.push(ActionParameter {
                ty: ty.clone(),
                name: (*n).into(),
            });
        }
        a
    }

    fn program() -> AST {
        let mut ast = AST::default();
        let mut tcp = Header::new("tcp_h".into());
        for name in ["srcPort", "dstPort"] {
            tcp.members.push(HeaderMember {
                ty: Type::Bit(8),
                name: name.into(),
            });
        }
        ast.headers.push(tcp);
        let mut hdr = Struct::new("headers_t".into());
        hdr.members.push(StructMember {
            ty: Type::UserDefined("tcp_h".into()),
            name: "tcp".into(),
        });
        ast.structs.push(hdr);

        let mut ingress = Control::new("ingress".into());
        ingress.parameters.push(ControlParameter {
            direction: Direction::InOut,
            ty: Type::UserDefined("headers_t".into()),
            name: "hdr".into(),
        });
        ingress.actions.push(action("default", &[]));
        ingress.actions.push(action("forward", &[("port", Type::Bit(8))]));
        ingress.actions.push(action("drop", &[]));
        ingress.actions.push(action("wide", &[("port", Type::Bit(16))]));

        let mut ports = Table::new("port_tbl".into());
        ports.key = vec![key("hdr.tcp", "srcPort"), key("hdr.tcp", "dstPort")];
        ports.actions = vec![call("forward"), call("drop"), call("default")];
        ports.default_action = Some("default".into());
        ports.declaration_index = 33;
        ingress.tables.push(ports);

        let mut broken = Table::new("broken".into());
        broken.key = vec![key("hdr.tcp", "srcPort")];
        broken.actions = vec![call("forward"), call("wide")];
        broken.declaration_index = 34;
        ingress.tables.push(broken);

        let mut sized = Table::new("sized".into());
        sized.name_annotation = Some("ingress.sized".into());
        sized.key = vec![key("hdr.tcp", "dstPort"), key("hdr.udp", "dstPort")];
        sized.actions = vec![call("drop")];
        sized.size = Some(1024);
        sized.declaration_index = 35;
        ingress.tables.push(sized);

        ast.controls.push(ingress);
        ast
    }

    #[test]
    fn lower_port_table() {
        let ast = program();
        let control = &ast.controls[0];
        let lowered = lower_table(
            &ast,
            control,
            &control.tables[0],
            &Settings::default(),
            &test_logger(),
        )
        .unwrap();

        let d = &lowered.descriptor;
        assert_eq!(d.name(), "port_tbl");
        assert_eq!(d.id(), 1);
        assert_eq!(d.capacity(), DEFAULT_TABLE_CAPACITY);
        assert_eq!(d.ordinal("default"), Some(0));
        assert_eq!(d.ordinal("forward"), Some(1));
        assert_eq!(d.ordinal("drop"), Some(2));
        assert_eq!(lowered.layout.request.width(), 18);
        assert_eq!(lowered.layout.response.width(), 10);
        assert!(lowered.diagnostics.is_empty());
    }

    #[test]
    fn failing_table_does_not_affect_siblings() {
        let ast = program();
        let lowering =
            lower_program(&ast, &Settings::default(), &test_logger());

        let names: Vec<&str> =
            lowering.tables.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["port_tbl", "ingress_sized"]);
        assert!(lowering.has_errors());

        let errors = lowering.diags.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].table, "broken");

        let warnings = lowering.diags.for_table("ingress_sized");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, Level::Warning);

        let sized = &lowering.tables[1];
        assert_eq!(sized.descriptor.capacity(), 1024);
        assert_eq!(sized.descriptor.key_width(), 8);
        assert_eq!(sized.descriptor.id(), 3);
    }

    #[test]
    fn failed_table_keeps_warnings() {
        let mut ast = program();
        let mut fwd = Table::new("fwd".into());
        fwd.key = vec![key("hdr.tcp", "dstPort")];
        fwd.actions = vec![ActionListElement::PathReference("forward".into())];
        ast.controls[0].tables = vec![fwd];

        let lowering =
            lower_program(&ast, &Settings::default(), &test_logger());
        assert!(lowering.tables.is_empty());

        let diags = lowering.diags.for_table("fwd");
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].level, Level::Warning);
        assert_eq!(
            diags[0].message,
            TableWarning::UnsupportedActionReference {
                reference: "forward".into(),
            }
            .to_string()
        );
        assert_eq!(diags[1].level, Level::Error);
        assert_eq!(
            diags[1].message,
            "action list is empty, no action tag width can be computed"
        );
    }

    #[test]
    fn strict_key_policy() {
        let ast = program();
        let control = &ast.controls[0];
        let settings = Settings {
            key_field_policy: KeyFieldPolicy::Abort,
            ..Default::default()
        };
        let err = lower_table(
            &ast,
            control,
            &control.tables[2],
            &settings,
            &test_logger(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CodegenError::UnresolvedKeyFieldType { ref table, .. }
                if table == "ingress_sized"
        ));
    }

    #[test]
    fn lowering_is_deterministic() {
        let ast = program();
        let log = test_logger();
        let a = lower_program(&ast, &Settings::default(), &log);
        let b = lower_program(&ast, &Settings::default(), &log);
        assert_eq!(a.tables.len(), b.tables.len());
        for (x, y) in a.tables.iter().zip(b.tables.iter()) {
            assert_eq!(x.descriptor, y.descriptor);
            assert_eq!(x.layout, y.layout);
        }
    }

    #[test]
    fn settings_from_json() {
        let s: Settings = serde_json::from_str(
            r#"{ "alignment": 8, "key_field_policy": "abort" }"#,
        )
        .unwrap();
        assert_eq!(s.alignment, 8);
        assert_eq!(s.channel_bound, DEFAULT_CHANNEL_BOUND);
        assert_eq!(s.key_field_policy, KeyFieldPolicy::Abort);
    }
}
