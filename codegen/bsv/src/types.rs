// Copyright 2024 Oxide Computer Company

//! Request, response and action type definitions.
//!
//! Every table gets its types twice. The `ConnectalTypes` copy is what the
//! host API sees and carries the action tag as raw bits. The `Control` copy
//! is used inside the pipeline and carries the tag as an enum. Both list the
//! same fields with the same widths in the same order, so they pack to
//! identical bit strings.

use p4_cg::layout::ACTION_TAG_FIELD;
use p4_cg::naming::{camel_case, enum_tag};
use p4_cg::LoweredTable;

use crate::builder::BsvBuilder;
use crate::Names;

/// Enum members of the action tag in ordinal order. A one action table gets
/// a reserved second member so the enum still packs to one bit.
pub fn action_enum_members(table: &LoweredTable) -> Vec<String> {
    let mut members: Vec<String> = table
        .descriptor
        .actions()
        .iter()
        .map(|a| enum_tag(&a.name))
        .collect();
    if members.len() == 1 {
        members.push(enum_tag(&format!("{}_reserved", table.name())));
    }
    members
}

fn request_struct(b: &mut BsvBuilder, table: &LoweredTable, derives: &str) {
    let names = Names::new(table);
    b.block(
        "typedef struct {",
        format!("}} {} deriving ({});", names.req(), derives),
        |b| {
            for f in table.layout.request.fields() {
                b.line(format!("Bit#({}) {};", f.width, f.name));
            }
        },
    );
}

pub fn emit_control_types(b: &mut BsvBuilder, table: &LoweredTable) {
    let names = Names::new(table);
    let derives = "Bits, Eq, FShow";

    request_struct(b, table, derives);

    let members = action_enum_members(table);
    b.block(
        "typedef enum {",
        format!("}} {} deriving ({});", names.action_t(), derives),
        |b| {
            for (i, m) in members.iter().enumerate() {
                if i + 1 < members.len() {
                    b.line(format!("{},", m));
                } else {
                    b.line(m);
                }
            }
        },
    );

    b.block(
        "typedef struct {",
        format!("}} {} deriving ({});", names.rsp(), derives),
        |b| {
            b.line(format!("{} {};", names.action_t(), ACTION_TAG_FIELD));
            for p in &table.layout.response.parameters {
                b.line(format!("Bit#({}) {};", p.width, p.name));
            }
        },
    );

    action_union(b, table, names.action_req(), "ReqT", true);
    action_union(b, table, names.action_rsp(), "RspT", false);
}

/// Tagged union with one member per action. Requests carry the parameters
/// of their own action only.
fn action_union(
    b: &mut BsvBuilder,
    table: &LoweredTable,
    name: String,
    suffix: &str,
    with_parameters: bool,
) {
    b.block(
        "typedef union tagged {",
        format!("}} {} deriving (Bits, Eq, FShow);", name),
        |b| {
            for action in table.descriptor.actions() {
                b.block(
                    "struct {",
                    format!("}} {}{};", camel_case(&action.name), suffix),
                    |b| {
                        b.line("PacketInstance pkt;");
                        b.line("MetadataT meta;");
                        if with_parameters {
                            for p in &action.parameters {
                                b.line(format!("Bit#({}) {};", p.width, p.name));
                            }
                        }
                    },
                );
            }
        },
    );
}

pub fn emit_connectal_types(b: &mut BsvBuilder, table: &LoweredTable) {
    let names = Names::new(table);
    let derives = "Bits, FShow";

    request_struct(b, table, derives);

    b.block(
        "typedef struct {",
        format!("}} {} deriving ({});", names.rsp(), derives),
        |b| {
            for f in table.layout.response.fields() {
                b.line(format!("Bit#({}) {};", f.width, f.name));
            }
        },
    );
}

/// `name: value` assignments of every request field. The pad field, the
/// first field when the layout has one, is set to zero.
pub(crate) fn request_fields(
    table: &LoweredTable,
    value: impl Fn(&str) -> String,
) -> String {
    let padded = table.layout.request.padding > 0;
    table
        .layout
        .request
        .fields()
        .iter()
        .enumerate()
        .map(|(i, f)| {
            if padded && i == 0 {
                format!("{}: 0", f.name)
            } else {
                format!("{}: {}", f.name, value(&f.name))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
