// Copyright 2022 Oxide Computer Company

//! The Bluespec types, the Bluespec simulation imports and the Rust backend
//! generated for a table must agree on every width.

use p4_cg::Settings;
use p4rs::TableShape;

use crate::flow_table::FLOW_TBL_SHAPE;
use crate::port_table::PORT_TBL_SHAPE;
use crate::programs;
use crate::test_logger;

/// Sum of the `Bit#(n)` members of the named typedef struct.
fn struct_width(text: &str, name: &str) -> usize {
    let end = text
        .find(&format!("}} {} deriving", name))
        .unwrap_or_else(|| panic!("no struct {}", name));
    let start = text[..end].rfind("typedef struct {").unwrap();
    text[start..end]
        .lines()
        .filter_map(|l| l.trim().strip_prefix("Bit#("))
        .map(|l| l[..l.find(')').unwrap()].parse::<usize>().unwrap())
        .sum()
}

fn check(program: &str, settings: &Settings, shape: &TableShape) {
    let log = test_logger();
    let lowering = programs::lower(program, settings, &log).unwrap();
    assert_eq!(lowering.tables.len(), 1);
    let table = &lowering.tables[0];
    let (kw, rw) = (table.layout.request.width(), table.layout.response.width());

    assert_eq!(shape.request_width(), kw);
    assert_eq!(shape.response_width(), rw);
    assert_eq!(shape.padding, table.layout.request.padding);
    assert_eq!(shape.tag_width, table.layout.response.tag_width);

    let out = p4_bsv::emit_program(&lowering, &log);
    let ty = p4_cg::naming::camel_case(table.name());
    assert_eq!(struct_width(&out.connectal_types, &format!("{}ReqT", ty)), kw);
    assert_eq!(struct_width(&out.connectal_types, &format!("{}RspT", ty)), rw);
    assert_eq!(struct_width(&out.control, &format!("{}ReqT", ty)), kw);

    let instance = format!(
        "instance MatchTableSim#({}, {}, {});",
        shape.id, kw, rw
    );
    assert!(out.control.contains(&instance), "{}", instance);
}

#[test]
fn port_table_widths_agree() {
    check("port.json", &Settings::default(), &PORT_TBL_SHAPE);
}

#[test]
fn flow_table_widths_agree() {
    let settings = Settings {
        alignment: 12,
        ..Default::default()
    };
    check("flow.json", &settings, &FLOW_TBL_SHAPE);
}

#[test]
fn missing_program() {
    assert!(programs::load("nope.json").is_err());
}
