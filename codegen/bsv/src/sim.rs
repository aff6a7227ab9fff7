// Copyright 2024 Oxide Computer Company

use p4_cg::naming::{sim_read_fn, sim_write_fn};
use p4_cg::LoweredTable;

use crate::builder::BsvBuilder;

/// Foreign imports of the software lookup store and the `MatchTableSim`
/// instance that routes the table's lookups to them.
pub fn emit_sim(b: &mut BsvBuilder, table: &LoweredTable) {
    let id = table.descriptor.id();
    let kw = table.layout.request.width();
    let rw = table.layout.response.width();
    let read = sim_read_fn(table.name());
    let write = sim_write_fn(table.name());

    b.line("`ifndef SVDPI");
    b.line(format!(
        "import \"BDPI\" function ActionValue#(Bit#({})) {}(Bit#({}) msgtype);",
        rw, read, kw
    ));
    b.line(format!(
        "import \"BDPI\" function Action {}(Bit#({}) msgtype, Bit#({}) data);",
        write, kw, rw
    ));
    b.line("`endif");

    b.block(
        format!("instance MatchTableSim#({}, {}, {});", id, kw, rw),
        "endinstance",
        |b| {
            b.line(format!(
                "function ActionValue#(Bit#({})) matchtable_read(Bit#({}) id, \
                 Bit#({}) key);",
                rw, id, kw
            ));
            b.block("actionvalue", "endactionvalue", |b| {
                b.line(format!("let v <- {}(key);", read));
                b.line("return v;");
            });
            b.line("endfunction");
            b.line(format!(
                "function Action matchtable_write(Bit#({}) id, Bit#({}) key, \
                 Bit#({}) data);",
                id, kw, rw
            ));
            b.block("action", "endaction", |b| {
                b.line(format!("{}(key, data);", write));
            });
            b.line("endfunction");
        },
    );
}
