// Copyright 2024 Oxide Computer Company

use p4_cg::layout::ACTION_TAG_FIELD;
use p4_cg::naming::camel_case;
use p4_cg::LoweredTable;
use slog::{trace, Logger};

use crate::arbiter::emit_arbiter;
use crate::builder::BsvBuilder;
use crate::types::{action_enum_members, request_fields};
use crate::Names;

pub(crate) struct TableGenerator<'a> {
    table: &'a LoweredTable,
    names: Names,
    log: &'a Logger,
}

impl<'a> TableGenerator<'a> {
    pub(crate) fn new(table: &'a LoweredTable, log: &'a Logger) -> Self {
        Self {
            table,
            names: Names::new(table),
            log,
        }
    }

    fn action_count(&self) -> usize {
        self.table.layout.action_count
    }

    fn match_table_type(&self) -> String {
        format!(
            "MatchTable#({}, {}, SizeOf#({}), SizeOf#({}))",
            self.table.descriptor.id(),
            self.table.descriptor.capacity(),
            self.names.req(),
            self.names.rsp(),
        )
    }

    fn engine_module(&self) -> String {
        format!(
            "mkMatchTable_{}_{}",
            self.table.descriptor.capacity(),
            self.names.ty
        )
    }

    pub(crate) fn generate(&self, b: &mut BsvBuilder) {
        trace!(self.log, "emit module"; "table" => self.table.name());
        self.emit_engine(b);
        self.emit_interface(b);
        b.line("(* synthesize *)");
        b.block(
            format!("module mk{} (Control::{});", self.names.ty, self.names.ty),
            "endmodule",
            |b| {
                self.emit_state(b);
                emit_arbiter(b, self.action_count());
                self.emit_handle_request(b);
                self.emit_execute(b);
                self.emit_handle_response(b);
                self.emit_control_flow(b);
                self.emit_add_entry(b);
                self.emit_set_verbosity(b);
            },
        );
    }

    fn emit_engine(&self, b: &mut BsvBuilder) {
        let ty = self.match_table_type();
        b.line("(* synthesize *)");
        b.block(
            format!("module {}({});", self.engine_module(), ty),
            "endmodule",
            |b| {
                b.line("(* hide *)");
                b.line(format!(
                    "{} ifc <- mkMatchTable(\"{}\");",
                    ty,
                    self.table.name()
                ));
                b.line("return ifc;");
            },
        );
    }

    fn emit_interface(&self, b: &mut BsvBuilder) {
        let n = &self.names;
        b.line(format!(
            "// =============== table {} ==============",
            self.table.name()
        ));
        b.block(format!("interface {};", n.ty), "endinterface", |b| {
            b.line(
                "interface Server#(MetadataRequest, MetadataResponse) \
                 prev_control_state;",
            );
            for i in 0..self.action_count() {
                b.line(format!(
                    "interface Client#({}, {}) next_control_state_{};",
                    n.action_req(),
                    n.action_rsp(),
                    i
                ));
            }
            b.line(format!(
                "method Action add_entry(ConnectalTypes::{} key, \
                 ConnectalTypes::{} value);",
                n.req(),
                n.rsp()
            ));
            b.line("method Action set_verbosity(int verbosity);");
        });
    }

    fn emit_state(&self, b: &mut BsvBuilder) {
        let n = &self.names;
        let count = self.action_count();

        b.line("Reg#(int) cf_verbosity <- mkConfigRegU;");
        b.block(
            "function Action dbprint(Integer level, Fmt msg);",
            "endfunction",
            |b| {
                b.block("action", "endaction", |b| {
                    b.block(
                        "if (cf_verbosity > fromInteger(level)) begin",
                        "end",
                        |b| {
                            b.line("$display(\"(%0d) \", $time, msg);");
                        },
                    );
                });
            },
        );

        b.line("RX #(MetadataRequest) rx_metadata <- mkRX;");
        b.line("TX #(MetadataResponse) tx_metadata <- mkTX;");
        b.line("let rx_info_metadata = rx_metadata.u;");
        b.line("let tx_info_metadata = tx_metadata.u;");
        b.line(format!(
            "Vector#({}, FIFOF#({})) bbReqFifo <- replicateM(mkFIFOF);",
            count,
            n.action_req()
        ));
        b.line(format!(
            "Vector#({}, FIFOF#({})) bbRspFifo <- replicateM(mkFIFOF);",
            count,
            n.action_rsp()
        ));
        b.line(
            "Vector#(2, FIFOF#(PacketInstance)) packet_ff <- \
             replicateM(mkFIFOF);",
        );
        b.line(
            "Vector#(2, FIFOF#(MetadataT)) metadata_ff <- replicateM(mkFIFOF);",
        );
        b.line(format!(
            "{} matchTable <- {};",
            self.match_table_type(),
            self.engine_module()
        ));
    }

    fn emit_handle_request(&self, b: &mut BsvBuilder) {
        let n = &self.names;
        b.block("rule rl_handle_request;", "endrule", |b| {
            b.line("let data = rx_info_metadata.first;");
            b.line("rx_info_metadata.deq;");
            b.line("let meta = data.meta;");
            b.line("let pkt = data.pkt;");
            for k in self.table.descriptor.key_fields() {
                b.line(format!(
                    "let {} = fromMaybe(?, meta.{});",
                    k.name, k.name
                ));
            }
            b.line(format!(
                "{} req = {}{{{}}};",
                n.req(),
                n.req(),
                request_fields(self.table, |f| f.to_owned())
            ));
            b.line("matchTable.lookupPort.request.put(pack(req));");
            b.line("packet_ff[0].enq(pkt);");
            b.line("metadata_ff[0].enq(meta);");
            b.line(format!(
                "dbprint(3, $format(\"{} lookup \", fshow(req)));",
                self.table.name()
            ));
        });
    }

    fn emit_execute(&self, b: &mut BsvBuilder) {
        let n = &self.names;
        let members = action_enum_members(self.table);
        b.block("rule rl_execute;", "endrule", |b| {
            b.line("let rsp <- matchTable.lookupPort.response.get;");
            b.line("let pkt <- toGet(packet_ff[0]).get;");
            b.line("let meta <- toGet(metadata_ff[0]).get;");
            // a miss unpacks as the all-zero response, the default action
            b.line(format!("{} resp = unpack(fromMaybe(0, rsp));", n.rsp()));
            b.line(format!(
                "dbprint(3, $format(\"{} execute \", fshow(resp.{})));",
                self.table.name(),
                ACTION_TAG_FIELD
            ));
            b.block(
                format!("case (resp.{}) matches", ACTION_TAG_FIELD),
                "endcase",
                |b| {
                    for (i, action) in
                        self.table.descriptor.actions().iter().enumerate()
                    {
                        let mut fields = String::from("pkt: pkt, meta: meta");
                        for p in &action.parameters {
                            fields.push_str(&format!(
                                ", {}: resp.{}",
                                p.name, p.name
                            ));
                        }
                        b.block(format!("{}: begin", members[i]), "end", |b| {
                            b.line(format!(
                                "{} req = tagged {}ReqT {{{}}};",
                                n.action_req(),
                                camel_case(&action.name),
                                fields
                            ));
                            b.line(format!("bbReqFifo[{}].enq(req);", i));
                        });
                    }
                },
            );
        });
    }

    fn emit_handle_response(&self, b: &mut BsvBuilder) {
        b.block(
            "rule rl_handle_response (interruptStatus);",
            "endrule",
            |b| {
                b.line("let v <- toGet(bbRspFifo[readyChannel]).get;");
                b.block("case (v) matches", "endcase", |b| {
                    for action in self.table.descriptor.actions() {
                        b.block(
                            format!(
                                "tagged {}RspT {{pkt: .pkt, meta: .meta}}: begin",
                                camel_case(&action.name)
                            ),
                            "end",
                            |b| {
                                b.line(
                                    "MetadataResponse rsp = tagged \
                                     MetadataResponse {pkt: pkt, meta: meta};",
                                );
                                b.line("tx_info_metadata.enq(rsp);");
                            },
                        );
                    }
                });
            },
        );
    }

    fn emit_control_flow(&self, b: &mut BsvBuilder) {
        b.line(
            "interface prev_control_state = \
             toServer(rx_metadata.e, tx_metadata.e);",
        );
        for i in 0..self.action_count() {
            b.line(format!(
                "interface next_control_state_{} = \
                 toClient(bbReqFifo[{}], bbRspFifo[{}]);",
                i, i, i
            ));
        }
    }

    fn emit_add_entry(&self, b: &mut BsvBuilder) {
        let n = &self.names;
        let mut value = format!(
            "{}: unpack(v.{})",
            ACTION_TAG_FIELD, ACTION_TAG_FIELD
        );
        for p in &self.table.layout.response.parameters {
            value.push_str(&format!(", {}: v.{}", p.name, p.name));
        }
        b.block(
            format!(
                "method Action add_entry(ConnectalTypes::{} k, \
                 ConnectalTypes::{} v);",
                n.req(),
                n.rsp()
            ),
            "endmethod",
            |b| {
                b.line(format!(
                    "let key = {}{{{}}};",
                    n.req(),
                    request_fields(self.table, |f| format!("k.{}", f))
                ));
                b.line(format!("let value = {}{{{}}};", n.rsp(), value));
                b.line(
                    "matchTable.add_entry.put(tuple2(pack(key), pack(value)));",
                );
            },
        );
    }

    fn emit_set_verbosity(&self, b: &mut BsvBuilder) {
        b.block(
            "method Action set_verbosity(int verbosity);",
            "endmethod",
            |b| {
                b.line("cf_verbosity <= verbosity;");
            },
        );
    }
}
