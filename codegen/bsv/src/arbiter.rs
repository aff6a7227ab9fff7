// Copyright 2024 Oxide Computer Company

use p4_cg::layout::bits_for_value;

use crate::builder::BsvBuilder;

/// Fixed priority multiplexer over the `n` action response channels.
///
/// The scan runs from the highest channel down so the lowest ready channel
/// is the last assignment and wins. With nothing ready `readyChannel` holds
/// the sentinel `n` and `interruptStatus` stays false, which keeps
/// `rl_handle_response` from firing.
pub fn emit_arbiter(b: &mut BsvBuilder, n: usize) {
    b.line(format!(
        "Vector#({}, Bool) readyBits = map(fifoNotEmpty, bbRspFifo);",
        n
    ));
    b.line("Bool interruptStatus = False;");
    b.line(format!(
        "UInt#({}) readyChannel = {};",
        bits_for_value(n),
        n
    ));
    b.block(
        format!("for (Integer i={}; i>=0; i=i-1) begin", n.saturating_sub(1)),
        "end",
        |b| {
            b.block("if (readyBits[i]) begin", "end", |b| {
                b.line("interruptStatus = True;");
                b.line("readyChannel = fromInteger(i);");
            });
        },
    );
}
