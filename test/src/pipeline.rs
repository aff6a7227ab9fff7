// Copyright 2022 Oxide Computer Company

use std::collections::HashMap;

use p4rs::pipeline::{Request, TablePipeline};

use crate::port_table::{PORT_TBL_MATCHTABLE, PORT_TBL_SHAPE};
use crate::test_logger;

#[test]
fn generated_table_drives_pipeline() -> anyhow::Result<()> {
    let shape = &PORT_TBL_SHAPE;
    for (dst, action, args) in
        [(20u128, "forward", vec![7u128]), (21, "drop", vec![])]
    {
        PORT_TBL_MATCHTABLE.write(
            shape.encode_request(&[10, dst])?,
            shape.encode_response(action, &args)?,
        )?;
    }

    let mut p =
        TablePipeline::new(shape, &PORT_TBL_MATCHTABLE, 2, test_logger());
    for (packet, dst) in [(1u64, 20u128), (2, 21), (3, 22), (4, 20)] {
        p.submit(Request {
            packet,
            key: vec![10, dst],
        })?;
    }
    let done = p.run(64);
    assert!(p.is_idle());
    assert_eq!(p.dropped(), 0);
    assert_eq!(done.len(), 4);

    let by_packet: HashMap<u64, _> =
        done.iter().map(|c| (c.packet, c)).collect();
    assert_eq!(by_packet[&1].call.action, "forward");
    assert_eq!(by_packet[&1].call.argument("port"), Some(7));
    assert_eq!(by_packet[&1].channel, 1);
    assert_eq!(by_packet[&2].call.action, "drop");
    assert_eq!(by_packet[&2].channel, 2);
    assert_eq!(by_packet[&3].call.action, "default");
    assert_eq!(by_packet[&3].channel, 0);
    assert_eq!(by_packet[&4].call.argument("port"), Some(7));

    // lookups on one channel complete in order
    let forwards: Vec<u64> = done
        .iter()
        .filter(|c| c.call.action == "forward")
        .map(|c| c.packet)
        .collect();
    assert_eq!(forwards, vec![1, 4]);
    Ok(())
}

#[test]
fn malformed_request_rejected() {
    let mut p = TablePipeline::new(
        &PORT_TBL_SHAPE,
        &PORT_TBL_MATCHTABLE,
        2,
        test_logger(),
    );
    assert!(p
        .submit(Request {
            packet: 9,
            key: vec![1],
        })
        .is_err());
    assert!(p.is_idle());
}
