// Copyright 2022 Oxide Computer Company

use p4rs::bits;

p4_macro::use_tables!("programs/port.json");

#[test]
fn shape_follows_layout() {
    let shape = &PORT_TBL_SHAPE;
    assert_eq!(shape.id, 1);
    assert_eq!(shape.capacity, 256);
    assert_eq!(shape.key_width(), 16);
    assert_eq!(shape.padding, 2);
    assert_eq!(shape.request_width(), 18);
    assert_eq!(shape.tag_width, 2);
    assert_eq!(shape.response_width(), 10);
    assert_eq!(shape.default_action, Some("default"));

    let actions: Vec<&str> = shape.actions.iter().map(|a| a.name).collect();
    assert_eq!(actions, vec!["default", "forward", "drop"]);
}

#[test]
fn forward_round_trip() -> anyhow::Result<()> {
    let shape = &PORT_TBL_SHAPE;
    let key = shape.encode_request(&[80, 443])?;
    let rsp = shape.encode_response("forward", &[5])?;

    matchtable_write_portTbl(bits::to_u64(&key), bits::to_u64(&rsp));
    let read = matchtable_read_portTbl(bits::to_u64(&key));
    assert_eq!(read, bits::to_u64(&rsp));

    let call = shape
        .decode_response(&bits::from_u64(read, shape.response_width()))?;
    assert_eq!(call.action, "forward");
    assert_eq!(call.tag, 1);
    assert_eq!(call.argument("port"), Some(5));

    // only the low 8 bits of 443 are part of the key
    let same = shape.encode_request(&[80, 443 & 0xff])?;
    assert_eq!(same, key);
    assert_eq!(matchtable_read_portTbl(bits::to_u64(&same)), read);
    Ok(())
}

#[test]
fn miss_selects_default_action() -> anyhow::Result<()> {
    let shape = &PORT_TBL_SHAPE;
    let key = shape.encode_request(&[1, 2])?;
    let read = matchtable_read_portTbl(bits::to_u64(&key));
    assert_eq!(read, 0);

    let call = shape
        .decode_response(&bits::from_u64(read, shape.response_width()))?;
    assert_eq!(call.action, "default");
    assert!(call.arguments.is_empty());
    Ok(())
}

#[test]
fn overwrite_replaces_entry() -> anyhow::Result<()> {
    let shape = &PORT_TBL_SHAPE;
    let key = shape.encode_request(&[22, 22])?;
    let forward = shape.encode_response("forward", &[9])?;
    let drop = shape.encode_response("drop", &[])?;

    PORT_TBL_MATCHTABLE.write(key.clone(), forward)?;
    matchtable_write_portTbl(bits::to_u64(&key), bits::to_u64(&drop));

    let read = PORT_TBL_MATCHTABLE.read(&key)?;
    assert_eq!(shape.decode_response(&read)?.action, "drop");
    Ok(())
}

#[test]
fn registry_lists_table() {
    assert_eq!(MATCH_TABLES.len(), 1);
    let (shape, store) = MATCH_TABLES[0];
    assert_eq!(shape.name, "port_tbl");
    assert!(std::ptr::eq(store, &PORT_TBL_MATCHTABLE));
}
