// Copyright 2022 Oxide Computer Company

use p4rs::bits;

p4_macro::use_tables! {
    program = "programs/flow.json",
    alignment = 12,
}

const KEY_WORDS: usize = 5;
const RSP_WORDS: usize = 4;

fn key_words(src: u128, dst: u128) -> anyhow::Result<[u32; KEY_WORDS]> {
    let key = FLOW_TBL_SHAPE.encode_request(&[src, dst])?;
    let mut words = [0u32; KEY_WORDS];
    bits::to_words(&key, &mut words);
    Ok(words)
}

#[test]
fn settings_reach_layout() {
    let shape = &FLOW_TBL_SHAPE;
    assert_eq!(shape.id, 2);
    assert_eq!(shape.capacity, 4096);
    assert_eq!(shape.key_width(), 128);
    assert_eq!(shape.padding, 4);
    assert_eq!(shape.request_width(), 132);
    assert_eq!(shape.tag_width, 1);
    assert_eq!(shape.response_width(), 97);
    assert_eq!(bits::words(shape.request_width()), KEY_WORDS);
    assert_eq!(bits::words(shape.response_width()), RSP_WORDS);
}

#[test]
fn wide_round_trip() -> anyhow::Result<()> {
    let shape = &FLOW_TBL_SHAPE;
    let key = key_words(0x0123_4567_89ab_cdef, 0xfedc_ba98_7654_3210)?;
    let tag = (1u128 << 95) | 0xdead_beef;
    let rsp = shape.encode_response("label", &[tag])?;
    let mut data = [0u32; RSP_WORDS];
    bits::to_words(&rsp, &mut data);

    let mut out = [0u32; RSP_WORDS];
    unsafe {
        matchtable_write_flowTbl(key.as_ptr(), data.as_ptr());
        matchtable_read_flowTbl(out.as_mut_ptr(), key.as_ptr());
    }
    assert_eq!(out, data);
    // the action tag is the most significant response bit
    assert_eq!(out[3], 1);

    let call = shape
        .decode_response(&bits::from_words(&out, shape.response_width()))?;
    assert_eq!(call.action, "label");
    assert_eq!(call.argument("tag"), Some(tag));
    Ok(())
}

#[test]
fn wide_miss() -> anyhow::Result<()> {
    let shape = &FLOW_TBL_SHAPE;
    let key = key_words(7, 7)?;
    let mut out = [0xffff_ffffu32; RSP_WORDS];
    unsafe { matchtable_read_flowTbl(out.as_mut_ptr(), key.as_ptr()) };
    assert_eq!(out, [0; RSP_WORDS]);

    let call = shape
        .decode_response(&bits::from_words(&out, shape.response_width()))?;
    assert_eq!(call.action, "pass");
    Ok(())
}
