// Copyright 2022 Oxide Computer Company

use p4_bsv::{arbiter::emit_arbiter, BsvBuilder};
use p4rs::arbiter::select;
use rand::Rng;

#[test]
fn lowest_ready_channel() {
    let mut ready = [false; 5];
    for i in [1, 3, 4] {
        ready[i] = true;
    }
    assert_eq!(select(&ready), 1);
    assert_eq!(select(&[false; 5]), 5);
}

#[test]
fn sentinel_matches_hardware() {
    for n in 1..=8usize {
        let mut b = BsvBuilder::new();
        emit_arbiter(&mut b, n);
        let text = b.finish();
        let sentinel = format!("readyChannel = {};", n);
        assert!(text.contains(&sentinel), "{}", text);
        assert_eq!(select(&vec![false; n]), n);
    }
}

#[test]
fn random_ready_vectors() {
    let mut rng = rand::rng();
    for _ in 0..1000 {
        let n = rng.random_range(1..=32);
        let ready: Vec<bool> = (0..n).map(|_| rng.random_bool(0.2)).collect();
        let expected = ready.iter().position(|r| *r).unwrap_or(n);
        assert_eq!(select(&ready), expected, "{:?}", ready);
    }
}
