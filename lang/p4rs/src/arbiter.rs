// Copyright 2024 Oxide Computer Company

/// Fixed priority selection of one ready response channel.
///
/// Channels are scanned from the highest index down and every ready channel
/// overwrites the selection, so the lowest ready index wins. When nothing is
/// ready the selection is `ready.len()`.
pub fn select(ready: &[bool]) -> usize {
    let mut selected = ready.len();
    for i in (0..ready.len()).rev() {
        if ready[i] {
            selected = i;
        }
    }
    selected
}
