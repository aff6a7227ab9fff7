// Copyright 2024 Oxide Computer Company

//! Packing of field values into the bit strings stored by match tables.
//!
//! Bit strings are `BitVec<u8, Msb0>` with the first field in the most
//! significant bits, the same order Bluespec `pack` uses for a struct. Field
//! values are carried as `u128`; a value is masked to its field width, and
//! fields wider than 128 bits get zeros in their upper bits.

use bitvec::prelude::*;
use num::bigint::BigUint;

use crate::error::WidthError;

pub type Bits = BitVec<u8, Msb0>;

/// Number of 32 bit words Bluesim uses to pass a value of `width` bits.
pub fn words(width: usize) -> usize {
    width.div_ceil(32)
}

pub fn zeros(width: usize) -> Bits {
    bitvec![u8, Msb0; 0; width]
}

fn push_value(bv: &mut Bits, value: u128, width: usize) {
    for i in (0..width).rev() {
        bv.push(i < 128 && (value >> i) & 1 == 1);
    }
}

/// Pack `(value, width)` pairs, first pair in the most significant bits.
pub fn pack(fields: &[(u128, usize)]) -> Bits {
    let width = fields.iter().map(|(_, w)| w).sum();
    let mut bv = Bits::with_capacity(width);
    for (value, w) in fields {
        push_value(&mut bv, *value, *w);
    }
    bv
}

/// Split a packed bit string back into field values.
pub fn unpack(
    bits: &BitSlice<u8, Msb0>,
    widths: &[usize],
) -> Result<Vec<u128>, WidthError> {
    let expected = widths.iter().sum();
    if bits.len() != expected {
        return Err(WidthError {
            expected,
            actual: bits.len(),
        });
    }
    let mut values = Vec::with_capacity(widths.len());
    let mut offset = 0;
    for w in widths {
        values.push(to_u128(&bits[offset..offset + w]));
        offset += w;
    }
    Ok(values)
}

/// The low 128 bits of a bit string as an integer.
pub fn to_u128(bits: &BitSlice<u8, Msb0>) -> u128 {
    let skip = bits.len().saturating_sub(128);
    bits[skip..]
        .iter()
        .by_vals()
        .fold(0u128, |acc, b| (acc << 1) | b as u128)
}

pub fn from_u64(value: u64, width: usize) -> Bits {
    pack(&[(value as u128, width)])
}

pub fn to_u64(bits: &BitSlice<u8, Msb0>) -> u64 {
    to_u128(bits) as u64
}

/// Build a bit string from Bluesim words, least significant word first.
pub fn from_words(words: &[u32], width: usize) -> Bits {
    let mut bv = zeros(width);
    for i in 0..width {
        let word = words.get(i / 32).copied().unwrap_or(0);
        bv.set(width - 1 - i, (word >> (i % 32)) & 1 == 1);
    }
    bv
}

/// Store a bit string into Bluesim words, least significant word first.
/// Words past the end of the value are cleared.
pub fn to_words(bits: &BitSlice<u8, Msb0>, out: &mut [u32]) {
    out.iter_mut().for_each(|w| *w = 0);
    let width = bits.len();
    for i in 0..width {
        if bits[width - 1 - i] {
            if let Some(word) = out.get_mut(i / 32) {
                *word |= 1 << (i % 32);
            }
        }
    }
}

pub fn to_biguint(bits: &BitSlice<u8, Msb0>) -> BigUint {
    let mut u = BigUint::default();
    for b in bits.iter().by_vals() {
        u = (u << 1u8) + BigUint::from(b as u8);
    }
    u
}

/// Hex rendering used in logs and table dumps.
pub fn dump(bits: &BitSlice<u8, Msb0>) -> String {
    if bits.is_empty() {
        return "∅".into();
    }
    format!("{}'h{:x}", bits.len(), to_biguint(bits))
}
