// Copyright 2024 Oxide Computer Company

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::{Mutex, MutexGuard};

use bitvec::prelude::*;

use crate::bits::{self, Bits};
use crate::error::WidthError;

/// Software stand-in for a hardware lookup engine. Maps packed request bit
/// strings to packed response bit strings. A lookup that misses returns the
/// all-zero response.
#[derive(Debug)]
pub struct MatchTableSim {
    key_width: usize,
    response_width: usize,
    entries: BTreeMap<Bits, Bits>,
}

impl MatchTableSim {
    pub const fn new(key_width: usize, response_width: usize) -> Self {
        Self {
            key_width,
            response_width,
            entries: BTreeMap::new(),
        }
    }

    pub fn key_width(&self) -> usize {
        self.key_width
    }

    pub fn response_width(&self) -> usize {
        self.response_width
    }

    fn check(
        width: usize,
        bits: &BitSlice<u8, Msb0>,
    ) -> Result<(), WidthError> {
        if bits.len() != width {
            return Err(WidthError {
                expected: width,
                actual: bits.len(),
            });
        }
        Ok(())
    }

    pub fn read(&self, key: &BitSlice<u8, Msb0>) -> Result<Bits, WidthError> {
        Self::check(self.key_width, key)?;
        Ok(self
            .entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| bits::zeros(self.response_width)))
    }

    /// Insert or overwrite the response for `key`.
    pub fn write(
        &mut self,
        key: Bits,
        response: Bits,
    ) -> Result<(), WidthError> {
        Self::check(self.key_width, &key)?;
        Self::check(self.response_width, &response)?;
        self.entries.insert(key, response);
        Ok(())
    }

    pub fn remove(&mut self, key: &BitSlice<u8, Msb0>) -> Option<Bits> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Bits, &Bits)> {
        self.entries.iter()
    }

    pub fn dump(&self) -> String {
        let mut s = String::new();
        for (k, v) in &self.entries {
            let _ = writeln!(s, "{} -> {}", bits::dump(k), bits::dump(v));
        }
        s
    }
}

/// A [`MatchTableSim`] that can live in a `static` and be driven from the
/// simulator's foreign function entry points.
#[derive(Debug)]
pub struct SharedMatchTable {
    inner: Mutex<MatchTableSim>,
}

impl SharedMatchTable {
    pub const fn new(key_width: usize, response_width: usize) -> Self {
        Self {
            inner: Mutex::new(MatchTableSim::new(key_width, response_width)),
        }
    }

    /// Lock the table. A panic in another simulator thread does not leave
    /// the map in a torn state, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, MatchTableSim> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn read(&self, key: &BitSlice<u8, Msb0>) -> Result<Bits, WidthError> {
        self.lock().read(key)
    }

    pub fn write(&self, key: Bits, response: Bits) -> Result<(), WidthError> {
        self.lock().write(key, response)
    }

    pub fn clear(&self) {
        self.lock().clear()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Read with request and response of at most 64 bits.
    pub fn read_u64(&self, key: u64) -> u64 {
        let table = self.lock();
        let key = bits::from_u64(key, table.key_width);
        match table.read(&key) {
            Ok(rsp) => bits::to_u64(&rsp),
            Err(_) => 0,
        }
    }

    /// Write with request and response of at most 64 bits.
    pub fn write_u64(&self, key: u64, response: u64) {
        let mut table = self.lock();
        let key = bits::from_u64(key, table.key_width);
        let response = bits::from_u64(response, table.response_width);
        let _ = table.write(key, response);
    }

    /// Read with request and response passed as Bluesim word arrays.
    pub fn read_words(&self, key: &[u32], response: &mut [u32]) {
        let table = self.lock();
        let key = bits::from_words(key, table.key_width);
        match table.read(&key) {
            Ok(rsp) => bits::to_words(&rsp, response),
            Err(_) => response.iter_mut().for_each(|w| *w = 0),
        }
    }

    pub fn write_words(&self, key: &[u32], response: &[u32]) {
        let mut table = self.lock();
        let key = bits::from_words(key, table.key_width);
        let response = bits::from_words(response, table.response_width);
        let _ = table.write(key, response);
    }
}
