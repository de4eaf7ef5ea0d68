//! Virtual holding registers: scratch words shared between protocol clients.
//!
//! No hardware backing and no persistence; every cell is zero at start.

use heapless::Vec;

use crate::config::MAX_HOLDING_REGISTERS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualRegisters {
    cells: Vec<u16, MAX_HOLDING_REGISTERS>,
}

impl VirtualRegisters {
    /// `count` is clamped to [`MAX_HOLDING_REGISTERS`].
    pub fn new(count: usize) -> Self {
        let mut cells = Vec::new();
        let _ = cells.resize(count.min(MAX_HOLDING_REGISTERS), 0);
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Out-of-range reads return 0; the bridge validates first.
    pub fn read(&self, index: usize) -> u16 {
        self.cells.get(index).copied().unwrap_or(0)
    }

    /// Out-of-range writes are ignored; the bridge validates first.
    pub fn write(&mut self, index: usize, value: u16) {
        if let Some(cell) = self.cells.get_mut(index) {
            *cell = value;
        }
    }

    /// Commit a run of words starting at `start`, all or nothing.
    ///
    /// Returns `false` without touching any cell if the run does not fit.
    pub fn write_block(&mut self, start: usize, words: &[u16]) -> bool {
        match start
            .checked_add(words.len())
            .and_then(|end| self.cells.get_mut(start..end))
        {
            Some(dst) => {
                dst.copy_from_slice(words);
                true
            }
            None => false,
        }
    }
}
