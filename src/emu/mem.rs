//
// mem.rs --- Data memory.
//
// Copyright (C) 2016, James Bielman <jamesjb@gmail.com>
// All Rights Reserved.
//
// Released under the "BSD3" license. See the file "LICENSE"
// for details.
//

use super::error::{Error, Result};

/// Number of bytes in data memory.
pub const DATA_MEMORY_SIZE: usize = 2000;

/// Operations on data memory.
///
/// Reads never fail: an address with nothing behind it reads as 0.
/// Writes to such an address fail and change nothing.
pub trait Mem {
    /// Load a byte from `addr` and return it.
    fn loadb(&self, addr: u16) -> u8;

    /// Store a byte at `addr`.
    fn storeb(&mut self, addr: u16, val: u8) -> Result<()>;

    /// Zero the entire memory.
    fn clear(&mut self);

    /// Return bit `bit` of the byte at `addr`.
    fn bit(&self, addr: u16, bit: u8) -> bool {
        self.loadb(addr) & (1 << bit) != 0
    }

    /// Set bit `bit` of the byte at `addr`.
    fn set_bit(&mut self, addr: u16, bit: u8) -> Result<()> {
        let val = self.loadb(addr);
        self.storeb(addr, val | (1 << bit))
    }

    /// Clear bit `bit` of the byte at `addr`.
    fn clear_bit(&mut self, addr: u16, bit: u8) -> Result<()> {
        let val = self.loadb(addr);
        self.storeb(addr, val & !(1 << bit))
    }

    /// Store an array of bytes starting at `addr`. Useful for tests.
    fn store(&mut self, mut addr: u16, bytes: &[u8]) -> Result<()> {
        for x in bytes.iter() {
            self.storeb(addr, *x)?;
            addr = addr.wrapping_add(1);
        }
        Ok(())
    }

    /// Read an array of bytes starting at `addr`. Useful for tests.
    fn load(&self, mut addr: u16, bytes: &mut [u8]) {
        for x in bytes.iter_mut() {
            *x = self.loadb(addr);
            addr = addr.wrapping_add(1);
        }
    }
}

/// The processor's data memory. Addresses 0-255 hold the I/O
/// registers, the rest is general storage; the split is only a
/// convention of the instructions that address it.
pub struct DataMemory {
    pub contents: Vec<u8>
}

impl DataMemory {
    /// Create a zeroed data memory of `DATA_MEMORY_SIZE` bytes.
    pub fn new() -> DataMemory {
        DataMemory::with_size(DATA_MEMORY_SIZE)
    }

    /// Create a zeroed data memory containing `size` bytes.
    pub fn with_size(size: usize) -> DataMemory {
        assert!(size <= 0x10000);
        DataMemory {
            contents: vec![0u8; size]
        }
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

impl Default for DataMemory {
    fn default() -> DataMemory {
        DataMemory::new()
    }
}

impl Mem for DataMemory {
    fn loadb(&self, addr: u16) -> u8 {
        self.contents.get(addr as usize).copied().unwrap_or(0)
    }

    fn storeb(&mut self, addr: u16, val: u8) -> Result<()> {
        match self.contents.get_mut(addr as usize) {
            Some(x) => {
                *x = val;
                Ok(())
            },
            None => Err(Error::AddressOutOfRange(addr)),
        }
    }

    fn clear(&mut self) {
        self.contents.iter_mut().for_each(|x| *x = 0);
    }
}
