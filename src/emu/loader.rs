//
// loader.rs --- Firmware image loading.
//
// Copyright (C) 2016, James Bielman <jamesjb@gmail.com>
// All Rights Reserved.
//
// Released under the "BSD3" license. See the file "LICENSE"
// for details.
//

//! Loading program images and symbol tables from files.
//!
//! Intel HEX images store each instruction as three consecutive
//! bytes, opcode first, so instruction `n` starts at byte `3 * n`.
//!
//! Symbol tables are plain text, one `ADDR NAME` pair per line with
//! a hexadecimal address. Blank lines and lines starting with `#`
//! are skipped.

use std::fs;
use std::path::Path;

use ihex::{Reader, Record};

use super::error::{Error, Result};
use super::program::{Firmware, NOP_WORD, PROGRAM_SIZE};

/// Size of a program image in bytes.
const IMAGE_BYTES: usize = PROGRAM_SIZE * 3;

impl Firmware {
    /// Read an Intel HEX file into the image. Data overlays whatever
    /// the image already holds.
    pub fn load_ihex_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let text = fs::read_to_string(path)?;
        self.load_ihex(&text)
    }

    /// Read Intel HEX text into the image.
    pub fn load_ihex(&mut self, text: &str) -> Result<()> {
        let mut base = 0usize;

        for record in Reader::new(text) {
            match record? {
                Record::Data { offset, value } => {
                    let start = base + offset as usize;
                    for (i, b) in value.iter().enumerate() {
                        self.store_image_byte(start + i, *b)?;
                    }
                },
                Record::ExtendedSegmentAddress(seg) => base = (seg as usize) << 4,
                Record::ExtendedLinearAddress(hi) => base = (hi as usize) << 16,
                Record::EndOfFile => break,
                _ => (),
            }
        }

        Ok(())
    }

    /// Store one byte of the packed image at byte offset `off`.
    fn store_image_byte(&mut self, off: usize, val: u8) -> Result<()> {
        if off >= IMAGE_BYTES {
            return Err(Error::ImageOutOfRange(off));
        }

        let addr = off / 3;
        let shift = 8 * (2 - off % 3);
        let word = self.words().get(addr).copied().unwrap_or(NOP_WORD);
        let word = (word & !(0xFF << shift)) | ((val as u32) << shift);

        self.set_word(addr, word);
        Ok(())
    }

    /// Read a symbol table file.
    pub fn load_symbols_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let text = fs::read_to_string(path)?;
        self.load_symbols(&text)
    }

    /// Read symbol table text, adding each symbol to the image.
    pub fn load_symbols(&mut self, text: &str) -> Result<()> {
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let (addr, name) = match (fields.next(), fields.next(), fields.next()) {
                (Some(addr), Some(name), None) => (addr, name),
                _ => return Err(Error::Symbol(line.to_string())),
            };

            let digits = addr.trim_start_matches("0x").trim_start_matches("0X");
            let addr = usize::from_str_radix(digits, 16)?;
            if addr >= PROGRAM_SIZE {
                return Err(Error::Symbol(line.to_string()));
            }

            self.add_symbol(addr, name);
        }

        Ok(())
    }
}
