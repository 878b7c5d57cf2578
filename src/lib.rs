//
// lib.rs --- AVR8 core library.
//
// Copyright (C) 2016, James Bielman <jamesjb@gmail.com>
// All Rights Reserved.
//
// Released under the "BSD3" license. See the file "LICENSE"
// for details.
//

//! Emulator of a small AVR-flavoured 8-bit processor.
//!
//! The processor runs 24-bit instructions out of a 256-word program
//! memory, has 32 general purpose registers, a 2000 byte data memory
//! whose low 256 bytes hold the I/O registers, a separate 1 kB stack
//! and three pin-change interrupt sources.
//!
//! ```
//! use avr8::emu::{CPU, DataMemory, Firmware, Opcode};
//!
//! let mut fw = Firmware::new();
//! fw.emit(Opcode::Ldi, 16, 5)
//!   .emit(Opcode::Ldi, 17, 3)
//!   .emit(Opcode::Sub, 16, 17);
//!
//! let mut cpu = CPU::new(DataMemory::new(), fw).unwrap();
//! cpu.step_n(3);
//! assert_eq!(cpu.regs.r(16), 2);
//! ```

#[macro_use]
extern crate log;

pub mod emu;
