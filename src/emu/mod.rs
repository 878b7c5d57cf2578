//
// mod.rs --- AVR8 emulator module.
//
// Copyright (C) 2016, James Bielman <jamesjb@gmail.com>
// All Rights Reserved.
//
// Released under the "BSD3" license. See the file "LICENSE"
// for details.
//

pub mod error;
pub mod status;
pub mod alu;
pub mod stack;
pub mod mem;
pub mod io;
pub mod program;
pub mod loader;
pub mod interrupt;
pub mod cpu;

pub use self::alu::{alu, AluOp};
pub use self::cpu::{Phase, Regs, CPU};
pub use self::error::{DecodeError, Error, Result};
pub use self::io::Port;
pub use self::mem::{DataMemory, Mem};
pub use self::program::{Firmware, Instruction, Opcode, ProgramMemory};
pub use self::stack::Stack;
pub use self::status::Status;
