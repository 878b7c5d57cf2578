//
// error.rs --- Emulator error type.
//
// Copyright (C) 2016, James Bielman <jamesjb@gmail.com>
// All Rights Reserved.
//
// Released under the "BSD3" license. See the file "LICENSE"
// for details.
//

use std::io;
use std::num;
use std::result;

use thiserror::Error;

use super::program::Opcode;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    #[error("Invalid number: {0}")]
    Parse(#[from] num::ParseIntError),

    #[error("Invalid Intel HEX record: {0}")]
    Ihex(ihex::ReaderError),

    #[error("Address {0:#06X} is outside of data memory")]
    AddressOutOfRange(u16),

    #[error("Stack overflow")]
    StackOverflow,

    #[error("Program of {0} instructions does not fit in program memory")]
    ProgramTooLarge(usize),

    #[error("Image byte offset {0:#06X} is outside of program memory")]
    ImageOutOfRange(usize),

    #[error("Malformed symbol line: {0:?}")]
    Symbol(String),

    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Decode(#[from] DecodeError),
}

/// Reasons a packed instruction word fails to decode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Illegal instruction {0:02X}")]
    IllegalOpcode(u8),

    #[error("{opcode:?}: register operand {operand} out of range")]
    BadRegister { opcode: Opcode, operand: u8 },
}

pub type Result<T> = result::Result<T, Error>;

impl From<ihex::ReaderError> for Error {
    fn from(err: ihex::ReaderError) -> Error {
        Error::Ihex(err)
    }
}
