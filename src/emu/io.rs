//
// io.rs --- I/O register map.
//
// Copyright (C) 2016, James Bielman <jamesjb@gmail.com>
// All Rights Reserved.
//
// Released under the "BSD3" license. See the file "LICENSE"
// for details.
//

//! Addresses of the peripheral registers in data memory.
//!
//! Port registers are reached directly (`IN`/`OUT`). The pin-change
//! control, flag and mask registers are reached through the extended
//! region (`STS`/`LDS`), so their absolute address is the register
//! number plus `EXTENDED_OFFSET`.

/// Offset applied by `STS`, `LDS`, `ST` and `LD`.
pub const EXTENDED_OFFSET: u16 = 256;

pub const DDRB: u8 = 0x00;
pub const PORTB: u8 = 0x01;
pub const PINB: u8 = 0x02;

pub const DDRC: u8 = 0x03;
pub const PORTC: u8 = 0x04;
pub const PINC: u8 = 0x05;

pub const DDRD: u8 = 0x06;
pub const PORTD: u8 = 0x07;
pub const PIND: u8 = 0x08;

/// Pin change interrupt control register (PCIE0-2).
pub const PCICR: u8 = 0x09;
/// Pin change interrupt flag register (PCIF0-2).
pub const PCIFR: u8 = 0x0A;

pub const PCMSK0: u8 = 0x10;
pub const PCMSK1: u8 = 0x11;
pub const PCMSK2: u8 = 0x12;

pub const RESET_VECT: u8 = 0x00;
pub const PCINT0_VECT: u8 = 0x02;
pub const PCINT1_VECT: u8 = 0x04;
pub const PCINT2_VECT: u8 = 0x06;

/// Absolute data memory address of an extended-region register.
pub const fn ext(reg: u8) -> u16 {
    reg as u16 + EXTENDED_OFFSET
}

/// One of the three 8-bit I/O ports.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Port {
    B,
    C,
    D,
}

impl Port {
    pub const ALL: [Port; 3] = [Port::B, Port::C, Port::D];

    /// Data direction register.
    pub fn ddr(self) -> u16 {
        self.base() as u16
    }

    /// Output data register.
    pub fn port(self) -> u16 {
        self.base() as u16 + 1
    }

    /// Pin input register.
    pub fn pin(self) -> u16 {
        self.base() as u16 + 2
    }

    /// Pin change mask register, as an absolute address.
    pub fn pcmsk(self) -> u16 {
        match self {
            Port::B => ext(PCMSK0),
            Port::C => ext(PCMSK1),
            Port::D => ext(PCMSK2),
        }
    }

    fn base(self) -> u8 {
        match self {
            Port::B => DDRB,
            Port::C => DDRC,
            Port::D => DDRD,
        }
    }

    /// Parse a port letter (`B`, `C` or `D`, any case).
    pub fn from_letter(c: char) -> Option<Port> {
        match c.to_ascii_uppercase() {
            'B' => Some(Port::B),
            'C' => Some(Port::C),
            'D' => Some(Port::D),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_layout() {
        assert_eq!((Port::B.ddr(), Port::B.port(), Port::B.pin()), (0, 1, 2));
        assert_eq!((Port::C.ddr(), Port::C.port(), Port::C.pin()), (3, 4, 5));
        assert_eq!((Port::D.ddr(), Port::D.port(), Port::D.pin()), (6, 7, 8));
        assert_eq!(Port::D.pcmsk(), 256 + 18);
        assert_eq!(ext(PCIFR), 266);
    }

    #[test]
    fn port_letters() {
        assert_eq!(Port::from_letter('c'), Some(Port::C));
        assert_eq!(Port::from_letter('A'), None);
    }
}
