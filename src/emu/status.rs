//
// status.rs --- Status register.
//
// Copyright (C) 2016, James Bielman <jamesjb@gmail.com>
// All Rights Reserved.
//
// Released under the "BSD3" license. See the file "LICENSE"
// for details.
//

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// The 8-bit status register. Only the low six bits are used.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// Global interrupt enable.
        const I = 0b00100000;
        /// Signed result, always `N ^ V`.
        const S = 0b00010000;
        const N = 0b00001000;
        const Z = 0b00000100;
        const V = 0b00000010;
        const C = 0b00000001;
    }
}

impl Status {
    /// The flags written by every ALU operation.
    pub const ARITH: Status = Status::S
        .union(Status::N)
        .union(Status::Z)
        .union(Status::V)
        .union(Status::C);

    pub fn interrupts_enabled(&self) -> bool {
        self.contains(Status::I)
    }

    pub fn signed(&self) -> bool {
        self.contains(Status::S)
    }

    pub fn negative(&self) -> bool {
        self.contains(Status::N)
    }

    pub fn zero(&self) -> bool {
        self.contains(Status::Z)
    }

    pub fn overflow(&self) -> bool {
        self.contains(Status::V)
    }

    pub fn carry(&self) -> bool {
        self.contains(Status::C)
    }

    pub fn set_interrupts_enabled(&mut self, on: bool) {
        self.set(Status::I, on);
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}{}{}{}{}",
               if self.contains(Status::I) { "I" } else { "" },
               if self.contains(Status::S) { "S" } else { "" },
               if self.contains(Status::N) { "N" } else { "" },
               if self.contains(Status::Z) { "Z" } else { "" },
               if self.contains(Status::V) { "V" } else { "" },
               if self.contains(Status::C) { "C" } else { "" })
    }
}
