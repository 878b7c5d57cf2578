//
// interrupt.rs --- Pin change interrupt controller.
//
// Copyright (C) 2016, James Bielman <jamesjb@gmail.com>
// All Rights Reserved.
//
// Released under the "BSD3" license. See the file "LICENSE"
// for details.
//

//! Three pin change interrupt sources, one per I/O port.
//!
//! Every clock tick each source compares its pin register against the
//! value seen on the previous tick. A change on any pin enabled in the
//! source's mask register latches the source's bit in PCIFR. A latched
//! source is serviced once the I flag and its PCICR enable bit are both
//! set; sources are considered in order 0, 1, 2 and at most one is
//! serviced per instruction.

use super::io::{self, Port};
use super::mem::Mem;
use super::status::Status;

/// A pin change interrupt source.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PinChangeSource {
    /// Source number; also its bit in PCICR and PCIFR.
    pub index: u8,
    /// The port whose pins are watched.
    pub port: Port,
    /// Program address jumped to when the source is serviced.
    pub vector: u8,
}

/// All sources, in priority order.
pub const SOURCES: [PinChangeSource; 3] = [
    PinChangeSource { index: 0, port: Port::B, vector: io::PCINT0_VECT },
    PinChangeSource { index: 1, port: Port::C, vector: io::PCINT1_VECT },
    PinChangeSource { index: 2, port: Port::D, vector: io::PCINT2_VECT },
];

/// The pin samples from the previous tick, one per source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PinChangeMonitor {
    previous: [u8; 3],
}

impl PinChangeMonitor {
    pub fn new() -> PinChangeMonitor {
        PinChangeMonitor::default()
    }

    pub fn reset(&mut self) {
        self.previous = [0; 3];
    }

    /// The previous sample of `source`'s pins.
    pub fn previous(&self, source: &PinChangeSource) -> u8 {
        self.previous[source.index as usize]
    }

    /// Sample every source's pins, latching a flag for each source
    /// with a changed, unmasked pin.
    pub fn sample<M: Mem>(&mut self, mem: &mut M) {
        for source in SOURCES.iter() {
            let current = mem.loadb(source.port.pin());
            let mask = mem.loadb(source.port.pcmsk());
            let prev = &mut self.previous[source.index as usize];

            if (current ^ *prev) & mask != 0 {
                trace!("PCINT{}: pins {:08b} -> {:08b}", source.index, *prev, current);
                if let Err(err) = mem.set_bit(io::ext(io::PCIFR), source.index) {
                    warn!("latching PCIF{}: {}", source.index, err);
                }
            }

            *prev = current;
        }
    }
}

/// Return the highest priority source ready to be serviced, if any.
pub fn pending<M: Mem>(mem: &M, sr: Status) -> Option<&'static PinChangeSource> {
    if !sr.interrupts_enabled() {
        return None;
    }

    let flags = mem.loadb(io::ext(io::PCIFR));
    let enabled = mem.loadb(io::ext(io::PCICR));

    SOURCES.iter().find(|s| flags & enabled & (1 << s.index) != 0)
}
