//
// program.rs --- Instruction set and program memory.
//
// Copyright (C) 2016, James Bielman <jamesjb@gmail.com>
// All Rights Reserved.
//
// Released under the "BSD3" license. See the file "LICENSE"
// for details.
//

//! Instructions are 24 bits wide and stored one per program memory
//! word:
//!
//! ```text
//!   23      16 15       8 7        0
//!  +----------+----------+----------+
//!  |  opcode  | operand1 | operand2 |
//!  +----------+----------+----------+
//! ```
//!
//! The opcode table below is the single source for the opcode
//! numbers, their mnemonics and what each operand byte means.

use std::fmt;
use std::result;

use super::error::{DecodeError, Error, Result};

/// Number of instruction words in program memory.
pub const PROGRAM_SIZE: usize = 256;

/// The packed encoding of `NOP 0, 0`.
pub const NOP_WORD: u32 = 0x000000;

/// What an operand byte refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    /// Unused.
    None,
    /// A register, R0-R31.
    Reg,
    /// The low register of a pointer pair, R0-R30.
    Ptr,
    /// An 8-bit constant.
    Imm,
    /// An I/O or extended data address.
    Addr,
    /// A program memory address.
    Target,
}

macro_rules! opcodes {
    ($($name:ident = $code:literal, $mnemonic:literal, ($a:ident, $b:ident);)*) => {
        /// Instruction opcodes.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Opcode {
            $($name = $code,)*
        }

        impl Opcode {
            /// Every opcode, in numeric order.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$name,)*];

            /// Look up the opcode with numeric value `code`.
            pub fn from_u8(code: u8) -> Option<Opcode> {
                match code {
                    $($code => Some(Opcode::$name),)*
                    _ => None,
                }
            }

            /// Return the assembler mnemonic, for example `LDI`.
            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$name => $mnemonic,)*
                }
            }

            /// Return what the two operand bytes refer to.
            pub fn operands(self) -> (Operand, Operand) {
                match self {
                    $(Opcode::$name => (Operand::$a, Operand::$b),)*
                }
            }
        }
    }
}

opcodes! {
    Nop  = 0x00, "NOP",  (None, None);
    Ldi  = 0x01, "LDI",  (Reg, Imm);
    Mov  = 0x02, "MOV",  (Reg, Reg);
    Out  = 0x03, "OUT",  (Addr, Reg);
    In   = 0x04, "IN",   (Reg, Addr);
    Sts  = 0x05, "STS",  (Addr, Reg);
    Lds  = 0x06, "LDS",  (Reg, Addr);
    Clr  = 0x07, "CLR",  (Reg, None);
    Ori  = 0x08, "ORI",  (Reg, Imm);
    Andi = 0x09, "ANDI", (Reg, Imm);
    Xori = 0x0A, "XORI", (Reg, Imm);
    Or   = 0x0B, "OR",   (Reg, Reg);
    And  = 0x0C, "AND",  (Reg, Reg);
    Xor  = 0x0D, "XOR",  (Reg, Reg);
    Addi = 0x0E, "ADDI", (Reg, Imm);
    Subi = 0x0F, "SUBI", (Reg, Imm);
    Add  = 0x10, "ADD",  (Reg, Reg);
    Sub  = 0x11, "SUB",  (Reg, Reg);
    Inc  = 0x12, "INC",  (Reg, None);
    Dec  = 0x13, "DEC",  (Reg, None);
    Cpi  = 0x14, "CPI",  (Reg, Imm);
    Cp   = 0x15, "CP",   (Reg, Reg);
    Jmp  = 0x16, "JMP",  (Target, None);
    Breq = 0x17, "BREQ", (Target, None);
    Brne = 0x18, "BRNE", (Target, None);
    Brge = 0x19, "BRGE", (Target, None);
    Brgt = 0x1A, "BRGT", (Target, None);
    Brle = 0x1B, "BRLE", (Target, None);
    Brlt = 0x1C, "BRLT", (Target, None);
    Call = 0x1D, "CALL", (Target, None);
    Ret  = 0x1E, "RET",  (None, None);
    Reti = 0x1F, "RETI", (None, None);
    Push = 0x20, "PUSH", (Reg, None);
    Pop  = 0x21, "POP",  (Reg, None);
    Lsl  = 0x22, "LSL",  (Reg, None);
    Lsr  = 0x23, "LSR",  (Reg, None);
    Sei  = 0x24, "SEI",  (None, None);
    Cli  = 0x25, "CLI",  (None, None);
    Stio = 0x26, "STIO", (Ptr, Reg);
    Ldio = 0x27, "LDIO", (Reg, Ptr);
    St   = 0x28, "ST",   (Ptr, Reg);
    Ld   = 0x29, "LD",   (Reg, Ptr);
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Pack an instruction into its 24-bit program memory encoding.
pub fn assemble(opcode: Opcode, op1: u8, op2: u8) -> u32 {
    ((opcode as u32) << 16) | ((op1 as u32) << 8) | op2 as u32
}

/// A decoded instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub op1: u8,
    pub op2: u8,
}

impl Instruction {
    pub fn new(opcode: Opcode, op1: u8, op2: u8) -> Instruction {
        Instruction { opcode, op1, op2 }
    }

    /// Split a program memory word into opcode and operands. Bits
    /// above 23 are ignored. Register operands are range checked so
    /// execution never has to.
    pub fn decode(word: u32) -> result::Result<Instruction, DecodeError> {
        let code = (word >> 16) as u8;
        let op1 = (word >> 8) as u8;
        let op2 = word as u8;

        let opcode = Opcode::from_u8(code).ok_or(DecodeError::IllegalOpcode(code))?;
        let (a, b) = opcode.operands();

        for &(kind, operand) in [(a, op1), (b, op2)].iter() {
            let limit = match kind {
                Operand::Reg => 32,
                Operand::Ptr => 31,
                _ => continue,
            };
            if operand >= limit {
                return Err(DecodeError::BadRegister { opcode, operand });
            }
        }

        Ok(Instruction { opcode, op1, op2 })
    }

    pub fn encode(&self) -> u32 {
        assemble(self.opcode, self.op1, self.op2)
    }
}

/// Format a single operand for disassembly.
fn fmt_operand(f: &mut fmt::Formatter, kind: Operand, val: u8) -> fmt::Result {
    match kind {
        Operand::None => Ok(()),
        Operand::Reg => write!(f, "R{}", val),
        Operand::Ptr => match val {
            28 => f.write_str("X"),
            30 => f.write_str("Y"),
            _ => write!(f, "R{}:R{}", val + 1, val),
        },
        Operand::Imm | Operand::Addr | Operand::Target => write!(f, "0x{:02X}", val),
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (a, b) = self.opcode.operands();
        f.write_str(self.opcode.mnemonic())?;

        if a != Operand::None {
            f.write_str(" ")?;
            fmt_operand(f, a, self.op1)?;
        }
        if b != Operand::None {
            f.write_str(", ")?;
            fmt_operand(f, b, self.op2)?;
        }
        Ok(())
    }
}

/// A named region of a program, starting at `addr` and running up
/// to the next symbol or the end of the program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub addr: usize,
    pub name: String,
}

/// A program image waiting to be written into program memory.
///
/// Doubles as a tiny assembler:
///
/// ```
/// use avr8::emu::{Firmware, Opcode};
///
/// let mut fw = Firmware::new();
/// fw.label("main")
///   .emit(Opcode::Ldi, 16, 0x01)
///   .emit(Opcode::Jmp, 0, 0);
/// assert_eq!(fw.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Firmware {
    words: Vec<u32>,
    symbols: Vec<Symbol>,
}

impl Firmware {
    pub fn new() -> Firmware {
        Firmware::default()
    }

    /// Build an image from already packed words.
    pub fn from_words(words: Vec<u32>) -> Firmware {
        Firmware { words, symbols: Vec::new() }
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The address the next emitted instruction will occupy.
    pub fn here(&self) -> usize {
        self.words.len()
    }

    /// Append an instruction.
    pub fn emit(&mut self, opcode: Opcode, op1: u8, op2: u8) -> &mut Firmware {
        self.words.push(assemble(opcode, op1, op2));
        self
    }

    /// Pad with `NOP` up to `addr`.
    pub fn org(&mut self, addr: usize) -> &mut Firmware {
        if addr > self.words.len() {
            self.words.resize(addr, NOP_WORD);
        }
        self
    }

    /// Name the region starting at the current address.
    pub fn label(&mut self, name: &str) -> &mut Firmware {
        let addr = self.here();
        self.add_symbol(addr, name);
        self
    }

    /// Name the region starting at `addr`. Symbols are kept sorted.
    pub fn add_symbol(&mut self, addr: usize, name: &str) {
        let pos = self.symbols.iter().take_while(|s| s.addr <= addr).count();
        self.symbols.insert(pos, Symbol { addr, name: name.to_string() });
    }

    /// Store a packed word at `addr`, growing the image with `NOP` as
    /// needed.
    pub fn set_word(&mut self, addr: usize, word: u32) {
        self.org(addr + 1);
        self.words[addr] = word;
    }
}

/// Look up the region of `addr` in a sorted symbol table. Addresses at
/// or past `end` have no region.
fn region_name(symbols: &[Symbol], end: usize, addr: usize) -> Option<&str> {
    if addr >= end {
        return None;
    }
    symbols.iter()
        .rev()
        .find(|s| s.addr <= addr)
        .map(|s| s.name.as_str())
}

/// The 256-word program memory. It is written once; later writes are
/// ignored.
pub struct ProgramMemory {
    words: Vec<u32>,
    len: usize,
    symbols: Vec<Symbol>,
    initialized: bool,
}

impl ProgramMemory {
    /// Create an unwritten program memory filled with `NOP`.
    pub fn new() -> ProgramMemory {
        ProgramMemory {
            words: vec![NOP_WORD; PROGRAM_SIZE],
            len: 0,
            symbols: Vec::new(),
            initialized: false,
        }
    }

    /// Write `image` into program memory. Returns `Ok(false)` and
    /// changes nothing if the memory was already written.
    pub fn flash(&mut self, image: &Firmware) -> Result<bool> {
        if self.initialized {
            debug!("program memory already written");
            return Ok(false);
        }
        if image.len() > PROGRAM_SIZE {
            return Err(Error::ProgramTooLarge(image.len()));
        }

        self.words[..image.len()].copy_from_slice(image.words());
        self.len = image.len();
        self.symbols = image.symbols().to_vec();
        self.initialized = true;

        info!("flashed {} instructions, {} symbols", self.len, self.symbols.len());
        Ok(true)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of words written by `flash`.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Return the word at `addr`, or `NOP` past the end of memory.
    pub fn read(&self, addr: u8) -> u32 {
        self.words.get(addr as usize).copied().unwrap_or(NOP_WORD)
    }

    /// Return the name of the subroutine or vector containing `addr`.
    pub fn subroutine_name(&self, addr: u8) -> Option<&str> {
        region_name(&self.symbols, self.len, addr as usize)
    }
}

impl Default for ProgramMemory {
    fn default() -> ProgramMemory {
        ProgramMemory::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_numbers() {
        assert_eq!(Opcode::ALL.len(), 0x2A);
        for (i, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(*op as usize, i);
            assert_eq!(Opcode::from_u8(i as u8), Some(*op));
        }
        assert_eq!(Opcode::from_u8(0x2A), None);
        assert_eq!(Opcode::Reti.mnemonic(), "RETI");
    }

    #[test]
    fn packing() {
        assert_eq!(assemble(Opcode::Ldi, 16, 0x05), 0x011005);

        let insn = Instruction::decode(0xFF_1D_2A_00).unwrap();
        assert_eq!(insn, Instruction::new(Opcode::Call, 0x2A, 0x00));
        assert_eq!(insn.encode(), 0x1D2A00);
    }

    #[test]
    fn decode_rejects_bad_words() {
        assert_eq!(Instruction::decode(0x2A0000), Err(DecodeError::IllegalOpcode(0x2A)));
        assert_eq!(Instruction::decode(0xFF0000), Err(DecodeError::IllegalOpcode(0xFF)));
        assert_eq!(Instruction::decode(assemble(Opcode::Mov, 16, 32)),
                   Err(DecodeError::BadRegister { opcode: Opcode::Mov, operand: 32 }));
        assert_eq!(Instruction::decode(assemble(Opcode::St, 31, 16)),
                   Err(DecodeError::BadRegister { opcode: Opcode::St, operand: 31 }));

        // Immediate and address operands take any value.
        assert!(Instruction::decode(assemble(Opcode::Ldi, 31, 0xFF)).is_ok());
        assert!(Instruction::decode(assemble(Opcode::Out, 0xFF, 0)).is_ok());
    }

    #[test]
    fn disassembly() {
        assert_eq!(Instruction::new(Opcode::Ldi, 16, 5).to_string(), "LDI R16, 0x05");
        assert_eq!(Instruction::new(Opcode::Jmp, 8, 0).to_string(), "JMP 0x08");
        assert_eq!(Instruction::new(Opcode::St, 28, 16).to_string(), "ST X, R16");
        assert_eq!(Instruction::new(Opcode::Ld, 16, 4).to_string(), "LD R16, R5:R4");
        assert_eq!(Instruction::new(Opcode::Reti, 0, 0).to_string(), "RETI");
    }

    fn sample() -> Firmware {
        let mut fw = Firmware::new();
        fw.label("RESET_vect").emit(Opcode::Jmp, 8, 0)
          .org(2).label("PCINT0_vect").emit(Opcode::Reti, 0, 0)
          .org(8).label("main").emit(Opcode::Jmp, 8, 0);
        fw
    }

    #[test]
    fn subroutine_lookup() {
        let mut prog = ProgramMemory::new();
        prog.flash(&sample()).unwrap();

        assert_eq!(prog.len(), 9);
        assert_eq!(prog.subroutine_name(0), Some("RESET_vect"));
        assert_eq!(prog.subroutine_name(1), Some("RESET_vect"));
        assert_eq!(prog.subroutine_name(2), Some("PCINT0_vect"));
        assert_eq!(prog.subroutine_name(7), Some("PCINT0_vect"));
        assert_eq!(prog.subroutine_name(8), Some("main"));
        assert_eq!(prog.subroutine_name(9), None);
    }

    #[test]
    fn flash_once() {
        let mut prog = ProgramMemory::new();
        assert_eq!(prog.read(0), NOP_WORD);

        assert!(prog.flash(&sample()).unwrap());
        assert_eq!(prog.read(0), assemble(Opcode::Jmp, 8, 0));

        let mut other = Firmware::new();
        other.emit(Opcode::Sei, 0, 0);
        assert!(!prog.flash(&other).unwrap());
        assert_eq!(prog.read(0), assemble(Opcode::Jmp, 8, 0));
        assert_eq!(prog.read(255), NOP_WORD);
    }

    #[test]
    fn flash_too_large() {
        let mut prog = ProgramMemory::new();
        let fw = Firmware::from_words(vec![NOP_WORD; PROGRAM_SIZE + 1]);

        assert!(matches!(prog.flash(&fw), Err(Error::ProgramTooLarge(257))));
        assert!(!prog.is_initialized());
    }

    #[test]
    fn set_word_grows() {
        let mut fw = Firmware::new();
        fw.set_word(3, 0x123456);
        assert_eq!(fw.words(), &[0, 0, 0, 0x123456]);
    }
}
