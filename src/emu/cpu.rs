//
// cpu.rs --- AVR8 control unit.
//
// Copyright (C) 2016, James Bielman <jamesjb@gmail.com>
// All Rights Reserved.
//
// Released under the "BSD3" license. See the file "LICENSE"
// for details.
//

//! The control unit of the AVR8 processor.
//!
//! ## Implementation Notes
//!
//! Each instruction takes three clock ticks: FETCH reads the word at
//! the program counter, DECODE splits it into an `Instruction`, and
//! EXECUTE runs it. The decoded value travels inside the `Cycle`
//! state itself, so nothing is left behind in the CPU between ticks.
//!
//! The pin change monitors sample the ports after every tick. Pending
//! interrupts are only serviced after EXECUTE.
//!
//! Nothing here fails outwards. Out of range writes and stack
//! overflows are logged and dropped, and an instruction that does not
//! decode resets the whole machine the way a watchdog would.

#![allow(non_snake_case)]

use std::fmt;
use std::result;

use super::alu::{alu, AluOp};
use super::error::{DecodeError, Result};
use super::interrupt::{self, PinChangeMonitor};
use super::io::{self, Port};
use super::mem::Mem;
use super::program::{Firmware, Instruction, Opcode, ProgramMemory};
use super::stack::Stack;
use super::status::Status;

/// Number of general purpose registers.
pub const NUM_REGS: usize = 32;

/// Low byte of the X pointer; the high byte is R29.
pub const X: u8 = 28;
/// Low byte of the Y pointer; the high byte is R31.
pub const Y: u8 = 30;

/// The set of CPU registers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Regs {
    pub r: [u8; NUM_REGS],
    pub pc: u8,
    pub sr: Status,
}

impl Regs {
    /// Create registers in their power-on state.
    pub fn new() -> Regs {
        Regs {
            r: [0; NUM_REGS],
            pc: 0,
            sr: Status::empty(),
        }
    }

    /// Return register `n`. Panics if `n` is not below `NUM_REGS`.
    pub fn r(&self, n: u8) -> u8 {
        self.r[n as usize]
    }

    pub fn set_r(&mut self, n: u8, val: u8) {
        self.r[n as usize] = val;
    }

    /// Return the 16-bit pointer held in registers `n` (low byte) and
    /// `n + 1` (high byte).
    pub fn pointer(&self, n: u8) -> u16 {
        let lo = self.r(n) as u16;
        let hi = self.r(n + 1) as u16;
        (hi << 8) | lo
    }

    /// Store a 16-bit pointer in registers `n` and `n + 1`.
    pub fn set_pointer(&mut self, n: u8, val: u16) {
        self.set_r(n, val as u8);
        self.set_r(n + 1, (val >> 8) as u8);
    }

    pub fn x(&self) -> u16 {
        self.pointer(X)
    }

    pub fn y(&self) -> u16 {
        self.pointer(Y)
    }
}

impl Default for Regs {
    fn default() -> Regs {
        Regs::new()
    }
}

impl fmt::Display for Regs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "R16={:02X} R17={:02X} R18={:02X} R24={:02X} ",
               self.r[16], self.r[17], self.r[18], self.r[24])?;
        write!(f, "X={:04X} Y={:04X} PC={:02X} SR={:02X} ({})",
               self.x(), self.y(), self.pc, self.sr.bits(), self.sr)
    }
}

/// The phase the control unit will run on its next tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Fetch,
    Decode,
    Execute,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Fetch => "FETCH",
            Phase::Decode => "DECODE",
            Phase::Execute => "EXECUTE",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Control unit state, carrying the instruction between phases.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Cycle {
    Fetch,
    Decode(u32),
    Execute(result::Result<Instruction, DecodeError>),
}

/////////////////////////////////////////////////////////////////////
// CPU Emulation

/// The AVR8 control unit.
pub struct CPU<M: Mem> {
    pub regs: Regs,
    pub mem: M,
    pub stack: Stack,
    program: ProgramMemory,
    firmware: Firmware,
    cycle: Cycle,
    ir: u32,                    // instruction register
    mar: u8,                    // address of the current instruction
    last: Option<Instruction>,  // most recently executed instruction
    pcint: PinChangeMonitor,
}

impl <M: Mem> CPU<M> {
    /// Create a new CPU given a data memory and a program image. The
    /// image is written into program memory and kept for resets.
    ///
    /// # Examples
    ///
    /// ```
    /// use avr8::emu::{CPU, DataMemory, Firmware};
    ///
    /// let cpu = CPU::new(DataMemory::new(), Firmware::new()).unwrap();
    /// assert_eq!(cpu.pc(), 0);
    /// ```
    pub fn new(mem: M, firmware: Firmware) -> Result<CPU<M>> {
        let mut program = ProgramMemory::new();
        program.flash(&firmware)?;

        Ok(CPU {
            regs: Regs::new(),
            mem,
            stack: Stack::new(),
            program,
            firmware,
            cycle: Cycle::Fetch,
            ir: 0,
            mar: 0,
            last: None,
            pcint: PinChangeMonitor::new(),
        })
    }

    /// Return every register, memory, the stack and the program
    /// counter to their power-on state. Program memory is write-once,
    /// so reloading it leaves the first image in place.
    pub fn reset(&mut self) {
        info!("reset");

        self.regs = Regs::new();
        self.cycle = Cycle::Fetch;
        self.ir = 0;
        self.mar = 0;
        self.last = None;
        self.pcint.reset();
        self.mem.clear();
        self.stack.reset();

        if let Err(err) = self.program.flash(&self.firmware) {
            error!("reloading program memory: {}", err);
        }
    }

    /// Run one clock tick: a single FETCH, DECODE or EXECUTE.
    pub fn tick(&mut self) {
        trace!("{:02X} {}", self.regs.pc, self.phase());

        match self.cycle {
            Cycle::Fetch => {
                self.ir = self.program.read(self.regs.pc);
                self.mar = self.regs.pc;
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = Cycle::Decode(self.ir);
            },
            Cycle::Decode(word) => {
                self.cycle = Cycle::Execute(Instruction::decode(word));
            },
            Cycle::Execute(Ok(insn)) => {
                self.execute(insn);
                self.cycle = Cycle::Fetch;
                self.check_for_irq();
            },
            Cycle::Execute(Err(err)) => {
                warn!("{:02X}: {}", self.mar, err);
                self.reset();
            },
        }

        self.pcint.sample(&mut self.mem);
    }

    /// Execute the rest of the current instruction, or the next one
    /// if the CPU is about to fetch.
    pub fn step(&mut self) {
        loop {
            let executing = self.phase() == Phase::Execute;
            self.tick();
            if executing {
                break;
            }
        }
    }

    /// Execute the next `n` instructions.
    pub fn step_n(&mut self, n: usize) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Run until the program counter equals `pc_stop` at an
    /// instruction boundary, executing at most `limit` instructions.
    /// Returns true if `pc_stop` was reached.
    pub fn run_until(&mut self, pc_stop: u8, limit: usize) -> bool {
        for _ in 0..limit {
            if self.at_boundary() && self.regs.pc == pc_stop {
                return true;
            }
            self.step();
        }
        self.at_boundary() && self.regs.pc == pc_stop
    }

    fn at_boundary(&self) -> bool {
        self.cycle == Cycle::Fetch
    }

    fn execute(&mut self, insn: Instruction) {
        let Instruction { opcode, op1, op2 } = insn;

        match opcode {
            Opcode::Nop  => (),
            Opcode::Ldi  => self.regs.set_r(op1, op2),
            Opcode::Mov  => self.op_MOV(op1, op2),
            Opcode::Out  => self.op_OUT(op1 as u16, op2),
            Opcode::In   => self.op_IN(op1, op2 as u16),
            Opcode::Sts  => self.op_OUT(io::ext(op1), op2),
            Opcode::Lds  => self.op_IN(op1, io::ext(op2)),
            Opcode::Clr  => self.regs.set_r(op1, 0),
            Opcode::Ori  => self.alu_imm(AluOp::Or, op1, op2),
            Opcode::Andi => self.alu_imm(AluOp::And, op1, op2),
            Opcode::Xori => self.alu_imm(AluOp::Xor, op1, op2),
            Opcode::Or   => self.alu_reg(AluOp::Or, op1, op2),
            Opcode::And  => self.alu_reg(AluOp::And, op1, op2),
            Opcode::Xor  => self.alu_reg(AluOp::Xor, op1, op2),
            Opcode::Addi => self.alu_imm(AluOp::Add, op1, op2),
            Opcode::Subi => self.alu_imm(AluOp::Sub, op1, op2),
            Opcode::Add  => self.alu_reg(AluOp::Add, op1, op2),
            Opcode::Sub  => self.alu_reg(AluOp::Sub, op1, op2),
            Opcode::Inc  => self.alu_imm(AluOp::Add, op1, 1),
            Opcode::Dec  => self.alu_imm(AluOp::Sub, op1, 1),
            Opcode::Cpi  => self.compare(op1, op2),
            Opcode::Cp   => self.compare(op1, self.regs.r(op2)),
            Opcode::Jmp  => self.regs.pc = op1,
            Opcode::Breq => self.branch(op1, self.regs.sr.zero()),
            Opcode::Brne => self.branch(op1, !self.regs.sr.zero()),
            Opcode::Brge => self.branch(op1, !self.regs.sr.signed()),
            Opcode::Brgt => self.branch(op1, !self.regs.sr.signed() && !self.regs.sr.zero()),
            Opcode::Brle => self.branch(op1, self.regs.sr.signed() || self.regs.sr.zero()),
            Opcode::Brlt => self.branch(op1, self.regs.sr.signed()),
            Opcode::Call => self.op_CALL(op1),
            Opcode::Ret  => self.op_RET(),
            Opcode::Reti => self.op_RETI(),
            Opcode::Push => self.push(self.regs.r(op1)),
            Opcode::Pop  => self.op_POP(op1),
            Opcode::Lsl  => self.op_LSL(op1),
            Opcode::Lsr  => self.op_LSR(op1),
            Opcode::Sei  => self.regs.sr.set_interrupts_enabled(true),
            Opcode::Cli  => self.regs.sr.set_interrupts_enabled(false),
            Opcode::Stio => self.op_OUT(self.regs.pointer(op1), op2),
            Opcode::Ldio => self.op_IN(op1, self.regs.pointer(op2)),
            Opcode::St   => self.op_OUT(self.extended_pointer(op1), op2),
            Opcode::Ld   => self.op_IN(op1, self.extended_pointer(op2)),
        }

        self.last = Some(insn);
        debug!("{:02X}  {:<16} {}", self.mar, insn.to_string(), self.regs);
    }

    /// Push a byte, dropping it if the stack is full.
    fn push(&mut self, val: u8) {
        if let Err(err) = self.stack.push(val) {
            warn!("{:02X}: {}, dropping {:02X}", self.mar, err, val);
        }
    }

    /// Pop a byte; an empty stack yields 0.
    fn pop(&mut self) -> u8 {
        self.stack.pop()
    }

    /// Store a byte in data memory, ignoring addresses past its end.
    fn storeb(&mut self, addr: u16, val: u8) {
        if let Err(err) = self.mem.storeb(addr, val) {
            warn!("{:02X}: {}", self.mar, err);
        }
    }

    /// Service the highest priority pending interrupt, if any.
    ///
    /// The source's flag is cleared first so the same edge is not
    /// serviced twice. Only the return address is saved; the I flag
    /// is cleared to block nesting and `RETI` sets it again.
    fn check_for_irq(&mut self) {
        let source = match interrupt::pending(&self.mem, self.regs.sr) {
            Some(source) => source,
            None => return,
        };

        debug!("PCINT{}: interrupt at {:02X}, vector {:02X}",
               source.index, self.regs.pc, source.vector);

        if let Err(err) = self.mem.clear_bit(io::ext(io::PCIFR), source.index) {
            warn!("clearing PCIF{}: {}", source.index, err);
        }

        let pc = self.regs.pc;
        self.push(pc);
        self.regs.sr.remove(Status::I);
        self.regs.pc = source.vector;
    }

    /// The address in pointer pair `n`, moved into the extended region.
    fn extended_pointer(&self, n: u8) -> u16 {
        self.regs.pointer(n).wrapping_add(io::EXTENDED_OFFSET)
    }
}

/////////////////////////////////////////////////////////////////////
// Driver Interface

impl <M: Mem> CPU<M> {
    /// Drive the input pins of `port`.
    pub fn set_pins(&mut self, port: Port, val: u8) {
        self.storeb(port.pin(), val);
    }

    /// Drive a single input pin of `port` high or low.
    pub fn set_pin(&mut self, port: Port, bit: u8, high: bool) {
        let pins = self.pins(port);
        let pins = if high { pins | (1 << bit) } else { pins & !(1 << bit) };
        self.set_pins(port, pins);
    }

    /// The input pins of `port`.
    pub fn pins(&self, port: Port) -> u8 {
        self.mem.loadb(port.pin())
    }

    /// The output data register of `port`.
    pub fn port_output(&self, port: Port) -> u8 {
        self.mem.loadb(port.port())
    }

    /// The data direction register of `port`.
    pub fn port_direction(&self, port: Port) -> u8 {
        self.mem.loadb(port.ddr())
    }
}

/////////////////////////////////////////////////////////////////////
// Diagnostics

impl <M: Mem> CPU<M> {
    pub fn pc(&self) -> u8 {
        self.regs.pc
    }

    pub fn status(&self) -> Status {
        self.regs.sr
    }

    /// The phase the next tick will run.
    pub fn phase(&self) -> Phase {
        match self.cycle {
            Cycle::Fetch => Phase::Fetch,
            Cycle::Decode(_) => Phase::Decode,
            Cycle::Execute(_) => Phase::Execute,
        }
    }

    /// Address of the most recently fetched instruction.
    pub fn current_address(&self) -> u8 {
        self.mar
    }

    /// The most recently fetched instruction word.
    pub fn instruction_register(&self) -> u32 {
        self.ir
    }

    /// The most recently executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last
    }

    /// Name of the subroutine containing the current instruction.
    pub fn current_subroutine(&self) -> Option<&str> {
        self.program.subroutine_name(self.mar)
    }

    pub fn program(&self) -> &ProgramMemory {
        &self.program
    }

    pub fn pin_monitor(&self) -> &PinChangeMonitor {
        &self.pcint
    }
}

/////////////////////////////////////////////////////////////////////
// Instruction Set

impl <M: Mem> CPU<M> {
    fn op_MOV(&mut self, dst: u8, src: u8) {
        let val = self.regs.r(src);
        self.regs.set_r(dst, val);
    }

    /// Write register `src` to data memory at `addr`.
    fn op_OUT(&mut self, addr: u16, src: u8) {
        let val = self.regs.r(src);
        self.storeb(addr, val);
    }

    /// Read data memory at `addr` into register `dst`.
    fn op_IN(&mut self, dst: u8, addr: u16) {
        let val = self.mem.loadb(addr);
        self.regs.set_r(dst, val);
    }

    /// `dst = dst <op> val` for an immediate operand.
    fn alu_imm(&mut self, op: AluOp, dst: u8, val: u8) {
        let a = self.regs.r(dst);
        let res = alu(op, a, val, &mut self.regs.sr);
        self.regs.set_r(dst, res);
    }

    /// `dst = dst <op> src` for a register operand.
    fn alu_reg(&mut self, op: AluOp, dst: u8, src: u8) {
        let b = self.regs.r(src);
        self.alu_imm(op, dst, b);
    }

    /// Subtract `val` from register `reg`, keeping only the flags.
    ///
    /// Condition Codes:
    ///
    ///   S - N ^ V, the signed "less than" result.
    ///   N - Set if bit 7 of the difference is set.
    ///   Z - Set if the operands are equal.
    ///   V - Set if the subtraction overflowed.
    ///   C - Set if `reg >= val` as unsigned bytes.
    fn compare(&mut self, reg: u8, val: u8) {
        let a = self.regs.r(reg);
        alu(AluOp::Sub, a, val, &mut self.regs.sr);
    }

    /// Jump to `target` if `cond` is true. The conditions read the
    /// flags left by the last ALU operation or compare:
    ///
    ///   BREQ - Z
    ///   BRNE - !Z
    ///   BRGE - !S
    ///   BRGT - !S && !Z
    ///   BRLE - S || Z
    ///   BRLT - S
    fn branch(&mut self, target: u8, cond: bool) {
        if cond {
            self.regs.pc = target;
        }
    }

    /// Push the return address and jump to `target`.
    fn op_CALL(&mut self, target: u8) {
        let pc = self.regs.pc;
        self.push(pc);
        self.regs.pc = target;
    }

    fn op_RET(&mut self) {
        self.regs.pc = self.pop();
    }

    /// Return from an interrupt handler. Nothing but the return
    /// address was saved, so only the I flag is restored.
    fn op_RETI(&mut self) {
        self.regs.pc = self.pop();
        self.regs.sr.insert(Status::I);
    }

    fn op_POP(&mut self, dst: u8) {
        let val = self.pop();
        self.regs.set_r(dst, val);
    }

    /// Shift a register left by one. Flags are not affected.
    fn op_LSL(&mut self, reg: u8) {
        let val = self.regs.r(reg);
        self.regs.set_r(reg, val << 1);
    }

    /// Shift a register right by one, shifting in a zero. Flags are
    /// not affected.
    fn op_LSR(&mut self, reg: u8) {
        let val = self.regs.r(reg);
        self.regs.set_r(reg, val >> 1);
    }
}

/// Macro used to check flags after executing an instruction.
#[cfg(test)]
macro_rules! assert_flags {
    ($cpu:expr => $($flag:ident: $val:expr),*) => (
        $(assert!($cpu.regs.sr.contains(Status::$flag) == $val,
                  "flag {} != {}", stringify!($flag), $val);)*);
}

#[cfg(test)]
#[path = "cpu_test.rs"]
mod tests;
