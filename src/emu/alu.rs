//
// alu.rs --- Arithmetic logic unit.
//
// Copyright (C) 2016, James Bielman <jamesjb@gmail.com>
// All Rights Reserved.
//
// Released under the "BSD3" license. See the file "LICENSE"
// for details.
//

//! The ALU computes one of five operations on 8-bit operands and
//! updates the S, N, Z, V and C flags of a status register.
//!
//! Condition Codes:
//!
//!   S - Always `N ^ V`, so signed comparisons stay correct when the
//!       result overflows.
//!   N - Set if bit 7 of the result is set.
//!   Z - Set if the result is zero.
//!   V - Set on two's complement overflow (ADD and SUB only).
//!   C - Bit 8 of the widened result. SUB is computed as `a + (256 - b)`
//!       so C is set when no borrow occurs (`a >= b`).

use super::status::Status;

/// An ALU operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AluOp {
    Or,
    And,
    Xor,
    Add,
    Sub,
}

/// Perform `op` on `a` and `b`, returning the 8-bit result and
/// replacing the arithmetic flags in `sr`. The I flag is left alone.
pub fn alu(op: AluOp, a: u8, b: u8, sr: &mut Status) -> u8 {
    sr.remove(Status::ARITH);

    let a16 = a as u16;
    let b16 = b as u16;

    let res = match op {
        AluOp::Or  => a16 | b16,
        AluOp::And => a16 & b16,
        AluOp::Xor => a16 ^ b16,
        AluOp::Add => {
            let res = a16 + b16;
            sr.set(Status::V, (a16 ^ res) & (b16 ^ res) & 0x80 != 0);
            res
        },
        AluOp::Sub => {
            let res = a16 + (0x100 - b16);
            sr.set(Status::V, (a16 ^ b16) & (a16 ^ res) & 0x80 != 0);
            res
        },
    };

    let c = res as u8;
    sr.set(Status::N, c & 0x80 != 0);
    sr.set(Status::Z, c == 0);
    sr.set(Status::C, res & 0x100 != 0);

    // S last, from the final N and V.
    let s = sr.negative() != sr.overflow();
    sr.set(Status::S, s);
    c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(op: AluOp, a: u8, b: u8) -> (u8, Status) {
        let mut sr = Status::empty();
        let res = alu(op, a, b, &mut sr);
        (res, sr)
    }

    #[test]
    fn add_zero() {
        let (res, sr) = run(AluOp::Add, 0, 0);
        assert_eq!(res, 0);
        assert_eq!(sr, Status::Z);
    }

    #[test]
    fn add_carry_out() {
        let (res, sr) = run(AluOp::Add, 255, 1);
        assert_eq!(res, 0);
        assert_eq!(sr, Status::Z | Status::C);
    }

    #[test]
    fn add_signed_overflow() {
        let (res, sr) = run(AluOp::Add, 127, 1);
        assert_eq!(res, 0x80);
        assert!(sr.overflow());
        assert!(sr.negative());
        assert!(!sr.carry());
        assert!(!sr.signed());
    }

    #[test]
    fn sub_zero() {
        let (res, sr) = run(AluOp::Sub, 0, 0);
        assert_eq!(res, 0);
        assert_eq!(sr, Status::Z | Status::C);
    }

    // -100 - 50 wraps to 106: positive bit pattern, but S says negative.
    #[test]
    fn sub_overflow_without_negative() {
        let (res, sr) = run(AluOp::Sub, (-100i8) as u8, 50);
        assert_eq!(res, 106);
        assert!(!sr.negative());
        assert!(sr.overflow());
        assert!(sr.signed());
    }

    #[test]
    fn sub_most_negative_minus_one() {
        let (res, sr) = run(AluOp::Sub, 0x80, 1);
        assert_eq!(res, 0x7F);
        assert!(sr.overflow());
        assert!(sr.carry());
    }

    // 150 is -106 as a signed byte, so 100 - 150 also overflows.
    #[test]
    fn sub_borrow_clears_carry() {
        let (res, sr) = run(AluOp::Sub, 100, 150);
        assert_eq!(res, 206);
        assert!(!sr.carry());
        assert!(sr.negative());
        assert!(sr.overflow());
        assert!(!sr.signed());

        let (res, sr) = run(AluOp::Sub, 3, 5);
        assert_eq!(res, 0xFE);
        assert_eq!(sr, Status::N | Status::S);
    }

    #[test]
    fn logic_clears_v_and_c() {
        let mut sr = Status::V | Status::C | Status::I;
        let res = alu(AluOp::Or, 0x0F, 0xF0, &mut sr);
        assert_eq!(res, 0xFF);
        assert_eq!(sr, Status::I | Status::N | Status::S);

        assert_eq!(run(AluOp::And, 0x0F, 0xF0), (0x00, Status::Z));
        assert_eq!(run(AluOp::Xor, 0x3C, 0x0F), (0x33, Status::empty()));
    }

    #[test]
    fn leaves_interrupt_flag() {
        let mut sr = Status::I;
        alu(AluOp::Sub, 1, 1, &mut sr);
        assert!(sr.interrupts_enabled());
    }
}
