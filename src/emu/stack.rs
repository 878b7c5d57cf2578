//
// stack.rs --- Hardware stack.
//
// Copyright (C) 2016, James Bielman <jamesjb@gmail.com>
// All Rights Reserved.
//
// Released under the "BSD3" license. See the file "LICENSE"
// for details.
//

use super::error::{Error, Result};

/// Number of bytes the stack can hold.
pub const STACK_SIZE: usize = 1024;

/// A 1 kB byte stack, separate from data memory. The stack pointer
/// starts at the top and moves down on every push.
pub struct Stack {
    contents: Vec<u8>,
    sp: u16,
}

impl Stack {
    /// Create an empty stack.
    pub fn new() -> Stack {
        Stack {
            contents: vec![0u8; STACK_SIZE],
            sp: STACK_SIZE as u16,
        }
    }

    /// Clear the stack contents and move the pointer back to the top.
    pub fn reset(&mut self) {
        self.contents.iter_mut().for_each(|x| *x = 0);
        self.sp = STACK_SIZE as u16;
    }

    /// Push a byte. Fails without touching the stack if it is full.
    pub fn push(&mut self, val: u8) -> Result<()> {
        if self.sp == 0 {
            return Err(Error::StackOverflow);
        }

        self.sp -= 1;
        self.contents[self.sp as usize] = val;
        Ok(())
    }

    /// Pop the most recently pushed byte, or `None` if the stack is empty.
    pub fn try_pop(&mut self) -> Option<u8> {
        let val = self.contents.get(self.sp as usize).copied()?;
        self.sp += 1;
        Some(val)
    }

    /// Pop the most recently pushed byte. An empty stack yields 0 and
    /// is left as it is; use `try_pop` to tell the two apart.
    pub fn pop(&mut self) -> u8 {
        match self.try_pop() {
            Some(val) => val,
            None => {
                warn!("stack underflow, popping 0");
                0
            },
        }
    }

    /// The current stack pointer. Equal to `STACK_SIZE` when empty.
    pub fn pointer(&self) -> u16 {
        self.sp
    }

    /// The value on top of the stack, or 0 if it is empty.
    pub fn last_added_value(&self) -> u8 {
        self.contents.get(self.sp as usize).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        STACK_SIZE - self.sp as usize
    }

    pub fn is_empty(&self) -> bool {
        self.sp as usize == STACK_SIZE
    }

    pub fn is_full(&self) -> bool {
        self.sp == 0
    }
}

impl Default for Stack {
    fn default() -> Stack {
        Stack::new()
    }
}
