//! Instruction Cursor (component B): a stateful reader over a code
//! object's instruction bytes, shared by a parent `Decompiler` and any
//! nested sub-decompilations it spawns. Per the "shared cursor" design
//! note, ownership is strictly single-borrow: the parent hands `&mut
//! Cursor` to a child, the child runs until it returns control, and
//! there is never more than one live borrow.

use std::rc::Rc;

use crate::codeobject::CodeObject;
use crate::dictionary::Mnemonic;
use crate::error::{DecompileError, Result};
use crate::linemap;

pub struct Cursor {
    code: Rc<CodeObject>,
    i: usize,
    pending_extended: u32,
    min_line: u32,
    lastop: usize,
    stop_stack: Vec<usize>,
}

impl Cursor {
    pub fn new(code: Rc<CodeObject>) -> Cursor {
        let end = code.instructions.len();
        let first_line = code.first_line;
        Cursor { code, i: 0, pending_extended: 0, min_line: first_line, lastop: 0, stop_stack: vec![end] }
    }

    pub fn code(&self) -> &CodeObject {
        &self.code
    }

    pub fn position(&self) -> usize {
        self.i
    }

    /// True once the cursor has consumed every instruction in the code
    /// object, regardless of any narrower stop currently pushed. Used
    /// to detect the compiler-inserted implicit final `return None`.
    pub fn at_end(&self) -> bool {
        self.i == self.stop_stack[0]
    }

    pub fn push_stop(&mut self, offset: usize) {
        self.stop_stack.push(offset);
    }

    pub fn pop_stop(&mut self) -> usize {
        self.stop_stack.pop().expect("pop_stop with empty stop stack")
    }

    fn stop(&self) -> usize {
        *self.stop_stack.last().expect("stop stack is never empty")
    }

    /// Peek at the next opcode without consuming it, transparently
    /// absorbing any `EXTENDED_ARG` prefix into the pending high bits.
    /// Returns `None` once `i` reaches the top of the stop stack.
    pub fn next_opcode(&mut self) -> Result<Option<Mnemonic>> {
        if self.i >= self.stop() {
            return Ok(None);
        }
        let byte = self.code.instructions[self.i];
        let mnemonic = Mnemonic::from_byte(byte)
            .ok_or_else(|| DecompileError::malformed(self.i, format!("unrecognized opcode byte {}", byte)))?;
        if mnemonic == Mnemonic::ExtendedArg {
            self.i += 1;
            self.pending_extended = self.read_operand()?;
            return self.next_opcode();
        }
        Ok(Some(mnemonic))
    }

    /// Consume one opcode. If `expected` is non-empty, the opcode must
    /// be a member or this is a structural mismatch.
    pub fn read_opcode(&mut self, expected: &[Mnemonic]) -> Result<Mnemonic> {
        let opcode = self
            .next_opcode()?
            .ok_or_else(|| DecompileError::malformed(self.i, "expected an opcode, found end of code"))?;
        if !expected.is_empty() && !expected.contains(&opcode) {
            let wanted: Vec<&str> = expected.iter().map(|m| m.name()).collect();
            return Err(DecompileError::mismatch(self.i, wanted.join("|"), opcode.name()));
        }
        self.lastop = self.i;
        self.i += 1;
        Ok(opcode)
    }

    pub fn read_operand(&mut self) -> Result<u32> {
        if self.i + 1 >= self.code.instructions.len() {
            return Err(DecompileError::malformed(self.i, "truncated operand"));
        }
        let lo = self.code.instructions[self.i] as u32;
        let hi = self.code.instructions[self.i + 1] as u32;
        let operand = lo + hi * 256 + (self.pending_extended << 16);
        self.pending_extended = 0;
        self.i += 2;
        Ok(operand)
    }

    pub fn get_constant(&self, n: u32) -> Result<crate::codeobject::Constant> {
        self.code
            .constants
            .get(n as usize)
            .cloned()
            .ok_or_else(|| DecompileError::malformed(self.i, format!("constant index {} out of range", n)))
    }

    pub fn get_local(&self, n: u32) -> Result<String> {
        self.code
            .locals
            .get(n as usize)
            .cloned()
            .ok_or_else(|| DecompileError::malformed(self.i, format!("local index {} out of range", n)))
    }

    pub fn get_name(&self, n: u32) -> Result<String> {
        self.code
            .names
            .get(n as usize)
            .cloned()
            .ok_or_else(|| DecompileError::malformed(self.i, format!("name index {} out of range", n)))
    }

    pub fn get_line(&self) -> u32 {
        self.min_line.max(linemap::line_of(&self.code, self.lastop))
    }

    pub fn set_line(&mut self, lineno: u32) {
        debug_assert!(lineno >= self.min_line, "line counter must not move backwards");
        self.min_line = lineno;
    }
}
