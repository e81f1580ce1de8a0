//! Driver (component H) and the per-instance decompilation state:
//! the operand stack (component D), the statement map (component E),
//! and the single-slot loop context `SETUP_LOOP` records.
//!
//! Opcode dispatch is a static match over [`Mnemonic`] rather than the
//! reference implementation's `getattr(self, opcode)` reflection, per
//! the "opcode dispatch" redesign note — this mirrors the teacher's
//! own `match &code[pc] { Instr::... => ... }` VM loop (`vm.rs`).

mod control;
mod expr_ops;
mod stmt_ops;
#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::codeobject::{CodeObject, Version};
use crate::cursor::Cursor;
use crate::dictionary::{self, Mnemonic};
use crate::emitter::StatementMap;
use crate::error::{DecompileError, Result};
use crate::expr::Expr;

pub struct Decompiler {
    version: Version,
    stack: Vec<Expr>,
    lines: StatementMap,
    /// `(start, end)` byte offsets of the innermost active loop, set by
    /// `SETUP_LOOP` and cleared by the loop's own terminating handler.
    loop_ctx: Option<(usize, usize)>,
}

impl Decompiler {
    pub fn new(version: Version) -> Decompiler {
        Decompiler { version, stack: Vec::new(), lines: StatementMap::new(), loop_ctx: None }
    }

    fn push(&mut self, value: Expr) {
        self.stack.push(value);
    }

    fn pop(&mut self, cursor: &Cursor) -> Result<Expr> {
        self.stack
            .pop()
            .ok_or_else(|| DecompileError::mismatch(cursor.position(), "non-empty operand stack", "empty stack"))
    }

    fn emit(&mut self, line: u32, text: impl Into<String>) {
        self.lines.emit(line, text);
    }

    pub fn into_stack(self) -> Vec<Expr> {
        self.stack
    }

    pub fn into_statements(self) -> StatementMap {
        self.lines
    }

    /// Consumes the decompiler, yielding both its leftover operand
    /// stack and its statement body in one move. For callers (like
    /// `and`/`assert` reconstruction) that need to branch on the
    /// sub-scan's stack contents and, only on the empty-stack path,
    /// go on to use its statement body as well.
    pub fn into_stack_and_statements(self) -> (Vec<Expr>, StatementMap) {
        (self.stack, self.lines)
    }

    /// Run until `next_opcode` yields nothing, or an opcode in
    /// `terminators` is reached (left unconsumed for the caller).
    pub fn decompile(&mut self, cursor: &mut Cursor, terminators: &[Mnemonic]) -> Result<()> {
        loop {
            let opcode = match cursor.next_opcode()? {
                None => break,
                Some(op) if terminators.contains(&op) => break,
                Some(op) => op,
            };
            self.dispatch(cursor, opcode)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, cursor: &mut Cursor, opcode: Mnemonic) -> Result<()> {
        use Mnemonic::*;
        match opcode {
            BinaryAdd | BinaryAnd | BinaryDivide | BinaryLshift | BinaryModulo | BinaryMultiply
            | BinaryOr | BinaryRshift | BinarySubtract | BinaryXor => {
                expr_ops::binary_op(self, cursor, opcode)
            }
            BinaryPower => expr_ops::binary_power(self, cursor),
            BinarySubscr => expr_ops::binary_subscr(self, cursor),
            UnaryPositive | UnaryNegative | UnaryInvert => expr_ops::unary_op(self, cursor, opcode),
            UnaryNot => expr_ops::unary_not(self, cursor),
            UnaryConvert => expr_ops::unary_convert(self, cursor),
            BuildList => expr_ops::build_list(self, cursor),
            BuildTuple => expr_ops::build_tuple(self, cursor),
            BuildMap => expr_ops::build_map(self, cursor),
            BuildSlice => expr_ops::build_slice(self, cursor),
            CallFunction | CallFunctionVar | CallFunctionKw | CallFunctionVarKw => {
                expr_ops::call_function(self, cursor, opcode)
            }
            CompareOp => expr_ops::compare_op(self, cursor),
            LoadAttr => expr_ops::load_attr(self, cursor),
            LoadConst => expr_ops::load_const(self, cursor),
            LoadFast => expr_ops::load_fast(self, cursor),
            LoadGlobal => expr_ops::load_global(self, cursor),
            LoadLocals => expr_ops::load_locals(self, cursor),
            LoadName => expr_ops::load_name(self, cursor),
            DupTop => expr_ops::dup_top(self, cursor),
            DupTopx => expr_ops::dup_topx(self, cursor),
            RotTwo => expr_ops::rot_two(self, cursor),

            BreakLoop => stmt_ops::break_loop(self, cursor),
            PopTop => stmt_ops::pop_top(self, cursor),
            ReturnValue => stmt_ops::return_value(self, cursor),
            RaiseVarargs => stmt_ops::raise_varargs(self, cursor),
            ExecStmt => stmt_ops::exec_stmt(self, cursor),
            PrintItem => stmt_ops::print_item(self, cursor),
            PrintItemTo => stmt_ops::print_item_to(self, cursor),
            PrintNewline => stmt_ops::print_newline(self, cursor),
            PrintNewlineTo => stmt_ops::print_newline_to(self, cursor),
            DeleteFast | DeleteGlobal | DeleteName => stmt_ops::delete_batch(self, cursor, opcode),
            DeleteAttr => stmt_ops::delete_attr(self, cursor),
            DeleteSubscr => stmt_ops::delete_subscr(self, cursor),
            Slice0 => expr_ops::slice0(self, cursor),
            Slice1 => expr_ops::slice1(self, cursor),
            Slice2 => expr_ops::slice2(self, cursor),
            Slice3 => expr_ops::slice3(self, cursor),
            DeleteSlice0 => stmt_ops::delete_slice0(self, cursor),
            DeleteSlice1 => stmt_ops::delete_slice1(self, cursor),
            DeleteSlice2 => stmt_ops::delete_slice2(self, cursor),
            DeleteSlice3 => stmt_ops::delete_slice3(self, cursor),
            StoreSlice0 => stmt_ops::store_slice0(self, cursor),
            StoreSlice1 => stmt_ops::store_slice1(self, cursor),
            StoreSlice2 => stmt_ops::store_slice2(self, cursor),
            StoreSlice3 => stmt_ops::store_slice3(self, cursor),
            StoreAttr => stmt_ops::store_attr(self, cursor),
            StoreFast => stmt_ops::store_fast(self, cursor),
            StoreGlobal => stmt_ops::store_global(self, cursor),
            StoreName => stmt_ops::store_name(self, cursor),
            StoreSubscr => stmt_ops::store_subscr(self, cursor),
            InplaceAdd | InplaceAnd | InplaceDivide | InplaceLshift | InplaceModulo
            | InplaceMultiply | InplaceOr | InplacePower | InplaceRshift | InplaceSubtract
            | InplaceXor => stmt_ops::inplace_op(self, cursor, opcode),

            SetupLoop => control::setup_loop(self, cursor),
            ForLoop => control::for_loop(self, cursor),
            JumpIfFalse => control::jump_if_false(self, cursor),
            JumpIfTrue => control::jump_if_true(self, cursor),
            JumpAbsolute => control::jump_absolute(self, cursor),
            RotThree => control::rot_three(self, cursor),
            MakeFunction => control::make_function(self, cursor),
            ImportName => control::import_name(self, cursor),
            SetupExcept => control::setup_except(self, cursor),
            SetupFinally => control::setup_finally(self, cursor),
            UnpackSequence | UnpackTuple => control::unpack_sequence(self, cursor),

            other => {
                Err(DecompileError::mismatch(cursor.position(), "a dispatchable opcode", other.name()))
            }
        }
    }
}

/// Driver entry point: decompile `code`'s top-level body end to end,
/// returning the line-indexed source map. On a fatal error, dumps the
/// disassembly of the code object being decompiled to stderr before
/// propagating — the diagnostic dump `spec.md` §7 requires.
pub fn decompile_code(code: Rc<CodeObject>, version: Version) -> Result<BTreeMap<u32, String>> {
    let mut cursor = Cursor::new(Rc::clone(&code));
    let mut top = Decompiler::new(version);
    match top.decompile(&mut cursor, &[]) {
        Ok(()) => {
            let fallback_line = cursor.get_line();
            let lines = top.into_statements().into_sorted_or_pass(fallback_line);
            Ok(lines.into_iter().collect())
        }
        Err(err) => {
            eprintln!("-- disassembly of failing code object `{}` --", code.name);
            eprint!("{}", dictionary::disassemble(&code.instructions));
            Err(err)
        }
    }
}

/// Joins `src`'s lines `1..=max(keys)` with `"\n"`, substituting an
/// empty string for any absent line number.
pub fn format_lines(src: &BTreeMap<u32, String>) -> String {
    let max_line = match src.keys().next_back() {
        Some(&n) => n,
        None => return String::new(),
    };
    (1..=max_line)
        .map(|line| src.get(&line).map(String::as_str).unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n")
}
