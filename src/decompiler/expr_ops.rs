//! Opcode handlers — expression-forming (component F, expression
//! half). Each handler consumes the cursor and transforms the operand
//! stack: pop N operand trees, push one.

use crate::codeobject::Constant;
use crate::cursor::Cursor;
use crate::dictionary::{self, Mnemonic};
use crate::error::{DecompileError, Result};
use crate::expr::Expr;
use crate::precedence;

use super::Decompiler;

fn binary_symbol_and_precedence(op: Mnemonic) -> (&'static str, precedence::Precedence) {
    use Mnemonic::*;
    match op {
        BinaryAdd => ("+", precedence::ADD),
        BinarySubtract => ("-", precedence::ADD),
        BinaryMultiply => ("*", precedence::MULT),
        BinaryDivide => ("/", precedence::MULT),
        BinaryModulo => ("%", precedence::MULT),
        BinaryLshift => ("<<", precedence::SHIFT),
        BinaryRshift => (">>", precedence::SHIFT),
        BinaryAnd => ("&", precedence::BAND),
        BinaryXor => ("^", precedence::BXOR),
        BinaryOr => ("|", precedence::BOR),
        _ => unreachable!("{:?} is not a binary operator opcode", op),
    }
}

pub(super) fn binary_op(d: &mut Decompiler, cursor: &mut Cursor, op: Mnemonic) -> Result<()> {
    cursor.read_opcode(&[op])?;
    let (symbol, prec) = binary_symbol_and_precedence(op);
    let y = d.pop(cursor)?.render_at(prec + 1);
    let x = d.pop(cursor)?.render_at(prec);
    d.push(Expr::composite(format!("{} {} {}", x, symbol, y), prec));
    Ok(())
}

pub(super) fn binary_power(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::BinaryPower])?;
    let y = d.pop(cursor)?;
    let y_text = if y.precedence() == precedence::POWER {
        y.render_at(precedence::ATOM)
    } else {
        y.render_at(precedence::UNARY)
    };
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    d.push(Expr::composite(format!("{} ** {}", x, y_text), precedence::POWER));
    Ok(())
}

pub(super) fn binary_subscr(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::BinarySubscr])?;
    let y = d.pop(cursor)?.render_at(precedence::NONE);
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    d.push(Expr::composite(format!("{}[{}]", x, y), precedence::ATOM));
    Ok(())
}

pub(super) fn unary_op(d: &mut Decompiler, cursor: &mut Cursor, op: Mnemonic) -> Result<()> {
    cursor.read_opcode(&[op])?;
    let symbol = match op {
        Mnemonic::UnaryPositive => "+",
        Mnemonic::UnaryNegative => "-",
        Mnemonic::UnaryInvert => "~",
        _ => unreachable!(),
    };
    // Parenthesize defensively at ATOM: both powers and other unary
    // operators read confusingly without it.
    let y = d.pop(cursor)?.render_at(precedence::ATOM);
    d.push(Expr::composite(format!("{}{}", symbol, y), precedence::UNARY));
    Ok(())
}

pub(super) fn unary_not(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::UnaryNot])?;
    let y = d.pop(cursor)?.render_at(precedence::NOT);
    d.push(Expr::composite(format!("not {}", y), precedence::NOT));
    Ok(())
}

pub(super) fn unary_convert(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::UnaryConvert])?;
    let y = d.pop(cursor)?.render_at(precedence::NONE);
    d.push(Expr::composite(format!("`{}`", y), precedence::ATOM));
    Ok(())
}

pub(super) fn build_list(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::BuildList])?;
    let n = cursor.read_operand()?;
    let mut values = Vec::with_capacity(n as usize);
    for _ in 0..n {
        values.push(d.pop(cursor)?.render_at(precedence::ARG));
    }
    values.reverse();
    d.push(Expr::composite(format!("[{}]", values.join(", ")), precedence::ATOM));
    Ok(())
}

pub(super) fn build_tuple(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::BuildTuple])?;
    let n = cursor.read_operand()?;
    let mut values = Vec::with_capacity(n as usize);
    for _ in 0..n {
        values.push(d.pop(cursor)?.render_at(precedence::ARG));
    }
    values.reverse();
    d.push(Expr::tuple(values));
    Ok(())
}

pub(super) fn build_map(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::BuildMap])?;
    cursor.read_operand()?; // count is unused: entries arrive later via STORE_SUBSCR
    d.push(Expr::new_map());
    Ok(())
}

fn slice_bound_text(d: &mut Decompiler, cursor: &mut Cursor) -> Result<String> {
    let value = d.pop(cursor)?;
    if value.is_none_constant() {
        Ok(String::new())
    } else {
        Ok(value.render_at(precedence::ARG))
    }
}

pub(super) fn build_slice(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::BuildSlice])?;
    cursor.read_operand()?;
    let z = slice_bound_text(d, cursor)?;
    let y = slice_bound_text(d, cursor)?;
    let x = slice_bound_text(d, cursor)?;
    // Always consumed directly by BINARY_SUBSCR, so the precedence is
    // never observed.
    d.push(Expr::composite(format!("{}:{}:{}", x, y, z), precedence::NONE));
    Ok(())
}

pub(super) fn slice0(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::Slice0])?;
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    d.push(Expr::composite(format!("{}[:]", x), precedence::ATOM));
    Ok(())
}

pub(super) fn slice1(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::Slice1])?;
    let y = d.pop(cursor)?.render_at(precedence::ARG);
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    d.push(Expr::composite(format!("{}[{}:]", x, y), precedence::ATOM));
    Ok(())
}

pub(super) fn slice2(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::Slice2])?;
    let z = d.pop(cursor)?.render_at(precedence::ARG);
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    d.push(Expr::composite(format!("{}[:{}]", x, z), precedence::ATOM));
    Ok(())
}

pub(super) fn slice3(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::Slice3])?;
    let z = d.pop(cursor)?.render_at(precedence::ARG);
    let y = d.pop(cursor)?.render_at(precedence::ARG);
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    d.push(Expr::composite(format!("{}[{}:{}]", x, y, z), precedence::ATOM));
    Ok(())
}

pub(super) fn call_function(d: &mut Decompiler, cursor: &mut Cursor, op: Mnemonic) -> Result<()> {
    use Mnemonic::*;
    cursor.read_opcode(&[CallFunction, CallFunctionVar, CallFunctionKw, CallFunctionVarKw])?;
    let oparg = cursor.read_operand()?;
    let nkw = oparg / 256;
    let nargs = oparg % 256;
    let mut args = Vec::new();

    if matches!(op, CallFunctionKw | CallFunctionVarKw) {
        let name = d.pop(cursor)?;
        args.push(format!("**{}", name.text()));
    }
    if matches!(op, CallFunctionVar | CallFunctionVarKw) {
        let name = d.pop(cursor)?;
        args.push(format!("*{}", name.text()));
    }
    for _ in 0..nkw {
        let value = d.pop(cursor)?.render_at(precedence::ARG);
        let name = d.pop(cursor)?.as_identifier_text();
        args.push(format!("{}={}", name, value));
    }
    for _ in 0..nargs {
        args.push(d.pop(cursor)?.render_at(precedence::ARG));
    }
    args.reverse();
    let func = d.pop(cursor)?.render_at(precedence::ATOM);
    d.push(Expr::composite(format!("{}({})", func, args.join(", ")), precedence::ATOM));
    Ok(())
}

pub(super) fn compare_op(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::CompareOp])?;
    let oparg = cursor.read_operand()?;
    let (x, y) =
        if d.stack.len() == 1 { (None, d.pop(cursor)?) } else { let y = d.pop(cursor)?; let x = d.pop(cursor)?; (Some(x), y) };
    let op = *dictionary::COMPARE_OPS
        .get(oparg as usize)
        .ok_or_else(|| DecompileError::malformed(cursor.position(), format!("comparison operator index {} out of range", oparg)))?;
    let prec = dictionary::comparison_precedence(op);
    let y_text = if y.precedence() <= prec { format!("({})", y.text()) } else { y.text() };
    match x {
        None => d.push(Expr::chain(format!("{} {}", op, y_text))),
        Some(x) => {
            let x_text = x.render_at(prec);
            d.push(Expr::composite(format!("{} {} {}", x_text, op, y_text), prec));
        }
    }
    Ok(())
}

pub(super) fn load_attr(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::LoadAttr])?;
    let oparg = cursor.read_operand()?;
    let attr = cursor.get_name(oparg)?;
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    d.push(Expr::composite(format!("{}.{}", x, attr), precedence::ATOM));
    Ok(())
}

pub(super) fn load_const(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::LoadConst])?;
    let oparg = cursor.read_operand()?;
    let value = cursor.get_constant(oparg)?;
    d.push(Expr::constant(value));
    Ok(())
}

pub(super) fn load_fast(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::LoadFast])?;
    let oparg = cursor.read_operand()?;
    let name = cursor.get_local(oparg)?;
    d.push(Expr::local(name));
    Ok(())
}

pub(super) fn load_global(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::LoadGlobal])?;
    let oparg = cursor.read_operand()?;
    let name = cursor.get_name(oparg)?;
    d.push(Expr::global(name));
    Ok(())
}

pub(super) fn load_locals(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::LoadLocals])?;
    d.push(Expr::constant(Constant::None));
    Ok(())
}

pub(super) fn load_name(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::LoadName])?;
    let oparg = cursor.read_operand()?;
    let name = cursor.get_name(oparg)?;
    d.push(Expr::local(name));
    Ok(())
}

pub(super) fn dup_top(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::DupTop])?;
    let top = d
        .stack
        .last()
        .cloned()
        .ok_or_else(|| DecompileError::mismatch(cursor.position(), "non-empty operand stack", "empty stack"))?;
    d.push(top);
    Ok(())
}

pub(super) fn dup_topx(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::DupTopx])?;
    let n = cursor.read_operand()? as usize;
    if n > d.stack.len() {
        return Err(DecompileError::mismatch(cursor.position(), "at least n operands", "fewer operands"));
    }
    let start = d.stack.len() - n;
    let dup: Vec<Expr> = d.stack[start..].to_vec();
    d.stack.extend(dup);
    Ok(())
}

pub(super) fn rot_two(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::RotTwo])?;
    let n1 = d.pop(cursor)?;
    let n2 = d.pop(cursor)?;
    d.push(n1);
    d.push(n2);
    Ok(())
}
