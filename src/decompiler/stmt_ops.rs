//! Opcode handlers — statement-forming (component F, statement half).

use crate::cursor::Cursor;
use crate::dictionary::Mnemonic;
use crate::error::Result;
use crate::expr::Expr;
use crate::precedence;

use super::Decompiler;

pub(super) fn break_loop(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::BreakLoop])?;
    d.emit(cursor.get_line(), "break");
    Ok(())
}

pub(super) fn pop_top(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::PopTop])?;
    let text = d.pop(cursor)?.render_at(precedence::NONE);
    d.emit(cursor.get_line(), text);
    Ok(())
}

pub(super) fn return_value(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::ReturnValue])?;
    let value = d.pop(cursor)?;
    if value.is_none_constant() {
        // The compiler appends an implicit `return None` at the end of
        // every function; suppress it, it was never written.
        if !cursor.at_end() {
            d.emit(cursor.get_line(), "return");
        }
    } else {
        let text = value.render_at(precedence::NONE);
        d.emit(cursor.get_line(), format!("return {}", text));
    }
    Ok(())
}

pub(super) fn raise_varargs(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::RaiseVarargs])?;
    let argcount = cursor.read_operand()?;
    let mut args = Vec::with_capacity(argcount as usize);
    for _ in 0..argcount {
        args.push(d.pop(cursor)?.render_at(precedence::ARG));
    }
    args.reverse();
    d.emit(cursor.get_line(), format!("raise {}", args.join(", ")));
    Ok(())
}

pub(super) fn exec_stmt(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::ExecStmt])?;
    let lineno = cursor.get_line();
    let locals = d.pop(cursor)?;
    let globals = d.pop(cursor)?;
    let stmt = d.pop(cursor)?.render_at(precedence::IN);
    if globals.is_none_constant() {
        d.emit(lineno, format!("exec {}", stmt));
    } else if locals.text() == globals.text() {
        // `exec s in g` duplicates g onto both the globals and locals
        // slots; same rendered text stands in for the identity check
        // the reference decompiler performs on the popped objects.
        let g = globals.render_at(precedence::ARG);
        d.emit(lineno, format!("exec {} in {}", stmt, g));
    } else {
        let g = globals.render_at(precedence::ARG);
        let l = locals.render_at(precedence::ARG);
        d.emit(lineno, format!("exec {} in {}, {}", stmt, g, l));
    }
    Ok(())
}

pub(super) fn print_item(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::PrintItem])?;
    let x = d.pop(cursor)?.render_at(precedence::ARG);
    if cursor.next_opcode()? == Some(Mnemonic::PrintNewline) {
        cursor.read_opcode(&[Mnemonic::PrintNewline])?;
        d.emit(cursor.get_line(), format!("print {}", x));
    } else {
        d.emit(cursor.get_line(), format!("print {},", x));
    }
    Ok(())
}

pub(super) fn print_item_to(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::PrintItemTo])?;
    let file = d.pop(cursor)?;
    let x = d.pop(cursor)?.render_at(precedence::ARG);
    let same_stream = cursor.next_opcode()? == Some(Mnemonic::PrintNewlineTo)
        && d.stack.last().map(Expr::text) == Some(file.text());
    let file_text = file.render_at(precedence::ARG);
    if same_stream {
        cursor.read_opcode(&[Mnemonic::PrintNewlineTo])?;
        d.pop(cursor)?;
        d.emit(cursor.get_line(), format!("print >> {}, {}", file_text, x));
    } else {
        d.emit(cursor.get_line(), format!("print >> {}, {},", file_text, x));
    }
    Ok(())
}

pub(super) fn print_newline(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::PrintNewline])?;
    d.emit(cursor.get_line(), "print");
    Ok(())
}

pub(super) fn print_newline_to(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::PrintNewlineTo])?;
    let file = d.pop(cursor)?.render_at(precedence::ARG);
    d.emit(cursor.get_line(), format!("print >> {}", file));
    Ok(())
}

pub(super) fn delete_batch(d: &mut Decompiler, cursor: &mut Cursor, _first: Mnemonic) -> Result<()> {
    use Mnemonic::*;
    let mut names: Vec<String> = Vec::new();
    let mut pending_line: Option<u32> = None;
    loop {
        let op = match cursor.next_opcode()? {
            Some(op @ (DeleteFast | DeleteGlobal | DeleteName)) => op,
            _ => break,
        };
        cursor.read_opcode(&[op])?;
        let line = cursor.get_line();
        if let Some(prev) = pending_line {
            if prev != line {
                d.emit(prev, format!("del {}", names.join(", ")));
                names.clear();
            }
        }
        pending_line = Some(line);
        let oparg = cursor.read_operand()?;
        let name = if op == DeleteFast { cursor.get_local(oparg)? } else { cursor.get_name(oparg)? };
        names.push(name);
    }
    if let Some(line) = pending_line {
        d.emit(line, format!("del {}", names.join(", ")));
    }
    Ok(())
}

pub(super) fn delete_attr(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::DeleteAttr])?;
    let oparg = cursor.read_operand()?;
    let attr = cursor.get_name(oparg)?;
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    d.emit(cursor.get_line(), format!("del {}.{}", x, attr));
    Ok(())
}

pub(super) fn delete_subscr(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::DeleteSubscr])?;
    let y = d.pop(cursor)?.render_at(precedence::NONE);
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    d.emit(cursor.get_line(), format!("del {}[{}]", x, y));
    Ok(())
}

pub(super) fn delete_slice0(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::DeleteSlice0])?;
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    d.emit(cursor.get_line(), format!("del {}[:]", x));
    Ok(())
}

pub(super) fn delete_slice1(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::DeleteSlice1])?;
    let y = d.pop(cursor)?.render_at(precedence::ARG);
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    d.emit(cursor.get_line(), format!("del {}[{}:]", x, y));
    Ok(())
}

pub(super) fn delete_slice2(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::DeleteSlice2])?;
    let z = d.pop(cursor)?.render_at(precedence::ARG);
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    d.emit(cursor.get_line(), format!("del {}[:{}]", x, z));
    Ok(())
}

pub(super) fn delete_slice3(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::DeleteSlice3])?;
    let z = d.pop(cursor)?.render_at(precedence::ARG);
    let y = d.pop(cursor)?.render_at(precedence::ARG);
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    d.emit(cursor.get_line(), format!("del {}[{}:{}]", x, y, z));
    Ok(())
}

pub(super) fn store_slice0(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::StoreSlice0])?;
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    let value = d.pop(cursor)?.render_at(precedence::NONE);
    d.emit(cursor.get_line(), format!("{}[:] = {}", x, value));
    Ok(())
}

pub(super) fn store_slice1(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::StoreSlice1])?;
    let y = d.pop(cursor)?.render_at(precedence::ARG);
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    let value = d.pop(cursor)?.render_at(precedence::NONE);
    d.emit(cursor.get_line(), format!("{}[{}:] = {}", x, y, value));
    Ok(())
}

pub(super) fn store_slice2(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::StoreSlice2])?;
    let z = d.pop(cursor)?.render_at(precedence::ARG);
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    let value = d.pop(cursor)?.render_at(precedence::NONE);
    d.emit(cursor.get_line(), format!("{}[:{}] = {}", x, z, value));
    Ok(())
}

pub(super) fn store_slice3(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::StoreSlice3])?;
    let z = d.pop(cursor)?.render_at(precedence::ARG);
    let y = d.pop(cursor)?.render_at(precedence::ARG);
    let x = d.pop(cursor)?.render_at(precedence::ATOM);
    let value = d.pop(cursor)?.render_at(precedence::NONE);
    d.emit(cursor.get_line(), format!("{}[{}:{}] = {}", x, y, z, value));
    Ok(())
}

pub(super) fn store_attr(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::StoreAttr])?;
    let oparg = cursor.read_operand()?;
    let attr = cursor.get_name(oparg)?;
    let name = d.pop(cursor)?.render_at(precedence::ATOM);
    let value = d.pop(cursor)?.render_at(precedence::NONE);
    d.emit(cursor.get_line(), format!("{}.{} = {}", name, attr, value));
    Ok(())
}

pub(super) fn store_fast(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::StoreFast])?;
    let oparg = cursor.read_operand()?;
    let name = cursor.get_local(oparg)?;
    let value = d.pop(cursor)?.render_at(precedence::NONE);
    d.emit(cursor.get_line(), format!("{} = {}", name, value));
    Ok(())
}

pub(super) fn store_global(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::StoreGlobal])?;
    let oparg = cursor.read_operand()?;
    let name = cursor.get_name(oparg)?;
    let value = d.pop(cursor)?.render_at(precedence::NONE);
    d.emit(cursor.get_line(), format!("{} = {}", name, value));
    Ok(())
}

pub(super) fn store_name(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::StoreName])?;
    let oparg = cursor.read_operand()?;
    let name = cursor.get_name(oparg)?;
    let value = d.pop(cursor)?.render_at(precedence::NONE);
    d.emit(cursor.get_line(), format!("{} = {}", name, value));
    Ok(())
}

pub(super) fn store_subscr(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::StoreSubscr])?;
    let key = d.pop(cursor)?;
    let obj = d.pop(cursor)?;
    if let Expr::Map(_) = &obj {
        let value = d.pop(cursor)?.render_at(precedence::ARG);
        let key_text = key.render_at(precedence::ARG);
        obj.push_map_entry(key_text, value);
    } else {
        let obj_text = obj.render_at(precedence::ATOM);
        let value = d.pop(cursor)?.render_at(precedence::NONE);
        d.emit(cursor.get_line(), format!("{}[{}] = {}", obj_text, key.text(), value));
    }
    Ok(())
}

fn inplace_symbol(op: Mnemonic) -> &'static str {
    use Mnemonic::*;
    match op {
        InplaceAdd => "+=",
        InplaceAnd => "&=",
        InplaceDivide => "/=",
        InplaceLshift => "<<=",
        InplaceModulo => "%=",
        InplaceMultiply => "*=",
        InplaceOr => "|=",
        InplacePower => "**=",
        InplaceRshift => ">>=",
        InplaceSubtract => "-=",
        InplaceXor => "^=",
        _ => unreachable!("{:?} is not an in-place operator opcode", op),
    }
}

/// Augmented assignment. The compiler lowers `lhs op= rhs` to the
/// binary op followed by the ordinary store sequence for `lhs`; this
/// handler consumes that follow-up store (and the extra duplicate
/// operands it needs for subscript/attribute targets) rather than
/// re-emitting it as a second statement.
pub(super) fn inplace_op(d: &mut Decompiler, cursor: &mut Cursor, op: Mnemonic) -> Result<()> {
    use Mnemonic::*;
    cursor.read_opcode(&[op])?;
    let symbol = inplace_symbol(op);
    let y = d.pop(cursor)?.render_at(precedence::NONE);
    let x = d.pop(cursor)?.render_at(precedence::NONE);
    let follow = cursor.read_opcode(&[RotThree, RotTwo, StoreFast, StoreGlobal])?;
    match follow {
        StoreFast | StoreGlobal => {
            cursor.read_operand()?;
        }
        RotThree => {
            cursor.read_opcode(&[StoreSubscr])?;
            d.pop(cursor)?;
            d.pop(cursor)?;
        }
        RotTwo => {
            cursor.read_opcode(&[StoreAttr])?;
            cursor.read_operand()?;
            d.pop(cursor)?;
        }
        _ => unreachable!(),
    }
    d.emit(cursor.get_line(), format!("{} {} {}", x, symbol, y));
    Ok(())
}
