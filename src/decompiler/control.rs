//! Opcode handlers — structural recognizers (component G): loops,
//! conditionals (and/or/assert disambiguation), comparison chaining,
//! function/class creation, imports, and exception handling.

use std::rc::Rc;

use crate::codeobject::{CodeObject, Constant, Version};
use crate::cursor::Cursor;
use crate::dictionary::{self, Mnemonic};
use crate::error::{DecompileError, Result};
use crate::expr::Expr;
use crate::precedence;

use super::Decompiler;

pub(super) fn setup_loop(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::SetupLoop])?;
    let leap = cursor.read_operand()?;
    debug_assert!(d.loop_ctx.is_none(), "nested SETUP_LOOP without an intervening terminator");
    let start = cursor.position();
    d.loop_ctx = Some((start, start + leap as usize));
    Ok(())
}

pub(super) fn for_loop(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    use Mnemonic::*;
    cursor.read_opcode(&[ForLoop])?;
    let leap = cursor.read_operand()?;
    let loopcleanup = cursor.position() + leap as usize;
    d.pop(cursor)?; // sequence index
    let forlist = d.pop(cursor)?;
    let forvar = build_target(d, cursor)?.render_at(precedence::NONE);
    let head = format!("for {} in {}:", forvar, forlist.text());
    let lineno = cursor.get_line();

    let mut child = Decompiler::new(d.version);
    child.decompile(cursor, &[JumpAbsolute])?;
    let mut body = child.into_statements();
    body.fill_pass_if_empty(lineno);
    body.indent();
    d.lines.attach_clause(cursor, lineno, &head, body);

    cursor.read_opcode(&[JumpAbsolute])?;
    cursor.read_operand()?; // back to FOR_LOOP
    debug_assert_eq!(cursor.position(), loopcleanup);
    cursor.read_opcode(&[PopBlock])?;
    let (_, end) = d.loop_ctx.take().expect("FOR_LOOP without an active loop context");
    if cursor.position() < end {
        let lineno = cursor.get_line();
        cursor.push_stop(end);
        let mut child = Decompiler::new(d.version);
        child.decompile(cursor, &[])?;
        cursor.pop_stop();
        let mut body = child.into_statements();
        body.fill_pass_if_empty(lineno);
        body.indent();
        d.lines.attach_clause(cursor, lineno, "else:", body);
    }
    debug_assert_eq!(cursor.position(), end);
    Ok(())
}

pub(super) fn jump_if_false(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    use Mnemonic::*;
    cursor.read_opcode(&[JumpIfFalse])?;
    let leap = cursor.read_operand()?;
    let endcond = cursor.position() + leap as usize;
    cursor.read_opcode(&[PopTop])?;
    let lineno = cursor.get_line();

    cursor.push_stop(endcond);
    let mut child = Decompiler::new(d.version);
    if d.loop_ctx.is_none() {
        child.decompile(cursor, &[JumpForward])?;
    } else {
        child.decompile(cursor, &[JumpAbsolute])?;
    }
    cursor.pop_stop();
    let (mut stack, child_statements) = child.into_stack_and_statements();

    if !stack.is_empty() {
        if stack.len() == 1 {
            // `cond and rhs`
            let x = d.pop(cursor)?.render_at(precedence::AND + 1);
            let y = stack.pop().unwrap().render_at(precedence::AND);
            d.push(Expr::composite(format!("{} and {}", x, y), precedence::AND));
        } else {
            // `assert test[, msg]`, reconstructed from a nested JUMP_IF_TRUE raise.
            d.pop(cursor)?;
            let test = stack.pop().unwrap().render_at(precedence::ARG);
            let value = stack.pop().unwrap();
            if value.is_none_constant() {
                d.emit(lineno, format!("assert {}", test));
            } else {
                d.emit(lineno, format!("assert {}, {}", test, value.render_at(precedence::ARG)));
            }
            cursor.read_opcode(&[PopTop])?;
        }
        return Ok(());
    }

    let condition = d.pop(cursor)?;
    let mut body = child_statements;
    body.fill_pass_if_empty(lineno);
    body.indent();

    if d.loop_ctx.is_none() {
        d.lines.attach_clause(cursor, lineno, &format!("if {}:", condition.render_at(precedence::NONE)), body);
        cursor.read_opcode(&[JumpForward])?;
        let leap = cursor.read_operand()?;
        let end = cursor.position() + leap as usize;
        cursor.read_opcode(&[PopTop])?;
        while cursor.position() < end {
            let branch_line = cursor.get_line();
            cursor.push_stop(end);
            let mut branch = Decompiler::new(d.version);
            branch.decompile(cursor, &[JumpForward])?;
            cursor.pop_stop();
            let mut branch_body = branch.into_statements();
            branch_body.fill_pass_if_empty(branch_line);
            let max_line = branch_body.max_line().unwrap_or(branch_line);
            // `elif` sits at the same nesting depth as this `if`, so it
            // gets no extra indent; any other branch is a nested block.
            if branch_body.line_at(branch_line).map(|t| t.ends_with(':')).unwrap_or(false) {
                let text = branch_body.remove_line(branch_line).unwrap();
                branch_body.emit(branch_line, format!("el{}", text));
                d.lines.splice(branch_body);
            } else {
                branch_body.indent();
                if let Some(text) = branch_body.line_at(branch_line) {
                    let inline = text.trim().to_string();
                    branch_body.remove_line(branch_line);
                    d.emit(branch_line, format!("else: {}", inline));
                    d.lines.splice(branch_body);
                } else {
                    d.emit(branch_line, "else:");
                    d.lines.splice(branch_body);
                }
            }
            cursor.set_line(max_line + 1);
        }
        debug_assert_eq!(cursor.position(), end);
    } else {
        d.lines.attach_clause(cursor, lineno, &format!("while {}:", condition.render_at(precedence::NONE)), body);
        cursor.read_opcode(&[JumpAbsolute])?;
        let oparg = cursor.read_operand()?;
        debug_assert_eq!(oparg as usize, d.loop_ctx.unwrap().0);
        cursor.read_opcode(&[PopTop])?;
        cursor.read_opcode(&[PopBlock])?;
        let (_, end) = d.loop_ctx.take().unwrap();
        if cursor.position() < end {
            let lineno = cursor.get_line();
            cursor.push_stop(end);
            let mut child = Decompiler::new(d.version);
            child.decompile(cursor, &[])?;
            cursor.pop_stop();
            let mut body = child.into_statements();
            body.fill_pass_if_empty(lineno);
            body.indent();
            d.lines.attach_clause(cursor, lineno, "else:", body);
        }
        debug_assert_eq!(cursor.position(), end);
    }
    Ok(())
}

pub(super) fn jump_if_true(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    use Mnemonic::*;
    cursor.read_opcode(&[JumpIfTrue])?;
    let leap = cursor.read_operand()?;
    let end = cursor.position() + leap as usize;
    cursor.read_opcode(&[PopTop])?;

    cursor.push_stop(end);
    let mut child = Decompiler::new(d.version);
    child.decompile(cursor, &[RaiseVarargs])?;
    cursor.pop_stop();
    let mut stack = child.into_stack();
    if stack.is_empty() {
        return Err(DecompileError::mismatch(cursor.position(), "non-empty sub-expression stack", "empty stack"));
    }

    if cursor.position() == end {
        // plain `lhs or rhs`
        let x = d.pop(cursor)?.render_at(precedence::OR + 1);
        let y = stack.pop().unwrap().render_at(precedence::OR);
        d.push(Expr::composite(format!("{} or {}", x, y), precedence::OR));
    } else {
        // `assert`-style: `test or raise AssertionError[, msg]`
        let test = d.pop(cursor)?;
        cursor.read_opcode(&[RaiseVarargs])?;
        let oparg = cursor.read_operand()?;
        if oparg == 1 {
            d.push(Expr::constant(Constant::None));
        } else {
            let value = stack.pop().ok_or_else(|| {
                DecompileError::mismatch(cursor.position(), "raise message expression", "empty stack")
            })?;
            d.push(value);
        }
        d.push(test);
    }
    debug_assert_eq!(cursor.position(), end);
    Ok(())
}

pub(super) fn jump_absolute(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    cursor.read_opcode(&[Mnemonic::JumpAbsolute])?;
    cursor.read_operand()?;
    d.emit(cursor.get_line(), "continue");
    Ok(())
}

pub(super) fn rot_three(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    use Mnemonic::*;
    cursor.read_opcode(&[RotThree])?;
    d.pop(cursor)?; // duplicate of the right-hand operand
    let y0 = d.pop(cursor)?.render_at(precedence::CMP + 1);
    let x = d.pop(cursor)?.render_at(precedence::CMP + 1);
    cursor.read_opcode(&[CompareOp])?;
    let oparg = cursor.read_operand()?;
    let op = comparison_symbol(cursor, oparg)?;
    let mut chain = format!("{} {} {}", x, op, y0);

    let mut opcode = cursor.read_opcode(&[JumpIfFalse])?;
    let mut leap = cursor.read_operand()?;
    let stop1 = cursor.position() + leap as usize;
    while opcode == JumpIfFalse {
        debug_assert_eq!(cursor.position() + leap as usize, stop1);
        cursor.read_opcode(&[PopTop])?;
        // 6 bytes back: the COMPARE_OP + JUMP_IF_FALSE pair this link's
        // right operand must not read past.
        cursor.push_stop(stop1 - 6);
        let mut child = Decompiler::new(d.version);
        child.decompile(cursor, &[RotThree])?;
        cursor.pop_stop();
        let mut stack = child.into_stack();
        let y = stack
            .pop()
            .ok_or_else(|| DecompileError::mismatch(cursor.position(), "comparison operand", "empty stack"))?
            .render_at(precedence::CMP + 1);
        let mut next = cursor.read_opcode(&[CompareOp, RotThree])?;
        if next == RotThree {
            next = cursor.read_opcode(&[CompareOp])?;
        }
        debug_assert_eq!(next, CompareOp);
        let oparg = cursor.read_operand()?;
        let op = comparison_symbol(cursor, oparg)?;
        chain = format!("{} {} {}", chain, op, y);
        opcode = cursor.read_opcode(&[JumpIfFalse, JumpForward])?;
        leap = cursor.read_operand()?;
    }
    debug_assert_eq!(leap, 2);
    debug_assert_eq!(cursor.position(), stop1);
    cursor.read_opcode(&[RotTwo])?;
    cursor.read_opcode(&[PopTop])?;
    d.push(Expr::chain(chain));
    Ok(())
}

fn comparison_symbol(cursor: &Cursor, oparg: u32) -> Result<&'static str> {
    dictionary::COMPARE_OPS
        .get(oparg as usize)
        .copied()
        .ok_or_else(|| DecompileError::malformed(cursor.position(), format!("comparison operator {} out of range", oparg)))
}

fn local_name(code: &CodeObject, idx: usize, pos: usize) -> Result<String> {
    code.locals
        .get(idx)
        .cloned()
        .ok_or_else(|| DecompileError::malformed(pos, format!("local index {} out of range", idx)))
}

pub(super) fn make_function(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    use Mnemonic::*;
    cursor.read_opcode(&[MakeFunction])?;
    let mut defaultcount = cursor.read_operand()?;
    let co_expr = d.pop(cursor)?;
    let code = match co_expr {
        Expr::Const(Constant::Code(c)) => c,
        _ => return Err(DecompileError::mismatch(cursor.position(), "a code constant", "other value")),
    };

    if code.is_lambda() {
        let mut params: Vec<String> = Vec::new();
        let mut argcount = code.argcount as usize;
        while argcount > 0 {
            argcount -= 1;
            let name = local_name(&code, argcount, cursor.position())?;
            if defaultcount > 0 {
                defaultcount -= 1;
                let default = d.pop(cursor)?.render_at(precedence::ARG);
                params.push(format!("{}={}", name, default));
            } else {
                params.push(name);
            }
        }
        params.reverse();
        let mut argcount = code.argcount as usize;
        if code.has_varargs() {
            params.push(format!("*{}", local_name(&code, argcount, cursor.position())?));
            argcount += 1;
        }
        if code.has_kwargs() {
            params.push(format!("**{}", local_name(&code, argcount, cursor.position())?));
        }
        let paramlist = params.join(", ");

        let mut body_cursor = Cursor::new(Rc::clone(&code));
        let mut body = Decompiler::new(d.version);
        body.decompile(&mut body_cursor, &[ReturnValue])?;
        let mut stack = body.into_stack();
        let y = stack
            .pop()
            .ok_or_else(|| DecompileError::mismatch(cursor.position(), "lambda body expression", "empty stack"))?
            .render_at(precedence::LAMBDA);
        d.push(Expr::composite(format!("lambda {}: {}", paramlist, y), precedence::LAMBDA));
        return Ok(());
    }

    let opcode = cursor.read_opcode(&[CallFunction, StoreFast, StoreName])?;
    if opcode == CallFunction {
        let oparg = cursor.read_operand()?;
        debug_assert_eq!(oparg, 0);
        cursor.read_opcode(&[BuildClass])?;
        let bases = d.pop(cursor)?;
        let name = d.pop(cursor)?;
        let store_op = cursor.read_opcode(&[StoreFast, StoreName])?;
        let store_oparg = cursor.read_operand()?;
        let classname =
            if store_op == StoreFast { cursor.get_local(store_oparg)? } else { cursor.get_name(store_oparg)? };
        debug_assert_eq!(name.as_identifier_text(), classname);
        let header = match &bases {
            Expr::Tuple(values) if !values.is_empty() => format!("{}({})", classname, values.join(", ")),
            _ => classname,
        };
        let lineno = cursor.get_line();
        let mut body_cursor = Cursor::new(Rc::clone(&code));
        let mut body_decompiler = Decompiler::new(d.version);
        body_decompiler.decompile(&mut body_cursor, &[])?;
        let mut body = body_decompiler.into_statements();
        body.fill_pass_if_empty(lineno);
        body.indent();
        d.lines.attach_clause(cursor, lineno, &format!("class {}:", header), body);
    } else {
        let oparg = cursor.read_operand()?;
        let funcname = if opcode == StoreFast { cursor.get_local(oparg)? } else { cursor.get_name(oparg)? };

        let mut params: Vec<String> = Vec::new();
        let mut argcount = code.argcount as usize;
        while argcount > 0 {
            argcount -= 1;
            let name = local_name(&code, argcount, cursor.position())?;
            if defaultcount > 0 {
                defaultcount -= 1;
                let default = d.pop(cursor)?.render_at(precedence::ARG);
                params.push(format!("{}={}", name, default));
            } else {
                params.push(name);
            }
        }
        params.reverse();
        let mut argcount = code.argcount as usize;
        if code.has_varargs() {
            params.push(format!("*{}", local_name(&code, argcount, cursor.position())?));
            argcount += 1;
        }
        if code.has_kwargs() {
            params.push(format!("**{}", local_name(&code, argcount, cursor.position())?));
        }
        let head = format!("def {}({}):", funcname, params.join(", "));
        let lineno = cursor.get_line();
        let mut body_cursor = Cursor::new(Rc::clone(&code));
        let mut body_decompiler = Decompiler::new(d.version);
        body_decompiler.decompile(&mut body_cursor, &[])?;
        let mut body = body_decompiler.into_statements();
        body.fill_pass_if_empty(lineno);
        body.indent();
        d.lines.attach_clause(cursor, lineno, &head, body);
    }
    Ok(())
}

pub(super) fn import_name(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    use Mnemonic::*;
    let mut names: Vec<String> = Vec::new();
    while cursor.next_opcode()? == Some(ImportName) {
        cursor.read_opcode(&[ImportName])?;
        if d.version >= Version::V2_0 {
            d.pop(cursor)?;
        }
        let oparg = cursor.read_operand()?;
        let module = cursor.get_name(oparg)?;
        let mut opname = cursor.read_opcode(&[ImportFrom, ImportStar, StoreFast, StoreName])?;

        if opname == ImportFrom || opname == ImportStar {
            if !names.is_empty() {
                d.emit(cursor.get_line(), format!("import {}", names.join(", ")));
                names.clear();
            }
            let objs = if opname == ImportStar {
                "*".to_string()
            } else {
                let mut from_names: Vec<String> = Vec::new();
                while opname == ImportFrom {
                    let oparg = cursor.read_operand()?;
                    let name1 = cursor.get_name(oparg)?;
                    let name2 = if d.version >= Version::V2_0 {
                        let store_op = cursor.read_opcode(&[StoreFast, StoreName])?;
                        let store_oparg = cursor.read_operand()?;
                        if store_op == StoreFast { cursor.get_local(store_oparg)? } else { cursor.get_name(store_oparg)? }
                    } else {
                        name1.clone()
                    };
                    if name1 == name2 {
                        from_names.push(name1);
                    } else {
                        from_names.push(format!("{} as {}", name1, name2));
                    }
                    opname = cursor.read_opcode(&[ImportFrom, PopTop])?;
                }
                from_names.join(", ")
            };
            d.emit(cursor.get_line(), format!("from {} import {}", module, objs));
            names.clear();
        } else {
            let oparg = cursor.read_operand()?;
            let name = if opname == StoreFast { cursor.get_local(oparg)? } else { cursor.get_name(oparg)? };
            if module == name {
                names.push(module);
            } else {
                names.push(format!("{} as {}", module, name));
            }
        }
    }
    if !names.is_empty() {
        d.emit(cursor.get_line(), format!("import {}", names.join(", ")));
    }
    Ok(())
}

fn handle_except_clause(d: &mut Decompiler, cursor: &mut Cursor) -> Result<usize> {
    use Mnemonic::*;
    let opcode = cursor.read_opcode(&[DupTop, PopTop])?;
    let lineno = cursor.get_line();

    let (head, nextclause) = if opcode == DupTop {
        let mut child = Decompiler::new(d.version);
        child.decompile(cursor, &[CompareOp])?;
        let mut stack = child.into_stack();
        let exc_type = stack
            .pop()
            .ok_or_else(|| DecompileError::mismatch(cursor.position(), "exception type expression", "empty stack"))?
            .render_at(precedence::ARG);
        cursor.read_opcode(&[CompareOp])?;
        let oparg = cursor.read_operand()?;
        debug_assert_eq!(oparg as u16, dictionary::EXCEPTION_MATCH);
        cursor.read_opcode(&[JumpIfFalse])?;
        let leap = cursor.read_operand()?;
        let nextclause = cursor.position() + leap as usize;
        cursor.read_opcode(&[PopTop])?; // result of the type test
        cursor.read_opcode(&[PopTop])?; // exc_type
        let head = if cursor.next_opcode()? == Some(PopTop) {
            cursor.read_opcode(&[PopTop])?; // exc_value, unused
            format!("except {}:", exc_type)
        } else {
            let exc_value = build_target(d, cursor)?.render_at(precedence::ARG);
            format!("except {}, {}:", exc_type, exc_value)
        };
        (head, Some(nextclause))
    } else {
        cursor.read_opcode(&[PopTop])?; // exc_value, unused
        ("except:".to_string(), None)
    };
    cursor.read_opcode(&[PopTop])?; // exc_tb, unused

    let mut child = Decompiler::new(d.version);
    child.decompile(cursor, &[JumpForward])?;
    let mut body = child.into_statements();
    body.fill_pass_if_empty(lineno);
    body.indent();
    d.lines.attach_clause(cursor, lineno, &head, body);

    cursor.read_opcode(&[JumpForward])?;
    let leap = cursor.read_operand()?;
    let end = cursor.position() + leap as usize;
    if let Some(nextclause) = nextclause {
        debug_assert_eq!(cursor.position(), nextclause);
        cursor.read_opcode(&[PopTop])?;
    }
    Ok(end)
}

pub(super) fn setup_except(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    use Mnemonic::*;
    cursor.read_opcode(&[SetupExcept])?;
    let leap = cursor.read_operand()?;
    let firstexceptclause = cursor.position() + leap as usize;
    let lineno = cursor.get_line();

    let mut child = Decompiler::new(d.version);
    child.decompile(cursor, &[PopBlock])?;
    let mut body = child.into_statements();
    body.fill_pass_if_empty(lineno);
    body.indent();
    d.lines.attach_clause(cursor, lineno, "try:", body);

    cursor.read_opcode(&[PopBlock])?;
    cursor.read_opcode(&[JumpForward])?;
    let leap = cursor.read_operand()?;
    let elseclause = cursor.position() + leap as usize;
    debug_assert_eq!(cursor.position(), firstexceptclause);

    let end = handle_except_clause(d, cursor)?;
    while cursor.next_opcode()? != Some(EndFinally) {
        let end1 = handle_except_clause(d, cursor)?;
        debug_assert_eq!(end1, end);
    }
    cursor.read_opcode(&[EndFinally])?;
    debug_assert_eq!(cursor.position(), elseclause);

    if elseclause < end {
        let lineno = cursor.get_line();
        cursor.push_stop(end);
        let mut child = Decompiler::new(d.version);
        child.decompile(cursor, &[])?;
        cursor.pop_stop();
        let mut body = child.into_statements();
        body.fill_pass_if_empty(lineno);
        body.indent();
        d.lines.attach_clause(cursor, lineno, "else:", body);
    }
    debug_assert_eq!(cursor.position(), end);
    Ok(())
}

pub(super) fn setup_finally(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    use Mnemonic::*;
    cursor.read_opcode(&[SetupFinally])?;
    let leap = cursor.read_operand()?;
    let finallyclause = cursor.position() + leap as usize;
    let lineno = cursor.get_line();

    let mut child = Decompiler::new(d.version);
    child.decompile(cursor, &[PopBlock])?;
    let mut body = child.into_statements();
    body.fill_pass_if_empty(lineno);
    body.indent();
    d.lines.attach_clause(cursor, lineno, "try:", body);

    cursor.read_opcode(&[PopBlock])?;
    cursor.read_opcode(&[LoadConst])?;
    let oparg = cursor.read_operand()?;
    debug_assert_eq!(oparg, 0);
    debug_assert_eq!(cursor.position(), finallyclause);

    let lineno = cursor.get_line();
    let mut child = Decompiler::new(d.version);
    child.decompile(cursor, &[EndFinally])?;
    let mut body = child.into_statements();
    body.fill_pass_if_empty(lineno);
    body.indent();
    d.lines.attach_clause(cursor, lineno, "finally:", body);
    cursor.read_opcode(&[EndFinally])?;
    Ok(())
}

fn pop_target_operand(stack: &mut Vec<Expr>, pos: usize) -> Result<Expr> {
    stack.pop().ok_or_else(|| DecompileError::mismatch(pos, "assignment-target sub-expression", "empty stack"))
}

/// Recognize an assignment target: a single name/attribute/subscript,
/// or a tuple of nested targets behind `UNPACK_SEQUENCE`/`UNPACK_TUPLE`.
fn build_target(d: &mut Decompiler, cursor: &mut Cursor) -> Result<Expr> {
    use Mnemonic::*;
    let next = cursor.next_opcode()?;
    let direct = matches!(next, Some(StoreFast | StoreGlobal | StoreName | UnpackSequence | UnpackTuple));
    let mut child_stack: Vec<Expr> = Vec::new();
    if !direct {
        let mut child = Decompiler::new(d.version);
        child.decompile(cursor, &[StoreAttr, StoreSlice0, StoreSlice1, StoreSlice2, StoreSlice3, StoreSubscr])?;
        child_stack = child.into_stack();
    }
    let opcode = cursor.read_opcode(&[])?;
    let target = match opcode {
        StoreAttr => {
            let name = pop_target_operand(&mut child_stack, cursor.position())?.render_at(precedence::ATOM);
            let oparg = cursor.read_operand()?;
            let attr = cursor.get_name(oparg)?;
            Expr::composite(format!("{}.{}", name, attr), precedence::ATOM)
        }
        StoreFast => {
            let oparg = cursor.read_operand()?;
            Expr::local(cursor.get_local(oparg)?)
        }
        StoreGlobal => {
            let oparg = cursor.read_operand()?;
            Expr::global(cursor.get_name(oparg)?)
        }
        StoreName => {
            let oparg = cursor.read_operand()?;
            Expr::local(cursor.get_name(oparg)?)
        }
        StoreSlice0 => {
            let x = pop_target_operand(&mut child_stack, cursor.position())?.render_at(precedence::ATOM);
            Expr::composite(format!("{}[:]", x), precedence::ATOM)
        }
        StoreSlice1 => {
            let y = pop_target_operand(&mut child_stack, cursor.position())?.render_at(precedence::ARG);
            let x = pop_target_operand(&mut child_stack, cursor.position())?.render_at(precedence::ATOM);
            Expr::composite(format!("{}[{}:]", x, y), precedence::ATOM)
        }
        StoreSlice2 => {
            let z = pop_target_operand(&mut child_stack, cursor.position())?.render_at(precedence::ARG);
            let x = pop_target_operand(&mut child_stack, cursor.position())?.render_at(precedence::ATOM);
            Expr::composite(format!("{}[:{}]", x, z), precedence::ATOM)
        }
        StoreSlice3 => {
            let z = pop_target_operand(&mut child_stack, cursor.position())?.render_at(precedence::ARG);
            let y = pop_target_operand(&mut child_stack, cursor.position())?.render_at(precedence::ARG);
            let x = pop_target_operand(&mut child_stack, cursor.position())?.render_at(precedence::ATOM);
            Expr::composite(format!("{}[{}:{}]", x, y, z), precedence::ATOM)
        }
        StoreSubscr => {
            let key = pop_target_operand(&mut child_stack, cursor.position())?.render_at(precedence::NONE);
            let name = pop_target_operand(&mut child_stack, cursor.position())?.render_at(precedence::ATOM);
            Expr::composite(format!("{}[{}]", name, key), precedence::ATOM)
        }
        UnpackSequence | UnpackTuple => {
            let count = cursor.read_operand()?;
            let mut values = Vec::with_capacity(count as usize);
            for _ in 0..count {
                values.push(build_target(d, cursor)?.render_at(precedence::ARG));
            }
            Expr::tuple(values)
        }
        other => {
            return Err(DecompileError::mismatch(cursor.position(), "a valid assignment-target opcode", other.name()));
        }
    };
    Ok(target)
}

pub(super) fn unpack_sequence(d: &mut Decompiler, cursor: &mut Cursor) -> Result<()> {
    let seq = build_target(d, cursor)?.render_at(precedence::NONE);
    let rhs = d.pop(cursor)?.render_at(precedence::NONE);
    d.emit(cursor.get_line(), format!("{} = {}", seq, rhs));
    Ok(())
}
