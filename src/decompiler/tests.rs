//! Integration tests driving the whole decompiler over hand-assembled
//! instruction streams. Each fixture is built byte by byte rather than
//! from a real compiler, so line numbers and jump targets are derived
//! by hand to land exactly where the opcode handlers expect them.

use std::rc::Rc;

use crate::codeobject::{CodeObject, Constant, LineTable, Version};

use super::decompile_code;

fn code_object(
    instructions: Vec<u8>,
    constants: Vec<Constant>,
    names: &[&str],
    line_table: Vec<(u8, u8)>,
) -> Rc<CodeObject> {
    Rc::new(CodeObject {
        instructions,
        constants,
        locals: Vec::new(),
        names: names.iter().map(|s| s.to_string()).collect(),
        argcount: 0,
        flags: 0,
        name: "<module>".to_string(),
        first_line: 1,
        line_table: LineTable(line_table),
    })
}

fn run(code: Rc<CodeObject>) -> String {
    let lines = decompile_code(code, Version::V2_0).expect("decompile should succeed");
    super::format_lines(&lines)
}

#[test]
fn arithmetic_precedence_skips_parens_around_higher_precedence_operand() {
    // a = b + c * d
    let instructions = vec![
        108, 1, 0, // LOAD_NAME b
        108, 2, 0, // LOAD_NAME c
        108, 3, 0, // LOAD_NAME d
        20, // BINARY_MULTIPLY
        23, // BINARY_ADD
        100, 0, 0, // STORE_NAME a
    ];
    let code = code_object(instructions, Vec::new(), &["a", "b", "c", "d"], Vec::new());
    assert_eq!(run(code), "a = b + c * d");
}

#[test]
fn or_inside_and_gets_parenthesized() {
    // x = (a or b) and c
    let instructions = vec![
        108, 1, 0, // LOAD_NAME a
        118, 4, 0, // JUMP_IF_TRUE +4
        1, // POP_TOP
        108, 2, 0, // LOAD_NAME b
        117, 4, 0, // JUMP_IF_FALSE +4
        1, // POP_TOP
        108, 3, 0, // LOAD_NAME c
        100, 0, 0, // STORE_NAME x
    ];
    let code = code_object(instructions, Vec::new(), &["x", "a", "b", "c"], Vec::new());
    assert_eq!(run(code), "x = (a or b) and c");
}

#[test]
fn for_loop_else_clause_is_indented_on_its_own_lines() {
    // for i in xs:
    //     y
    // else:
    //     z
    let instructions = vec![
        122, 24, 0, // SETUP_LOOP +24
        108, 0, 0, // LOAD_NAME xs
        107, 0, 0, // LOAD_CONST 0
        120, 10, 0, // FOR_LOOP +10
        100, 1, 0, // STORE_NAME i
        108, 2, 0, // LOAD_NAME y
        1, // POP_TOP
        119, 9, 0, // JUMP_ABSOLUTE 9
        85, // POP_BLOCK
        108, 3, 0, // LOAD_NAME z
        1, // POP_TOP
    ];
    let constants = vec![Constant::Int(0)];
    let line_table = vec![(15, 1), (11, 2)];
    let code = code_object(instructions, constants, &["xs", "i", "y", "z"], line_table);
    assert_eq!(run(code), "for i in xs:\n    y\nelse:\n    z");
}

#[test]
fn try_except_except_chains_without_an_else_clause() {
    // try:
    //     f()
    // except IOError, e:
    //     g(e)
    // except:
    //     h()
    let instructions = vec![
        123, 11, 0, // SETUP_EXCEPT +11
        108, 0, 0, // LOAD_NAME f
        131, 0, 0, // CALL_FUNCTION 0
        1, // POP_TOP
        85, // POP_BLOCK
        116, 44, 0, // JUMP_FORWARD +44
        4, // DUP_TOP
        121, 4, 0, // LOAD_GLOBAL IOError
        113, 10, 0, // COMPARE_OP exception-match
        117, 19, 0, // JUMP_IF_FALSE +19
        1, // POP_TOP (type test result)
        1, // POP_TOP (exc_type)
        100, 3, 0, // STORE_NAME e
        1, // POP_TOP (exc_tb)
        108, 1, 0, // LOAD_NAME g
        108, 3, 0, // LOAD_NAME e
        131, 1, 0, // CALL_FUNCTION 1
        1, // POP_TOP
        116, 15, 0, // JUMP_FORWARD +15
        1, // POP_TOP (arrival at next clause)
        1, // POP_TOP (bare except marker)
        1, // POP_TOP (exc_value, unused)
        1, // POP_TOP (exc_tb, unused)
        108, 2, 0, // LOAD_NAME h
        131, 0, 0, // CALL_FUNCTION 0
        1, // POP_TOP
        116, 1, 0, // JUMP_FORWARD +1
        86, // END_FINALLY
    ];
    let line_table = vec![(5, 1), (30, 2), (15, 2)];
    let code = code_object(instructions, Vec::new(), &["f", "g", "h", "e", "IOError"], line_table);
    assert_eq!(run(code), "try:\n    f()\nexcept IOError, e:\n    g(e)\nexcept:\n    h()");
}

#[test]
fn from_import_with_alias_coalesces_into_one_statement() {
    // from mod import a as x, b
    let instructions = vec![
        107, 0, 0, // LOAD_CONST ("a", "b")
        114, 0, 0, // IMPORT_NAME mod
        115, 1, 0, // IMPORT_FROM a
        100, 2, 0, // STORE_NAME x
        115, 3, 0, // IMPORT_FROM b
        100, 3, 0, // STORE_NAME b
        1, // POP_TOP
    ];
    let fromlist = Constant::Tuple(vec![Constant::Str("a".to_string()), Constant::Str("b".to_string())]);
    let code = code_object(instructions, vec![fromlist], &["mod", "a", "x", "b"], Vec::new());
    assert_eq!(run(code), "from mod import a as x, b");
}

#[test]
fn del_batch_coalesces_same_line_deletes() {
    // del a, b
    let instructions = vec![
        101, 0, 0, // DELETE_NAME a
        101, 1, 0, // DELETE_NAME b
    ];
    let code = code_object(instructions, Vec::new(), &["a", "b"], Vec::new());
    assert_eq!(run(code), "del a, b");
}
