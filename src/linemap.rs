//! Line Map Resolver (component A): given a code object and a byte
//! offset, return the source line the compiler attributed to it.

use crate::codeobject::CodeObject;

/// Walk the compact `(byte_delta, line_delta)` line table. Each pair's
/// line applies to the half-open byte range
/// `[accum_before, accum_before + byte_delta)`. Must use unsigned byte
/// arithmetic and stop at the first pair whose cumulative byte offset
/// exceeds the query offset — the off-by-one trap a naive walk over
/// signed deltas or an inclusive bound would fall into.
pub fn line_of(code: &CodeObject, offset: usize) -> u32 {
    let mut line = code.first_line;
    let mut addr: usize = 0;
    for &(byte_delta, line_delta) in &code.line_table.0 {
        addr += byte_delta as usize;
        if addr > offset {
            break;
        }
        line += line_delta as u32;
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codeobject::LineTable;

    fn code_with_table(pairs: &[(u8, u8)], first_line: u32) -> CodeObject {
        CodeObject {
            instructions: Vec::new(),
            constants: Vec::new(),
            locals: Vec::new(),
            names: Vec::new(),
            argcount: 0,
            flags: 0,
            name: "<module>".to_string(),
            first_line,
            line_table: LineTable(pairs.to_vec()),
        }
    }

    #[test]
    fn empty_table_is_the_first_line() {
        let code = code_with_table(&[], 5);
        assert_eq!(line_of(&code, 0), 5);
        assert_eq!(line_of(&code, 100), 5);
    }

    #[test]
    fn walks_forward_by_cumulative_byte_offset() {
        // line 1 covers [0,3), line 2 covers [3,9), line 4 covers [9, ..)
        let code = code_with_table(&[(3, 1), (6, 2)], 1);
        assert_eq!(line_of(&code, 0), 1);
        assert_eq!(line_of(&code, 2), 1);
        assert_eq!(line_of(&code, 3), 2);
        assert_eq!(line_of(&code, 8), 2);
        assert_eq!(line_of(&code, 9), 4);
        assert_eq!(line_of(&code, 1000), 4);
    }
}
