//! Statement Emitter (component E): a line-indexed map from source
//! line number to rendered statement text, plus the "attach as clause"
//! composition used by every control-flow idiom (`if cond:` + body,
//! `except E:` + body, and so on).

use std::collections::BTreeMap;

use crate::cursor::Cursor;

#[derive(Debug, Default, Clone)]
pub struct StatementMap {
    lines: BTreeMap<u32, String>,
}

impl StatementMap {
    pub fn new() -> StatementMap {
        StatementMap::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn max_line(&self) -> Option<u32> {
        self.lines.keys().next_back().copied()
    }

    /// Insert text at `line`, or append it after `"; "` if the line
    /// already holds a statement.
    pub fn emit(&mut self, line: u32, text: impl Into<String>) {
        let text = text.into();
        self.lines
            .entry(line)
            .and_modify(|existing| *existing = format!("{}; {}", existing, text))
            .or_insert(text);
    }

    /// Attach `body` under a clause head on `head_line`. If the body
    /// already has a statement on that exact line (a single-line
    /// clause body, e.g. `if x: return`), the head and that statement
    /// are combined on one line; otherwise the head stands alone and
    /// the body is spliced in at its own lines. Either way, advances
    /// the cursor's line watermark to one past the body's last line.
    pub fn attach_clause(
        &mut self,
        cursor: &mut Cursor,
        head_line: u32,
        head: &str,
        mut body: StatementMap,
    ) {
        let max_body_line = body.max_line().unwrap_or(head_line);
        if let Some(inline) = body.lines.remove(&head_line) {
            self.emit(head_line, format!("{} {}", head, inline.trim()));
        } else {
            self.emit(head_line, head.to_string());
        }
        self.splice(body);
        cursor.set_line(max_body_line + 1);
    }

    /// Merge another map's entries directly into this one, at their
    /// native lines (not through append semantics — the caller
    /// guarantees the two maps cover disjoint lines).
    pub fn splice(&mut self, other: StatementMap) {
        self.lines.extend(other.lines);
    }

    /// A nested body that never emitted a statement still needs a
    /// placeholder before it is attached as a clause.
    pub fn fill_pass_if_empty(&mut self, fallback_line: u32) {
        if self.lines.is_empty() {
            self.lines.insert(fallback_line, "pass".to_string());
        }
    }

    /// Consumes the map, returning `"pass"` at `fallback_line` if no
    /// statement was ever emitted — an empty function/class/branch
    /// body still needs a placeholder statement.
    pub fn into_sorted_or_pass(mut self, fallback_line: u32) -> Vec<(u32, String)> {
        self.fill_pass_if_empty(fallback_line);
        self.lines.into_iter().collect()
    }

    /// Prefix every line's text with one more level of four-space
    /// indentation. Called on a nested body right before it is merged
    /// into its enclosing scope, so the final flattened map carries the
    /// indentation its block nesting implies.
    pub fn indent(&mut self) {
        for text in self.lines.values_mut() {
            *text = format!("    {}", text);
        }
    }

    pub fn line_at(&self, line: u32) -> Option<&str> {
        self.lines.get(&line).map(String::as_str)
    }

    pub fn remove_line(&mut self, line: u32) -> Option<String> {
        self.lines.remove(&line)
    }

    #[cfg(test)]
    pub fn get(&self, line: u32) -> Option<&str> {
        self.line_at(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_appends_with_semicolon_on_repeat_line() {
        let mut m = StatementMap::new();
        m.emit(3, "a = 1");
        m.emit(3, "b = 2");
        assert_eq!(m.get(3), Some("a = 1; b = 2"));
    }

    #[test]
    fn into_sorted_or_pass_fills_empty_body() {
        let m = StatementMap::new();
        assert_eq!(m.into_sorted_or_pass(7), vec![(7, "pass".to_string())]);
    }

    #[test]
    fn indent_prefixes_every_line_once() {
        let mut m = StatementMap::new();
        m.emit(1, "a = 1");
        m.emit(2, "b = 2");
        m.indent();
        assert_eq!(m.get(1), Some("    a = 1"));
        assert_eq!(m.get(2), Some("    b = 2"));
    }
}
