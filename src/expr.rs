//! Expression model: precedence-annotated tree nodes and the
//! rendering contract that decides when a subexpression must be
//! parenthesized.
//!
//! `Expression -> Atom -> (Constant, Local, Global, Map, Tuple)` in the
//! reference implementation collapses here to one tagged enum, per the
//! "Expression polymorphism" redesign: the polymorphic `GetString`
//! method becomes a single `render_at` match.

use std::cell::RefCell;
use std::rc::Rc;

use crate::codeobject::Constant;
use crate::precedence::{self, Precedence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentKind {
    Local,
    Global,
}

/// A key/value accumulator for a literal map display under
/// construction. Held behind `Rc<RefCell<_>>` because `DUP_TOP`
/// duplicates the stack entry by reference and a later `STORE_SUBSCR`
/// must mutate the same node the duplicate still points at — this is
/// the one place an expression node is mutated after being pushed.
pub type MapBuilder = Rc<RefCell<Vec<(String, String)>>>;

#[derive(Debug, Clone)]
pub enum Expr {
    Const(Constant),
    Ident { kind: IdentKind, name: String },
    Map(MapBuilder),
    Tuple(Vec<String>),
    /// Partial chained-comparison text, always at CMP precedence.
    Chain(String),
    /// General composite: already-rendered text paired with its
    /// precedence.
    Composite(String, Precedence),
}

impl Expr {
    pub fn local(name: impl Into<String>) -> Expr {
        Expr::Ident { kind: IdentKind::Local, name: name.into() }
    }

    pub fn global(name: impl Into<String>) -> Expr {
        Expr::Ident { kind: IdentKind::Global, name: name.into() }
    }

    pub fn constant(value: Constant) -> Expr {
        Expr::Const(value)
    }

    pub fn new_map() -> Expr {
        Expr::Map(Rc::new(RefCell::new(Vec::new())))
    }

    pub fn tuple(values: Vec<String>) -> Expr {
        Expr::Tuple(values)
    }

    pub fn chain(text: impl Into<String>) -> Expr {
        Expr::Chain(text.into())
    }

    pub fn composite(text: impl Into<String>, prec: Precedence) -> Expr {
        Expr::Composite(text.into(), prec)
    }

    pub fn precedence(&self) -> Precedence {
        match self {
            Expr::Const(_) => precedence::ATOM,
            Expr::Ident { .. } => precedence::ATOM,
            Expr::Map(_) => precedence::ATOM,
            Expr::Tuple(values) => {
                if values.len() <= 1 {
                    precedence::ATOM
                } else {
                    precedence::COMMA
                }
            }
            Expr::Chain(_) => precedence::CMP,
            Expr::Composite(_, p) => *p,
        }
    }

    /// Unparenthesized textual form.
    pub fn text(&self) -> String {
        match self {
            Expr::Const(c) => c.render(),
            Expr::Ident { name, .. } => name.clone(),
            Expr::Map(entries) => {
                let entries = entries.borrow();
                let joined: Vec<String> =
                    entries.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                format!("{{{}}}", joined.join(", "))
            }
            Expr::Tuple(values) => match values.len() {
                0 => "()".to_string(),
                1 => format!("({},)", values[0]),
                _ => values.join(", "),
            },
            Expr::Chain(text) => text.clone(),
            Expr::Composite(text, _) => text.clone(),
        }
    }

    /// Render as a value consumed in a context demanding precedence at
    /// least `min_prec`; parenthesize iff this node's own precedence is
    /// strictly less than `min_prec`.
    pub fn render_at(&self, min_prec: Precedence) -> String {
        if self.precedence() < min_prec {
            format!("({})", self.text())
        } else {
            self.text()
        }
    }

    /// Append a `key: value` entry to a map builder in place. Panics if
    /// called on anything but `Expr::Map` — callers only reach this
    /// after confirming the stack base is an open map builder.
    pub fn push_map_entry(&self, key: String, value: String) {
        match self {
            Expr::Map(entries) => entries.borrow_mut().push((key, value)),
            other => unreachable!("push_map_entry called on {:?}", other),
        }
    }

    pub fn is_none_constant(&self) -> bool {
        matches!(self, Expr::Const(Constant::None))
    }

    /// Raw identifier text, as used for a keyword-argument name: a
    /// string constant renders unquoted here, unlike `text()`, which
    /// would produce its `repr()`-style quoted form.
    pub fn as_identifier_text(&self) -> String {
        match self {
            Expr::Const(Constant::Str(s)) => s.clone(),
            other => other.text(),
        }
    }
}
