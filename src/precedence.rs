//! Precedence lattice used only to decide where rendering must
//! parenthesize a subexpression. Not a semantic operator precedence
//! beyond that.

pub type Precedence = i32;

pub const ATOM: Precedence = 24;
pub const POWER: Precedence = 17;
pub const UNARY: Precedence = 16;
pub const MULT: Precedence = 15;
pub const ADD: Precedence = 14;
pub const SHIFT: Precedence = 13;
pub const BAND: Precedence = 12;
pub const BXOR: Precedence = 11;
pub const BOR: Precedence = 10;
pub const CMP: Precedence = 9;
pub const IS: Precedence = 8;
pub const IN: Precedence = 7;
pub const NOT: Precedence = 6;
pub const AND: Precedence = 5;
pub const OR: Precedence = 4;
pub const LAMBDA: Precedence = 3;
pub const ARG: Precedence = LAMBDA;
pub const COMMA: Precedence = 1;
pub const NONE: Precedence = 0;
