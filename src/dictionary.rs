//! Bytecode dictionary: the external collaborator that supplies the
//! opcode schema — mnemonic by byte, `has_operand` by mnemonic, and the
//! comparison-operator table — for the bytecode version this crate
//! targets. `spec.md` treats this as out of scope beyond its contract;
//! it is implemented concretely here so the crate runs end to end.

use crate::precedence::{self, Precedence};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Mnemonic {
    PopTop = 1,
    RotTwo = 2,
    RotThree = 3,
    DupTop = 4,
    UnaryPositive = 10,
    UnaryNegative = 11,
    UnaryNot = 12,
    UnaryConvert = 13,
    UnaryInvert = 15,
    BinaryPower = 19,
    BinaryMultiply = 20,
    BinaryDivide = 21,
    BinaryModulo = 22,
    BinaryAdd = 23,
    BinarySubtract = 24,
    BinarySubscr = 25,
    Slice0 = 30,
    Slice1 = 31,
    Slice2 = 32,
    Slice3 = 33,
    StoreSlice0 = 40,
    StoreSlice1 = 41,
    StoreSlice2 = 42,
    StoreSlice3 = 43,
    DeleteSlice0 = 50,
    DeleteSlice1 = 51,
    DeleteSlice2 = 52,
    DeleteSlice3 = 53,
    StoreSubscr = 60,
    DeleteSubscr = 61,
    BinaryLshift = 62,
    BinaryRshift = 63,
    BinaryAnd = 64,
    BinaryXor = 65,
    BinaryOr = 66,
    InplaceAdd = 67,
    InplaceSubtract = 68,
    InplaceMultiply = 69,
    InplaceDivide = 70,
    InplaceModulo = 71,
    InplacePower = 72,
    InplaceLshift = 73,
    InplaceRshift = 74,
    InplaceAnd = 75,
    InplaceXor = 76,
    InplaceOr = 77,
    BreakLoop = 80,
    LoadLocals = 81,
    ReturnValue = 82,
    ImportStar = 83,
    ExecStmt = 84,
    PopBlock = 85,
    EndFinally = 86,
    BuildClass = 87,
    PrintItem = 88,
    PrintNewline = 89,
    PrintItemTo = 95,
    PrintNewlineTo = 96,

    // opcodes from here take a two-byte little-endian operand.
    StoreName = 100,
    DeleteName = 101,
    UnpackSequence = 102,
    StoreAttr = 103,
    DeleteAttr = 104,
    StoreGlobal = 105,
    DeleteGlobal = 106,
    LoadConst = 107,
    LoadName = 108,
    BuildTuple = 109,
    BuildList = 110,
    BuildMap = 111,
    LoadAttr = 112,
    CompareOp = 113,
    ImportName = 114,
    ImportFrom = 115,
    JumpForward = 116,
    JumpIfFalse = 117,
    JumpIfTrue = 118,
    JumpAbsolute = 119,
    ForLoop = 120,
    LoadGlobal = 121,
    SetupLoop = 122,
    SetupExcept = 123,
    SetupFinally = 124,
    LoadFast = 125,
    StoreFast = 126,
    DeleteFast = 127,
    RaiseVarargs = 130,
    CallFunction = 131,
    MakeFunction = 132,
    BuildSlice = 133,
    ExtendedArg = 134,
    CallFunctionVar = 140,
    CallFunctionKw = 141,
    CallFunctionVarKw = 142,
    DupTopx = 143,
    UnpackTuple = 144,
}

pub const HAVE_ARGUMENT: u8 = 100;

impl Mnemonic {
    pub fn from_byte(byte: u8) -> Option<Mnemonic> {
        use Mnemonic::*;
        Some(match byte {
            1 => PopTop,
            2 => RotTwo,
            3 => RotThree,
            4 => DupTop,
            10 => UnaryPositive,
            11 => UnaryNegative,
            12 => UnaryNot,
            13 => UnaryConvert,
            15 => UnaryInvert,
            19 => BinaryPower,
            20 => BinaryMultiply,
            21 => BinaryDivide,
            22 => BinaryModulo,
            23 => BinaryAdd,
            24 => BinarySubtract,
            25 => BinarySubscr,
            30 => Slice0,
            31 => Slice1,
            32 => Slice2,
            33 => Slice3,
            40 => StoreSlice0,
            41 => StoreSlice1,
            42 => StoreSlice2,
            43 => StoreSlice3,
            50 => DeleteSlice0,
            51 => DeleteSlice1,
            52 => DeleteSlice2,
            53 => DeleteSlice3,
            60 => StoreSubscr,
            61 => DeleteSubscr,
            62 => BinaryLshift,
            63 => BinaryRshift,
            64 => BinaryAnd,
            65 => BinaryXor,
            66 => BinaryOr,
            67 => InplaceAdd,
            68 => InplaceSubtract,
            69 => InplaceMultiply,
            70 => InplaceDivide,
            71 => InplaceModulo,
            72 => InplacePower,
            73 => InplaceLshift,
            74 => InplaceRshift,
            75 => InplaceAnd,
            76 => InplaceXor,
            77 => InplaceOr,
            80 => BreakLoop,
            81 => LoadLocals,
            82 => ReturnValue,
            83 => ImportStar,
            84 => ExecStmt,
            85 => PopBlock,
            86 => EndFinally,
            87 => BuildClass,
            88 => PrintItem,
            89 => PrintNewline,
            95 => PrintItemTo,
            96 => PrintNewlineTo,
            100 => StoreName,
            101 => DeleteName,
            102 => UnpackSequence,
            103 => StoreAttr,
            104 => DeleteAttr,
            105 => StoreGlobal,
            106 => DeleteGlobal,
            107 => LoadConst,
            108 => LoadName,
            109 => BuildTuple,
            110 => BuildList,
            111 => BuildMap,
            112 => LoadAttr,
            113 => CompareOp,
            114 => ImportName,
            115 => ImportFrom,
            116 => JumpForward,
            117 => JumpIfFalse,
            118 => JumpIfTrue,
            119 => JumpAbsolute,
            120 => ForLoop,
            121 => LoadGlobal,
            122 => SetupLoop,
            123 => SetupExcept,
            124 => SetupFinally,
            125 => LoadFast,
            126 => StoreFast,
            127 => DeleteFast,
            130 => RaiseVarargs,
            131 => CallFunction,
            132 => MakeFunction,
            133 => BuildSlice,
            134 => ExtendedArg,
            140 => CallFunctionVar,
            141 => CallFunctionKw,
            142 => CallFunctionVarKw,
            143 => DupTopx,
            144 => UnpackTuple,
            _ => return None,
        })
    }

    pub fn has_operand(self) -> bool {
        (self as u8) >= HAVE_ARGUMENT
    }

    pub fn name(self) -> &'static str {
        use Mnemonic::*;
        match self {
            PopTop => "POP_TOP",
            RotTwo => "ROT_TWO",
            RotThree => "ROT_THREE",
            DupTop => "DUP_TOP",
            DupTopx => "DUP_TOPX",
            UnaryPositive => "UNARY_POSITIVE",
            UnaryNegative => "UNARY_NEGATIVE",
            UnaryNot => "UNARY_NOT",
            UnaryConvert => "UNARY_CONVERT",
            UnaryInvert => "UNARY_INVERT",
            BinaryPower => "BINARY_POWER",
            BinaryMultiply => "BINARY_MULTIPLY",
            BinaryDivide => "BINARY_DIVIDE",
            BinaryModulo => "BINARY_MODULO",
            BinaryAdd => "BINARY_ADD",
            BinarySubtract => "BINARY_SUBTRACT",
            BinarySubscr => "BINARY_SUBSCR",
            Slice0 => "SLICE_0",
            Slice1 => "SLICE_1",
            Slice2 => "SLICE_2",
            Slice3 => "SLICE_3",
            StoreSlice0 => "STORE_SLICE_0",
            StoreSlice1 => "STORE_SLICE_1",
            StoreSlice2 => "STORE_SLICE_2",
            StoreSlice3 => "STORE_SLICE_3",
            DeleteSlice0 => "DELETE_SLICE_0",
            DeleteSlice1 => "DELETE_SLICE_1",
            DeleteSlice2 => "DELETE_SLICE_2",
            DeleteSlice3 => "DELETE_SLICE_3",
            StoreSubscr => "STORE_SUBSCR",
            DeleteSubscr => "DELETE_SUBSCR",
            BinaryLshift => "BINARY_LSHIFT",
            BinaryRshift => "BINARY_RSHIFT",
            BinaryAnd => "BINARY_AND",
            BinaryXor => "BINARY_XOR",
            BinaryOr => "BINARY_OR",
            InplaceAdd => "INPLACE_ADD",
            InplaceSubtract => "INPLACE_SUBTRACT",
            InplaceMultiply => "INPLACE_MULTIPLY",
            InplaceDivide => "INPLACE_DIVIDE",
            InplaceModulo => "INPLACE_MODULO",
            InplacePower => "INPLACE_POWER",
            InplaceLshift => "INPLACE_LSHIFT",
            InplaceRshift => "INPLACE_RSHIFT",
            InplaceAnd => "INPLACE_AND",
            InplaceXor => "INPLACE_XOR",
            InplaceOr => "INPLACE_OR",
            BreakLoop => "BREAK_LOOP",
            LoadLocals => "LOAD_LOCALS",
            ReturnValue => "RETURN_VALUE",
            ImportStar => "IMPORT_STAR",
            ExecStmt => "EXEC_STMT",
            PopBlock => "POP_BLOCK",
            EndFinally => "END_FINALLY",
            BuildClass => "BUILD_CLASS",
            PrintItem => "PRINT_ITEM",
            PrintNewline => "PRINT_NEWLINE",
            PrintItemTo => "PRINT_ITEM_TO",
            PrintNewlineTo => "PRINT_NEWLINE_TO",
            StoreName => "STORE_NAME",
            DeleteName => "DELETE_NAME",
            UnpackSequence => "UNPACK_SEQUENCE",
            UnpackTuple => "UNPACK_TUPLE",
            StoreAttr => "STORE_ATTR",
            DeleteAttr => "DELETE_ATTR",
            StoreGlobal => "STORE_GLOBAL",
            DeleteGlobal => "DELETE_GLOBAL",
            LoadConst => "LOAD_CONST",
            LoadName => "LOAD_NAME",
            BuildTuple => "BUILD_TUPLE",
            BuildList => "BUILD_LIST",
            BuildMap => "BUILD_MAP",
            LoadAttr => "LOAD_ATTR",
            CompareOp => "COMPARE_OP",
            ImportName => "IMPORT_NAME",
            ImportFrom => "IMPORT_FROM",
            JumpForward => "JUMP_FORWARD",
            JumpIfFalse => "JUMP_IF_FALSE",
            JumpIfTrue => "JUMP_IF_TRUE",
            JumpAbsolute => "JUMP_ABSOLUTE",
            ForLoop => "FOR_LOOP",
            LoadGlobal => "LOAD_GLOBAL",
            SetupLoop => "SETUP_LOOP",
            SetupExcept => "SETUP_EXCEPT",
            SetupFinally => "SETUP_FINALLY",
            LoadFast => "LOAD_FAST",
            StoreFast => "STORE_FAST",
            DeleteFast => "DELETE_FAST",
            RaiseVarargs => "RAISE_VARARGS",
            CallFunction => "CALL_FUNCTION",
            MakeFunction => "MAKE_FUNCTION",
            BuildSlice => "BUILD_SLICE",
            ExtendedArg => "EXTENDED_ARG",
            CallFunctionVar => "CALL_FUNCTION_VAR",
            CallFunctionKw => "CALL_FUNCTION_KW",
            CallFunctionVarKw => "CALL_FUNCTION_VAR_KW",
        }
    }
}

/// Index into this table is the operand of `COMPARE_OP`. Index 10 is
/// the internal "exception match" pseudo-operator used by
/// `except`-clause type tests, never written in source.
pub const COMPARE_OPS: &[&str] =
    &["<", "<=", "==", "!=", ">", ">=", "in", "not in", "is", "is not", "exception match", "BAD"];

pub const EXCEPTION_MATCH: u16 = 10;

/// Precedence a comparison operator renders at, per its spelling:
/// relational operators start with one of `!<=>`, membership tests end
/// in `"in"`, identity tests start with `"is"`.
pub fn comparison_precedence(op: &str) -> Precedence {
    if op.starts_with(|c| "!<=>".contains(c)) {
        precedence::CMP
    } else if op.ends_with("in") {
        precedence::IN
    } else {
        debug_assert!(op.starts_with("is"));
        precedence::IS
    }
}

/// Render a disassembly listing of raw instruction bytes, used as the
/// diagnostic dump on a fatal decompile error.
pub fn disassemble(instructions: &[u8]) -> String {
    let mut out = String::new();
    let mut i = 0usize;
    while i < instructions.len() {
        let byte = instructions[i];
        match Mnemonic::from_byte(byte) {
            Some(mnemonic) if mnemonic.has_operand() && i + 2 < instructions.len() => {
                let operand = instructions[i + 1] as u16 | ((instructions[i + 2] as u16) << 8);
                out.push_str(&format!("{:6} {:<22} {}\n", i, mnemonic.name(), operand));
                i += 3;
            }
            Some(mnemonic) => {
                out.push_str(&format!("{:6} {}\n", i, mnemonic.name()));
                i += 1;
            }
            None => {
                out.push_str(&format!("{:6} <unknown opcode {}>\n", i, byte));
                i += 1;
            }
        }
    }
    out
}
