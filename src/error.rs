//! Error model: three fatal categories, no recovery. A decompiler that
//! quietly drops code is worse than none, so every failure mode here
//! aborts the whole decompile rather than eliding the construct it
//! could not recognize.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecompileError {
    #[error("malformed bytecode at offset {offset}: {reason}")]
    InputMalformed { offset: usize, reason: String },

    #[error("structural mismatch at offset {offset}: expected {expected}, found {found}")]
    StructuralMismatch { offset: usize, expected: String, found: String },

    #[error("unsupported module version (magic {magic:02X?})")]
    UnsupportedVersion { magic: [u8; 4] },
}

impl DecompileError {
    pub fn malformed(offset: usize, reason: impl Into<String>) -> DecompileError {
        DecompileError::InputMalformed { offset, reason: reason.into() }
    }

    pub fn mismatch(
        offset: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> DecompileError {
        DecompileError::StructuralMismatch {
            offset,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DecompileError>;
