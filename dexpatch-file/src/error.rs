use dexpatch_isa::{AsmError, Reg};
use thiserror::Error;

use crate::MethodId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Register {reg} out of range (method has {registers} registers)")]
    RegisterOutOfRange { reg: Reg, registers: u16 },

    #[error("Instruction {index} branches to {target}, past the end of a {len}-instruction body")]
    TargetOutOfRange { index: usize, target: u32, len: usize },

    #[error("Method {0} names v65535, which needs a frame larger than 65535 registers")]
    TooManyRegisters(String),

    #[error("Method {0} has no body")]
    NoBody(String),

    #[error("Method {0} is abstract or native and cannot have code")]
    UnexpectedBody(String),

    #[error("No method with id {0}")]
    UnknownMethod(MethodId),

    #[error("Duplicate class {0}")]
    DuplicateClass(String),

    #[error("Duplicate method {0}")]
    DuplicateMethod(String),

    #[error("Invalid type descriptor `{0}`")]
    BadDescriptor(String),

    #[error("Method {method}: {source}")]
    Code { method: String, source: AsmError },

    #[error(transparent)]
    Asm(#[from] AsmError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
