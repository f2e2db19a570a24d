use dexpatch_isa::{AsmError, Opcode, Reg, Role};
use thiserror::Error;

use crate::anchor::Direction;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("No instruction satisfies the anchor predicate (searching {0})")]
    AnchorNotFound(Direction),

    #[error("Instruction {index} ({opcode}) has no {role}")]
    OperandShape {
        index: usize,
        opcode: Opcode,
        role: Role,
    },

    #[error("Index {index} out of bounds for a body of {len} instructions")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Template placeholder `${0}` is not bound")]
    UnboundPlaceholder(String),

    #[error("Template uses {reg} but the method has only {registers} registers")]
    RegisterOutOfRange { reg: Reg, registers: u16 },

    #[error("Method {0} has no body")]
    MissingBody(String),

    #[error("Template: {0}")]
    Template(#[from] AsmError),

    #[error(transparent)]
    Body(#[from] dexpatch_file::Error),
}

pub type Result<T> = std::result::Result<T, EditError>;
