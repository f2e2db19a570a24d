//! Locating instructions and reading their operands.

use std::fmt;

use dexpatch_isa::{Instruction, Reg, Role};

use crate::error::{EditError, Result};

/// Which end of the body an anchor search starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    First,
    Last,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::First => f.write_str("first"),
            Direction::Last => f.write_str("last"),
        }
    }
}

/// Index of the first (or last) instruction satisfying `predicate`.
pub fn find_anchor(
    insns: &[Instruction],
    predicate: impl Fn(&Instruction) -> bool,
    direction: Direction,
) -> Result<usize> {
    let found = match direction {
        Direction::First => insns.iter().position(predicate),
        Direction::Last => insns.iter().rposition(predicate),
    };
    found.ok_or(EditError::AnchorNotFound(direction))
}

/// The register in slot `role` of the instruction at `index`.
pub fn register_at(insns: &[Instruction], index: usize, role: Role) -> Result<Reg> {
    let insn = insns.get(index).ok_or(EditError::IndexOutOfBounds {
        index,
        len: insns.len(),
    })?;
    insn.register(role).ok_or(EditError::OperandShape {
        index,
        opcode: insn.opcode(),
        role,
    })
}
