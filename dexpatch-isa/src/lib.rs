//! Register-bytecode instruction model.
//!
//! This crate provides opcode definitions, operand formats, the decoded
//! [`Instruction`] value type and a small smali-style text syntax used both
//! for pool documents and for instruction templates.

pub use bitflags;

pub mod asm;
pub mod insn;
pub mod opcode;
pub mod syntax;

pub use asm::{AsmError, Program, assemble, disassemble};
pub use insn::{
    FieldRef, Instruction, Label, MethodRef, Operand, OperandError, RefKind, Reference, Reg, Role,
};
pub use opcode::{Format, Opcode, OpcodeFlags, OperandKind};
