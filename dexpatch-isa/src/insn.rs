//! Decoded instructions and their operands.

use std::fmt;

pub use crate::opcode::{OperandKind, RefKind, Role};
use crate::opcode::{Format, Opcode};

/// A virtual register (`vN`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reg(pub u16);

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Branch target: the index of the target instruction within its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":L{}", self.0)
    }
}

/// A method reference, `Lpkg/Cls;->name(Params)Ret`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodRef {
    pub class: String,
    pub name: String,
    pub parameters: Vec<String>,
    pub return_type: String,
}

impl MethodRef {
    pub fn new(
        class: impl Into<String>,
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = impl Into<String>>,
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
            return_type: return_type.into(),
        }
    }

    /// Parse `Lpkg/Cls;->name(Params)Ret`.
    pub fn parse(s: &str) -> Option<Self> {
        let (class, rest) = s.split_once("->")?;
        let (name, rest) = rest.split_once('(')?;
        let (params, ret) = rest.split_once(')')?;
        if !is_type_descriptor(class) || name.is_empty() {
            return None;
        }
        let parameters = split_type_list(params)?;
        if !is_type_descriptor(ret) {
            return None;
        }
        Some(Self {
            class: class.to_string(),
            name: name.to_string(),
            parameters,
            return_type: ret.to_string(),
        })
    }

    /// The `(Params)Ret` part.
    pub fn proto(&self) -> String {
        format!("({}){}", self.parameters.concat(), self.return_type)
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}{}", self.class, self.name, self.proto())
    }
}

/// A field reference, `Lpkg/Cls;->name:Type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldRef {
    pub class: String,
    pub name: String,
    pub ty: String,
}

impl FieldRef {
    pub fn parse(s: &str) -> Option<Self> {
        let (class, rest) = s.split_once("->")?;
        let (name, ty) = rest.split_once(':')?;
        if !is_type_descriptor(class) || name.is_empty() || !is_type_descriptor(ty) || ty == "V" {
            return None;
        }
        Some(Self {
            class: class.to_string(),
            name: name.to_string(),
            ty: ty.to_string(),
        })
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}:{}", self.class, self.name, self.ty)
    }
}

/// A resolved constant-pool reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    String(String),
    Type(String),
    Field(FieldRef),
    Method(MethodRef),
}

impl Reference {
    pub fn kind(&self) -> RefKind {
        match self {
            Reference::String(_) => RefKind::String,
            Reference::Type(_) => RefKind::Type,
            Reference::Field(_) => RefKind::Field,
            Reference::Method(_) => RefKind::Method,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::String(s) => write_quoted(f, s),
            Reference::Type(t) => f.write_str(t),
            Reference::Field(r) => r.fmt(f),
            Reference::Method(r) => r.fmt(f),
        }
    }
}

/// The non-register operand of an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    None,
    Literal(i64),
    Reference(Reference),
    Target(Label),
}

impl Operand {
    fn describe(&self) -> &'static str {
        match self {
            Operand::None => "no operand",
            Operand::Literal(_) => "a literal",
            Operand::Reference(_) => "a reference",
            Operand::Target(_) => "a branch target",
        }
    }
}

/// Errors from [`Instruction::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperandError {
    #[error("{opcode} takes {expected} register(s), got {found}")]
    RegisterCount {
        opcode: Opcode,
        expected: usize,
        found: usize,
    },
    #[error("{opcode}: {reg} does not fit in {bits} bits")]
    RegisterWidth { opcode: Opcode, reg: Reg, bits: u8 },
    #[error("{opcode}: register range must be consecutive")]
    NonConsecutiveRange { opcode: Opcode },
    #[error("{opcode}: literal {value:#x} out of range for format {format}")]
    LiteralOutOfRange {
        opcode: Opcode,
        value: i64,
        format: Format,
    },
    #[error("{opcode} expects {expected}, got {found}")]
    OperandKind {
        opcode: Opcode,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{opcode} expects a {expected:?} reference, got {found:?}")]
    ReferenceKind {
        opcode: Opcode,
        expected: RefKind,
        found: RefKind,
    },
}

/// A single decoded instruction. Immutable once built; its position is its
/// index in the owning body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instruction {
    opcode: Opcode,
    registers: Vec<Reg>,
    operand: Operand,
}

impl Instruction {
    /// Build an instruction, validating registers and operand against the
    /// opcode's format.
    pub fn new(
        opcode: Opcode,
        registers: impl Into<Vec<Reg>>,
        operand: Operand,
    ) -> Result<Self, OperandError> {
        let registers = registers.into();
        let format = opcode.format();

        let expected = format.roles().len();
        let count_ok = if format.is_variadic() {
            registers.len() <= format.max_registers()
        } else {
            registers.len() == expected
        };
        if !count_ok {
            return Err(OperandError::RegisterCount {
                opcode,
                expected: format.max_registers(),
                found: registers.len(),
            });
        }

        for (slot, &reg) in registers.iter().enumerate() {
            let bits = format.register_bits(slot);
            if u32::from(reg.0) >= 1u32 << bits {
                return Err(OperandError::RegisterWidth { opcode, reg, bits });
            }
        }

        if format.is_range()
            && registers
                .windows(2)
                .any(|w| w[0].0.checked_add(1) != Some(w[1].0))
        {
            return Err(OperandError::NonConsecutiveRange { opcode });
        }

        let mismatch = |expected: &'static str| OperandError::OperandKind {
            opcode,
            expected,
            found: operand.describe(),
        };
        match (format.operand_kind(), &operand) {
            (OperandKind::None, Operand::None) => {}
            (OperandKind::Target, Operand::Target(_)) => {}
            (OperandKind::Literal, Operand::Literal(value)) => {
                if !format.literal_fits(*value) {
                    return Err(OperandError::LiteralOutOfRange {
                        opcode,
                        value: *value,
                        format,
                    });
                }
            }
            (OperandKind::Reference, Operand::Reference(r)) => {
                if r.kind() != opcode.ref_kind() {
                    return Err(OperandError::ReferenceKind {
                        opcode,
                        expected: opcode.ref_kind(),
                        found: r.kind(),
                    });
                }
            }
            (OperandKind::None, _) => return Err(mismatch("no operand")),
            (OperandKind::Target, _) => return Err(mismatch("a branch target")),
            (OperandKind::Literal, _) => return Err(mismatch("a literal")),
            (OperandKind::Reference, _) => return Err(mismatch("a reference")),
        }

        Ok(Self {
            opcode,
            registers,
            operand,
        })
    }

    #[inline]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    #[inline]
    pub fn format(&self) -> Format {
        self.opcode.format()
    }

    #[inline]
    pub fn registers(&self) -> &[Reg] {
        &self.registers
    }

    #[inline]
    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// The register in operand slot `role`, if the format has that slot and
    /// this instruction fills it.
    pub fn register(&self, role: Role) -> Option<Reg> {
        let slot = self.format().roles().iter().position(|&r| r == role)?;
        self.registers.get(slot).copied()
    }

    pub fn literal(&self) -> Option<i64> {
        match self.operand {
            Operand::Literal(v) => Some(v),
            _ => None,
        }
    }

    /// The literal of a 32-bit `const/4`, `const/16`, `const` or
    /// `const/high16` load. Wide loads are excluded.
    pub fn narrow_literal(&self) -> Option<i32> {
        match self.opcode {
            Opcode::Const4 | Opcode::Const16 | Opcode::Const | Opcode::ConstHigh16 => {
                self.literal().and_then(|v| i32::try_from(v).ok())
            }
            _ => None,
        }
    }

    pub fn reference(&self) -> Option<&Reference> {
        match &self.operand {
            Operand::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn string_ref(&self) -> Option<&str> {
        match self.reference()? {
            Reference::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_ref(&self) -> Option<&str> {
        match self.reference()? {
            Reference::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn method_ref(&self) -> Option<&MethodRef> {
        match self.reference()? {
            Reference::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn field_ref(&self) -> Option<&FieldRef> {
        match self.reference()? {
            Reference::Field(r) => Some(r),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<Label> {
        match self.operand {
            Operand::Target(l) => Some(l),
            _ => None,
        }
    }

    /// A copy of this instruction with its branch target rewritten by `f`.
    /// Instructions without a target are returned unchanged.
    pub fn map_target(&self, f: impl FnOnce(Label) -> Label) -> Self {
        match self.operand {
            Operand::Target(l) => Self {
                opcode: self.opcode,
                registers: self.registers.clone(),
                operand: Operand::Target(f(l)),
            },
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;
        let format = self.format();
        let mut first = true;
        let mut sep = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            let s = if first { " " } else { ", " };
            first = false;
            f.write_str(s)
        };

        if format.is_range() {
            sep(f)?;
            match (self.registers.first(), self.registers.last()) {
                (Some(lo), Some(hi)) => write!(f, "{{{lo} .. {hi}}}")?,
                _ => f.write_str("{}")?,
            }
        } else if format.is_variadic() {
            sep(f)?;
            f.write_str("{")?;
            for (i, r) in self.registers.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{r}")?;
            }
            f.write_str("}")?;
        } else {
            for r in &self.registers {
                sep(f)?;
                write!(f, "{r}")?;
            }
        }

        match &self.operand {
            Operand::None => Ok(()),
            Operand::Literal(v) => {
                sep(f)?;
                write_literal(f, *v)
            }
            Operand::Reference(r) => {
                sep(f)?;
                write!(f, "{r}")
            }
            Operand::Target(l) => {
                sep(f)?;
                write!(f, "{l}")
            }
        }
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, v: i64) -> fmt::Result {
    if v < 0 {
        write!(f, "-{:#x}", v.unsigned_abs())
    } else {
        write!(f, "{v:#x}")
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

/// Whether `s` is exactly one field/return type descriptor.
pub fn is_type_descriptor(s: &str) -> bool {
    matches!(type_descriptor_len(s), Some(n) if n == s.len())
}

/// Split a concatenated descriptor list (`ILjava/lang/String;[B`).
pub fn split_type_list(mut s: &str) -> Option<Vec<String>> {
    let mut out = Vec::new();
    while !s.is_empty() {
        let n = type_descriptor_len(s)?;
        let (head, tail) = s.split_at(n);
        if head == "V" {
            return None;
        }
        out.push(head.to_string());
        s = tail;
    }
    Some(out)
}

fn type_descriptor_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let dims = bytes.iter().take_while(|&&b| b == b'[').count();
    match bytes.get(dims)? {
        b'Z' | b'B' | b'S' | b'C' | b'I' | b'J' | b'F' | b'D' => Some(dims + 1),
        b'V' if dims == 0 => Some(1),
        b'L' => {
            let end = s[dims..].find(';')?;
            (end > 1).then_some(dims + end + 1)
        }
        _ => None,
    }
}
