//! Multi-line assembly: label resolution, placeholder binding and listings.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;

use crate::insn::{
    FieldRef, Instruction, Label, MethodRef, Operand, OperandError, Reference, Reg,
    is_type_descriptor,
};
use crate::opcode::{Opcode, RefKind};
use crate::syntax::{Arg, ParsedInsn, RegToken, Statement, SyntaxError, parse_line};

/// Errors from [`Program::parse`], [`Program::lower`] and [`assemble`].
///
/// Line numbers are 1-based and relative to the parsed text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AsmError {
    #[error("line {line}: {source}")]
    Syntax { line: usize, source: SyntaxError },
    #[error("line {line}: {source}")]
    Operand { line: usize, source: OperandError },
    #[error("line {line}: duplicate label `:{name}`")]
    DuplicateLabel { line: usize, name: String },
    #[error("line {line}: undefined label `:{name}`")]
    UndefinedLabel { line: usize, name: String },
    #[error("line {line}: unbound placeholder `${name}`")]
    UnboundPlaceholder { line: usize, name: String },
    #[error("line {line}: {opcode}: invalid reference `{text}`")]
    BadReference {
        line: usize,
        opcode: Opcode,
        text: String,
    },
    #[error("line {line}: {opcode}: unexpected operand layout")]
    Layout { line: usize, opcode: Opcode },
}

/// A parsed instruction sequence with labels resolved to relative indices
/// and registers still unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    insns: Vec<(usize, ParsedInsn)>,
    labels: HashMap<String, u32>,
}

impl Program {
    pub fn parse(text: &str) -> Result<Self, AsmError> {
        let mut insns = Vec::new();
        let mut labels = HashMap::new();

        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let stmt = parse_line(raw).map_err(|source| AsmError::Syntax { line, source })?;
            match stmt {
                None => {}
                Some(Statement::Label(name)) => {
                    if labels.insert(name.clone(), insns.len() as u32).is_some() {
                        return Err(AsmError::DuplicateLabel { line, name });
                    }
                }
                Some(Statement::Insn(insn)) => insns.push((line, insn)),
            }
        }

        Ok(Self { insns, labels })
    }

    pub fn len(&self) -> usize {
        self.insns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }

    /// Names of all `$placeholder` registers, sorted.
    pub fn placeholders(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        for (_, insn) in &self.insns {
            for arg in &insn.args {
                let toks: Vec<&RegToken> = match arg {
                    Arg::Reg(t) => vec![t],
                    Arg::RegList(ts) => ts.iter().collect(),
                    Arg::RegRange(lo, hi) => vec![lo, hi],
                    _ => continue,
                };
                for tok in toks {
                    if let RegToken::Placeholder(name) = tok {
                        out.insert(name.as_str());
                    }
                }
            }
        }
        out
    }

    /// Lower to concrete instructions.
    ///
    /// Label targets are offset by `base` (the index the first instruction
    /// will occupy); `resolve` maps placeholder names to registers.
    pub fn lower(
        &self,
        base: u32,
        mut resolve: impl FnMut(&str) -> Option<Reg>,
    ) -> Result<Vec<Instruction>, AsmError> {
        self.insns
            .iter()
            .map(|(line, insn)| lower_one(*line, insn, base, &self.labels, &mut resolve))
            .collect()
    }
}

fn lower_one(
    line: usize,
    insn: &ParsedInsn,
    base: u32,
    labels: &HashMap<String, u32>,
    resolve: &mut impl FnMut(&str) -> Option<Reg>,
) -> Result<Instruction, AsmError> {
    let opcode = insn.opcode;
    let format = opcode.format();
    let layout = || AsmError::Layout { line, opcode };

    let mut reg = |tok: &RegToken| -> Result<Reg, AsmError> {
        match tok {
            RegToken::Reg(r) => Ok(*r),
            RegToken::Placeholder(name) => {
                resolve(name).ok_or_else(|| AsmError::UnboundPlaceholder {
                    line,
                    name: name.clone(),
                })
            }
        }
    };

    let mut registers = Vec::new();
    let mut operand = Operand::None;

    for arg in &insn.args {
        let value = match arg {
            Arg::Reg(tok) if !format.is_variadic() => {
                if operand != Operand::None {
                    return Err(layout());
                }
                registers.push(reg(tok)?);
                continue;
            }
            Arg::RegList(toks) if format.is_variadic() => {
                for tok in toks {
                    registers.push(reg(tok)?);
                }
                continue;
            }
            Arg::RegRange(lo, hi) if format.is_range() => {
                let (lo, hi) = (reg(lo)?, reg(hi)?);
                if hi < lo {
                    return Err(layout());
                }
                registers.extend((lo.0..=hi.0).map(Reg));
                continue;
            }
            Arg::Literal(v) => Operand::Literal(*v),
            Arg::Str(s) => Operand::Reference(Reference::String(s.clone())),
            Arg::Label(name) => {
                let idx = labels
                    .get(name)
                    .ok_or_else(|| AsmError::UndefinedLabel {
                        line,
                        name: name.clone(),
                    })?;
                Operand::Target(Label(base + idx))
            }
            Arg::Ref(text) => {
                let bad = || AsmError::BadReference {
                    line,
                    opcode,
                    text: text.clone(),
                };
                let r = match opcode.ref_kind() {
                    RefKind::Type if is_type_descriptor(text) => Reference::Type(text.clone()),
                    RefKind::Field => Reference::Field(FieldRef::parse(text).ok_or_else(bad)?),
                    RefKind::Method => Reference::Method(MethodRef::parse(text).ok_or_else(bad)?),
                    _ => return Err(bad()),
                };
                Operand::Reference(r)
            }
            _ => return Err(layout()),
        };
        if operand != Operand::None {
            return Err(layout());
        }
        operand = value;
    }

    Instruction::new(opcode, registers, operand)
        .map_err(|source| AsmError::Operand { line, source })
}

/// Assemble text that uses only concrete registers.
pub fn assemble(text: &str) -> Result<Vec<Instruction>, AsmError> {
    Program::parse(text)?.lower(0, |_| None)
}

/// Render instructions as text accepted by [`assemble`]. Branch targets
/// become `:L<index>` labels.
pub fn disassemble(instructions: &[Instruction]) -> String {
    let targets: BTreeSet<u32> = instructions
        .iter()
        .filter_map(|i| i.target())
        .map(|l| l.0)
        .collect();
    let mut out = String::new();
    for (idx, insn) in instructions.iter().enumerate() {
        if targets.contains(&(idx as u32)) {
            let _ = writeln!(out, "{}", Label(idx as u32));
        }
        let _ = writeln!(out, "{insn}");
    }
    if targets.contains(&(instructions.len() as u32)) {
        let _ = writeln!(out, "{}", Label(instructions.len() as u32));
    }
    out
}
