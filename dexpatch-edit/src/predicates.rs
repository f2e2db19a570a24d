//! Ready-made anchor predicates.

use dexpatch_isa::{Instruction, MethodRef, Opcode};

pub fn opcode(op: Opcode) -> impl Fn(&Instruction) -> bool + Clone + Send + Sync {
    move |i: &Instruction| i.opcode() == op
}

/// A `const-string` (or jumbo) loading exactly `s`.
pub fn string_eq(s: impl Into<String>) -> impl Fn(&Instruction) -> bool + Clone + Send + Sync {
    let s = s.into();
    move |i: &Instruction| i.string_ref() == Some(s.as_str())
}

/// An invoke whose callee is named `name`.
pub fn method_named(
    name: impl Into<String>,
) -> impl Fn(&Instruction) -> bool + Clone + Send + Sync {
    let name = name.into();
    move |i: &Instruction| i.opcode().is_invoke() && i.method_ref().is_some_and(|m| m.name == name)
}

/// An invoke whose callee satisfies `f`.
pub fn method_matches<F>(f: F) -> impl Fn(&Instruction) -> bool + Clone + Send + Sync
where
    F: Fn(&MethodRef) -> bool + Clone + Send + Sync,
{
    move |i: &Instruction| i.opcode().is_invoke() && i.method_ref().is_some_and(&f)
}

/// A literal-carrying instruction whose literal is `value`.
pub fn literal_eq(value: i64) -> impl Fn(&Instruction) -> bool + Clone + Send + Sync {
    move |i: &Instruction| i.literal() == Some(value)
}

pub fn and<A, B>(a: A, b: B) -> impl Fn(&Instruction) -> bool + Clone + Send + Sync
where
    A: Fn(&Instruction) -> bool + Clone + Send + Sync,
    B: Fn(&Instruction) -> bool + Clone + Send + Sync,
{
    move |i: &Instruction| a(i) && b(i)
}

pub fn or<A, B>(a: A, b: B) -> impl Fn(&Instruction) -> bool + Clone + Send + Sync
where
    A: Fn(&Instruction) -> bool + Clone + Send + Sync,
    B: Fn(&Instruction) -> bool + Clone + Send + Sync,
{
    move |i: &Instruction| a(i) || b(i)
}
