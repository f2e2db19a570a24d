use dexpatch_isa::*;

/// Assemble a single line, panicking on error.
#[allow(dead_code)]
pub fn insn(line: &str) -> Instruction {
    let mut v = assemble(line).unwrap_or_else(|e| panic!("{line}: {e}"));
    assert_eq!(v.len(), 1, "expected exactly one instruction in `{line}`");
    v.remove(0)
}

/// Assemble, then disassemble and assemble again; both passes must agree.
#[allow(dead_code)]
pub fn assert_listing_stable(text: &str) {
    let first = assemble(text).unwrap();
    let listing = disassemble(&first);
    let second = assemble(&listing).unwrap_or_else(|e| panic!("{e}\n{listing}"));
    assert_eq!(first, second, "listing:\n{listing}");
}
