use dexpatch_isa::syntax::*;
use dexpatch_isa::{Opcode, Reg};

fn parse_insn(line: &str) -> ParsedInsn {
    match parse_line(line) {
        Ok(Some(Statement::Insn(i))) => i,
        other => panic!("{line}: {other:?}"),
    }
}

#[test]
fn blank_and_comment_lines() {
    assert_eq!(parse_line(""), Ok(None));
    assert_eq!(parse_line("   "), Ok(None));
    assert_eq!(parse_line("# just a comment"), Ok(None));
}

#[test]
fn label_definition() {
    assert_eq!(
        parse_line("  :cond_0  "),
        Ok(Some(Statement::Label("cond_0".into())))
    );
    assert!(matches!(parse_line(":bad-name"), Err(SyntaxError::BadLabel(_))));
}

#[test]
fn registers_and_placeholders() {
    let i = parse_insn("invoke-static {v2, $query}, LA;->f(II)V");
    assert_eq!(i.opcode, Opcode::InvokeStatic);
    assert_eq!(
        i.args[0],
        Arg::RegList(vec![
            RegToken::Reg(Reg(2)),
            RegToken::Placeholder("query".into())
        ])
    );
    assert_eq!(i.args[1], Arg::Ref("LA;->f(II)V".into()));
}

#[test]
fn register_range() {
    let i = parse_insn("invoke-virtual/range {v0 .. $last}, LA;->f(II)V");
    assert_eq!(
        i.args[0],
        Arg::RegRange(RegToken::Reg(Reg(0)), RegToken::Placeholder("last".into()))
    );
}

#[test]
fn string_with_comma_and_hash() {
    let i = parse_insn(r#"const-string v0, ",com.example.searchbox=#1" # trailing"#);
    assert_eq!(i.args[1], Arg::Str(",com.example.searchbox=#1".into()));
}

#[test]
fn string_escapes() {
    let i = parse_insn(r#"const-string v0, "a\n\tA\\""#);
    assert_eq!(i.args[1], Arg::Str("a\n\tA\\".into()));
    assert!(matches!(
        parse_line(r#"const-string v0, "\q""#),
        Err(SyntaxError::BadEscape('q'))
    ));
    assert!(matches!(
        parse_line(r#"const-string v0, "open"#),
        Err(SyntaxError::UnterminatedString)
    ));
}

#[test]
fn literals() {
    assert_eq!(parse_literal("42"), Ok(42));
    assert_eq!(parse_literal("0x7f0e01d8"), Ok(0x7f0e01d8));
    assert_eq!(parse_literal("-0x10"), Ok(-16));
    assert_eq!(parse_literal("0x10L"), Ok(16));
    assert!(parse_literal("0xzz").is_err());
    assert!(parse_literal("-").is_err());
}

#[test]
fn unknown_opcode() {
    assert_eq!(
        parse_line("frobnicate v0"),
        Err(SyntaxError::UnknownOpcode("frobnicate".into()))
    );
}

#[test]
fn malformed_operands() {
    assert_eq!(
        parse_line("invoke-static {v0, LA;->f()V"),
        Err(SyntaxError::UnbalancedBraces)
    );
    assert_eq!(parse_line("move v0,, v1"), Err(SyntaxError::EmptyOperand));
    assert!(matches!(
        parse_line("move v0, $"),
        Err(SyntaxError::BadRegister(_))
    ));
}
