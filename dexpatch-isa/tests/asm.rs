mod common;

use common::assert_listing_stable;
use dexpatch_isa::*;

#[test]
fn assemble_resolves_labels() {
    let code = assemble(
        "
        const/4 v0, 0x0
        :loop
        if-eqz v0, :done
        goto :loop
        :done
        return-void
        ",
    )
    .unwrap();
    assert_eq!(code.len(), 4);
    assert_eq!(code[1].target(), Some(Label(3)));
    assert_eq!(code[2].target(), Some(Label(1)));
}

#[test]
fn label_at_end_points_past_last_instruction() {
    let program = Program::parse("if-eqz $x, :after\nnop\n:after").unwrap();
    let code = program.lower(10, |_| Some(Reg(1))).unwrap();
    assert_eq!(code[0].target(), Some(Label(12)));
}

#[test]
fn duplicate_and_undefined_labels() {
    let err = assemble(":a\nnop\n:a\nnop").unwrap_err();
    assert!(matches!(err, AsmError::DuplicateLabel { line: 3, .. }));

    let err = assemble("nop\ngoto :nowhere").unwrap_err();
    assert!(matches!(err, AsmError::UndefinedLabel { line: 2, ref name } if name == "nowhere"));
}

#[test]
fn placeholders_must_be_bound() {
    let err = assemble("move-result-object $r").unwrap_err();
    assert!(matches!(err, AsmError::UnboundPlaceholder { line: 1, ref name } if name == "r"));
}

#[test]
fn placeholders_are_listed() {
    let program = Program::parse(
        "invoke-static {$b, $a}, LA;->f(II)I\nmove-result $b\ninvoke-static/range {$c .. $d}, LA;->g(II)V",
    )
    .unwrap();
    assert_eq!(
        program.placeholders().into_iter().collect::<Vec<_>>(),
        ["a", "b", "c", "d"]
    );
}

#[test]
fn lower_binds_placeholders() {
    let program = Program::parse(
        "invoke-static {$reg}, Lapp/Ext;->trim(Ljava/lang/CharSequence;)Ljava/lang/CharSequence;\nmove-result-object $reg",
    )
    .unwrap();
    let code = program
        .lower(0, |name| (name == "reg").then_some(Reg(5)))
        .unwrap();
    assert_eq!(code[0].registers(), &[Reg(5)]);
    assert_eq!(code[1].registers(), &[Reg(5)]);
}

#[test]
fn bad_references() {
    let err = assemble("invoke-static {v0}, not-a-method").unwrap_err();
    assert!(matches!(err, AsmError::BadReference { line: 1, .. }));
    let err = assemble("new-instance v0, LA;->f()V").unwrap_err();
    assert!(matches!(err, AsmError::BadReference { .. }));
    // A string literal must not be passed where a type is expected.
    let err = assemble(r#"check-cast v0, "LA;""#).unwrap_err();
    assert!(matches!(
        err,
        AsmError::Operand {
            source: OperandError::ReferenceKind { .. },
            ..
        }
    ));
}

#[test]
fn operand_layout_errors() {
    let err = assemble("move v0, 0x1, v1").unwrap_err();
    assert!(matches!(err, AsmError::Layout { .. }));
    let err = assemble("invoke-static v0, LA;->f(I)V").unwrap_err();
    assert!(matches!(err, AsmError::Layout { .. }));
    let err = assemble("invoke-static/range {v3 .. v1}, LA;->f(I)V").unwrap_err();
    assert!(matches!(err, AsmError::Layout { .. }));
}

#[test]
fn syntax_errors_carry_line_numbers() {
    let err = assemble("nop\nnop\nbogus v0").unwrap_err();
    assert!(matches!(err, AsmError::Syntax { line: 3, .. }));
    assert!(err.to_string().starts_with("line 3:"));
}

#[test]
fn listing_is_stable() {
    assert_listing_stable(
        r#"
        move-object/from16 v0, v20
        invoke-direct {v0}, Lapp/Frag;->check()Z
        move-result v1
        if-eqz v1, :skip
        iget-object v2, v0, Lapp/Frag;->bundle:Landroid/os/Bundle;
        const-string v3, "search_query"
        invoke-virtual {v2, v3}, Landroid/os/Bundle;->getString(Ljava/lang/String;)Ljava/lang/String;
        move-result-object v3
        :skip
        const v4, 0x7f0e01d8
        const-wide v6, -0x1
        invoke-interface/range {v0 .. v3}, Lapp/Sink;->put(Ljava/lang/Object;ILjava/lang/Object;Ljava/lang/String;)V
        return-void
        "#,
    );
}

#[test]
fn disassemble_emits_target_labels() {
    let code = assemble("if-nez v0, :x\nnop\n:x\nreturn-void").unwrap();
    let listing = disassemble(&code);
    assert_eq!(listing, "if-nez v0, :L2\nnop\n:L2\nreturn-void\n");
}
