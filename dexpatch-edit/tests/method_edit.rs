mod common;

use common::{HOOKS, body};
use dexpatch_edit::predicates::method_named;
use dexpatch_edit::*;
use dexpatch_file::{AccessFlags, Method};
use dexpatch_isa::{MethodRef, Opcode, Role};

fn method(code: Option<&str>) -> Method {
    Method::new(
        MethodRef::parse("Lapp/Bar;->show(Ljava/lang/CharSequence;)V").unwrap(),
        AccessFlags::PUBLIC,
        code.map(|c| body(3, c)),
    )
}

#[test]
fn edits_through_the_method() {
    let mut m = method(Some(
        "invoke-virtual {v1, v2}, Landroid/widget/TextView;->setText(Ljava/lang/CharSequence;)V\nreturn-void",
    ));
    let idx = m.find_anchor(method_named("setText"), Direction::Last).unwrap();
    let reg = m.register_at(idx, Role::D).unwrap();

    let t = Template::parse(&format!(
        "invoke-static {{$r}}, {HOOKS}->trim(Ljava/lang/CharSequence;)Ljava/lang/CharSequence;\nmove-result-object $r"
    ))
    .unwrap();
    let bind = Bindings::new().bind("r", reg);

    let preview = m.with_inserted(idx, Placement::Before, &t, &bind).unwrap();
    assert_eq!(m.instructions().len(), 2);
    assert_eq!(preview.len(), 4);

    m.add_instructions(idx, Placement::Before, &t, &bind).unwrap();
    assert_eq!(m.body(), Some(&preview));
    // The anchor moved; a fresh search finds it again.
    assert_eq!(
        m.find_anchor(method_named("setText"), Direction::Last).unwrap(),
        2
    );
}

#[test]
fn replace_and_remove_through_the_method() {
    let m = method(Some("nop\nreturn-void"));
    let t = Template::parse("const/4 v0, 0x0").unwrap();
    let out = m.with_replaced(0, &t, &Bindings::new()).unwrap();
    assert_eq!(out.instructions()[0].opcode(), Opcode::Const4);
    let out = m.with_removed(0).unwrap();
    assert_eq!(out.len(), 1);
}

#[test]
fn bodiless_method() {
    let m = method(None);
    let err = m.find_anchor(method_named("setText"), Direction::First).unwrap_err();
    assert!(matches!(err, EditError::MissingBody(ref s) if s.contains("->show(")));
}
