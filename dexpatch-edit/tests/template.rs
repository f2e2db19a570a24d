use dexpatch_edit::*;
use dexpatch_isa::{AsmError, Label, Reg};

#[test]
fn placeholders_are_listed_once() {
    let t = Template::parse(
        "invoke-static {$b, $a}, Lapp/H;->f(II)I\nmove-result $b\n# comment only\n",
    )
    .unwrap();
    assert_eq!(t.len(), 2);
    assert_eq!(t.placeholders().collect::<Vec<_>>(), ["a", "b"]);
}

#[test]
fn instantiate_places_labels_at_base() {
    let t = Template::parse(":top\nif-eqz $x, :top").unwrap();
    let code = t
        .instantiate(7, &Bindings::new().bind("x", Reg(0)))
        .unwrap();
    assert_eq!(code[0].target(), Some(Label(7)));
}

#[test]
fn bindings_collect_and_override() {
    let mut b: Bindings = [("a", Reg(1)), ("b", Reg(2))].into_iter().collect();
    assert_eq!(b.insert("a", Reg(4)), Some(Reg(1)));
    assert_eq!(b.get("a"), Some(Reg(4)));
    assert_eq!(b.get("c"), None);
    assert_eq!(b.iter().count(), 2);
}

#[test]
fn parse_errors_surface_as_template_errors() {
    let err = Template::parse("nop\nbogus $x").unwrap_err();
    assert!(matches!(
        err,
        EditError::Template(AsmError::Syntax { line: 2, .. })
    ));
    let err = Template::parse("goto :nowhere").unwrap_err();
    assert!(matches!(
        err,
        EditError::Template(AsmError::UndefinedLabel { .. })
    ));
}

#[test]
fn empty_template() {
    let t = Template::parse("# nothing here").unwrap();
    assert!(t.is_empty());
    assert!(t.instantiate(0, &Bindings::new()).unwrap().is_empty());
}
