use dexpatch_file::*;
use dexpatch_isa::{Reg, assemble};

#[test]
fn registers_must_fit_the_frame() {
    let err = Body::parse(2, "move v0, v2").unwrap_err();
    assert!(matches!(
        err,
        Error::RegisterOutOfRange {
            reg: Reg(2),
            registers: 2
        }
    ));
}

#[test]
fn branches_must_stay_inside() {
    // A label after the last instruction is valid text but not a valid body.
    let insns = assemble("if-eqz v0, :end\nnop\n:end").unwrap();
    let err = Body::new(1, insns).unwrap_err();
    assert!(matches!(
        err,
        Error::TargetOutOfRange {
            index: 0,
            target: 2,
            len: 2
        }
    ));
}

#[test]
fn clones_share_storage() {
    let body = Body::parse(1, "const/4 v0, 0x1\nreturn v0").unwrap();
    let copy = body.clone();
    assert!(body.ptr_eq(&copy));

    let edited = body
        .with_instructions(assemble("const/4 v0, 0x2\nreturn v0").unwrap())
        .unwrap();
    assert!(!edited.ptr_eq(&body));
    assert_eq!(edited.register_count(), 1);
    // The original is untouched.
    assert_eq!(body.get(0).unwrap().literal(), Some(1));
    assert_eq!(copy.get(0).unwrap().literal(), Some(1));
}

#[test]
fn replacing_a_method_body_leaves_old_handles_valid() {
    let sig = dexpatch_isa::MethodRef::parse("LA;->f()I").unwrap();
    let old = Body::parse(1, "const/4 v0, 0x1\nreturn v0").unwrap();
    let mut method = Method::new(sig, AccessFlags::PUBLIC, Some(old.clone()));
    let new = Body::parse(1, "const/4 v0, 0x2\nreturn v0").unwrap();
    method.replace_body(new.clone()).unwrap();
    assert_eq!(method.body(), Some(&new));
    assert_eq!(old.len(), 2);
    assert_eq!(old.get(0).unwrap().literal(), Some(1));
}
