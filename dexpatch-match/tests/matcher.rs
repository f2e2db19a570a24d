mod common;

use common::{HINTS, pool, pool_of_bodies};
use dexpatch_file::{AccessFlags, MethodId, Scope};
use dexpatch_isa::MethodRef;
use dexpatch_match::*;

fn constructor_with(literal: i64) -> Fingerprint {
    Fingerprint::builder("constructor")
        .access_flags(AccessFlags::PUBLIC | AccessFlags::CONSTRUCTOR)
        .returns("V")
        .custom(has_literal(literal))
        .build()
}

fn bridge() -> Fingerprint {
    Fingerprint::builder("bridge")
        .access_flags(
            AccessFlags::PUBLIC | AccessFlags::FINAL | AccessFlags::BRIDGE | AccessFlags::SYNTHETIC,
        )
        .returns("V")
        .build()
}

#[test]
fn unique_constructor_resolves() {
    let pool = pool(HINTS);
    let m = resolve(&constructor_with(0x7f0e01d8), &pool, &Scope::Package).unwrap();
    assert_eq!(m.id, MethodId { class: 0, method: 0 });
    assert_eq!(m.class.descriptor(), "Lapp/DidYouMean;");
    assert_eq!(m.method.name(), "<init>");
}

#[test]
fn duplicated_constructor_is_ambiguous() {
    // Both constructors now load the literal.
    let yaml = HINTS.replace("0x7f0e06c4", "0x7f0e01d8");
    let pool = pool(&yaml);
    let err = resolve(&constructor_with(0x7f0e01d8), &pool, &Scope::Package).unwrap_err();
    match err {
        MatchError::Ambiguous {
            count, candidates, ..
        } => {
            assert_eq!(count, 2);
            assert_eq!(
                candidates,
                [
                    MethodRef::parse("Lapp/DidYouMean;-><init>(Landroid/content/Context;)V")
                        .unwrap(),
                    MethodRef::parse("Lapp/ShowingResults;-><init>()V").unwrap(),
                ]
            );
        }
        other => panic!("expected Ambiguous, got {other:?}"),
    }
}

#[test]
fn no_match_is_not_found() {
    let pool = pool(HINTS);
    let err = resolve(&constructor_with(0x1234), &pool, &Scope::Package).unwrap_err();
    assert!(matches!(
        err,
        MatchError::NotFound { ref fingerprint, scope: Scope::Package } if fingerprint == "constructor"
    ));
}

#[test]
fn resolution_is_deterministic() {
    let pool = pool(HINTS);
    let fp = constructor_with(0x7f0e01d8);
    let a = resolve(&fp, &pool, &Scope::Package).unwrap();
    let b = resolve(&fp, &pool, &Scope::Package).unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(a.scan, b.scan);

    let all: Vec<_> = resolve_all(&bridge(), &pool, &Scope::Package)
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(
        all,
        [
            MethodId { class: 0, method: 1 },
            MethodId { class: 1, method: 1 }
        ]
    );
}

#[test]
fn second_stage_is_limited_to_the_anchor_class() {
    let pool = pool(HINTS);
    let bridge = bridge();

    // On its own the bridge shape is ambiguous.
    assert!(matches!(
        resolve(&bridge, &pool, &Scope::Package),
        Err(MatchError::Ambiguous { count: 2, .. })
    ));

    let anchor = resolve(&constructor_with(0x7f0e06c4), &pool, &Scope::Package).unwrap();
    assert_eq!(
        anchor.class_scope(),
        Scope::Class("Lapp/ShowingResults;".into())
    );
    let m = resolve(&bridge, &pool, &anchor.class_scope()).unwrap();
    assert_eq!(m.id, MethodId { class: 1, method: 1 });

    let m = resolve_in_class_of(&constructor_with(0x7f0e01d8), &bridge, &pool).unwrap();
    assert_eq!(m.id, MethodId { class: 0, method: 1 });
    assert_eq!(m.class.descriptor(), "Lapp/DidYouMean;");
}

#[test]
fn second_stage_failure_reports_the_class_scope() {
    let pool = pool(HINTS);
    let missing = Fingerprint::builder("missing").returns("I").build();
    let err = resolve_in_class_of(&constructor_with(0x7f0e01d8), &missing, &pool).unwrap_err();
    assert!(matches!(
        err,
        MatchError::NotFound { scope: Scope::Class(ref c), .. } if c == "Lapp/DidYouMean;"
    ));
}

#[test]
fn match_carries_scan_positions() {
    let pool = pool_of_bodies(&[
        "return-void",
        r#"const-string v0, "search_query"
        invoke-virtual {v1, v0}, Landroid/os/Bundle;->getString(Ljava/lang/String;)Ljava/lang/String;
        move-result-object v0
        return-void"#,
    ]);
    let fp = Fingerprint::builder("query")
        .strings(["search_query"])
        .opcodes([
            dexpatch_isa::Opcode::InvokeVirtual,
            dexpatch_isa::Opcode::MoveResultObject,
        ])
        .build();
    let m = resolve(&fp, &pool, &Scope::Package).unwrap();
    assert_eq!(m.method.name(), "m1");
    assert_eq!(m.scan.strings, [0]);
    assert_eq!(m.scan.opcodes, Some(1..3));
}
