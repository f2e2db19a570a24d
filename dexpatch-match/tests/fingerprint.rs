mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{pool, pool_of_bodies};
use dexpatch_file::{AccessFlags, Pool};
use dexpatch_isa::Opcode;
use dexpatch_match::*;

fn first(pool: &Pool) -> (&dexpatch_file::ClassDef, &dexpatch_file::Method) {
    let class = &pool.classes()[0];
    (class, &class.methods()[0])
}

#[test]
fn access_flags_are_a_required_subset() {
    let pool = pool(
        "classes:\n  - class: LA;\n    methods:\n      - name: f\n        access: PUBLIC | FINAL\n",
    );
    let (c, m) = first(&pool);

    let fp = Fingerprint::builder("pub").access_flags(AccessFlags::PUBLIC).build();
    assert!(fp.matches(m, c));
    let fp = Fingerprint::builder("pub-final")
        .access_flags(AccessFlags::PUBLIC | AccessFlags::FINAL)
        .build();
    assert!(fp.matches(m, c));
    let fp = Fingerprint::builder("pub-static")
        .access_flags(AccessFlags::PUBLIC | AccessFlags::STATIC)
        .build();
    assert!(!fp.matches(m, c));
}

#[test]
fn signature_types_are_exact() {
    let pool = pool(
        r#"
classes:
  - class: LA;
    methods:
      - name: f
        parameters: [Landroid/view/LayoutInflater;, Landroid/view/ViewGroup;, Landroid/os/Bundle;]
        returns: Landroid/view/View;
"#,
    );
    let (c, m) = first(&pool);

    let fp = Fingerprint::builder("exact")
        .parameters([
            "Landroid/view/LayoutInflater;",
            "Landroid/view/ViewGroup;",
            "Landroid/os/Bundle;",
        ])
        .returns("Landroid/view/View;")
        .build();
    assert!(fp.matches(m, c));

    let prefix = Fingerprint::builder("prefix")
        .parameters(["Landroid/view/LayoutInflater;"])
        .build();
    assert!(!prefix.matches(m, c));

    let no_params = Fingerprint::builder("none").parameters(Vec::<String>::new()).build();
    assert!(!no_params.matches(m, c));

    let wrong_ret = Fingerprint::builder("ret").returns("V").build();
    assert!(!wrong_ret.matches(m, c));
}

const RUN: [Opcode; 3] = [
    Opcode::ConstString,
    Opcode::InvokeVirtual,
    Opcode::MoveResultObject,
];

#[test]
fn opcode_run_must_be_contiguous() {
    let pool = pool_of_bodies(&[
        // X A B C Y
        r#"nop
        const-string v0, "a"
        invoke-virtual {v0}, Ljava/lang/Object;->toString()Ljava/lang/String;
        move-result-object v0
        return-void"#,
        // A X B C
        r#"const-string v0, "a"
        nop
        invoke-virtual {v0}, Ljava/lang/Object;->toString()Ljava/lang/String;
        move-result-object v0
        return-void"#,
    ]);
    let class = &pool.classes()[0];
    let fp = Fingerprint::builder("run").opcodes(RUN).build();

    let scan = fp.scan(&class.methods()[0], class).unwrap();
    assert_eq!(scan.opcodes, Some(1..4));
    assert!(fp.scan(&class.methods()[1], class).is_none());
}

#[test]
fn empty_opcode_run_is_a_wildcard() {
    let pool = pool_of_bodies(&["return-void"]);
    let (c, m) = first(&pool);
    let fp = Fingerprint::builder("empty").opcodes([]).build();
    assert_eq!(fp.opcodes(), None);
    assert_eq!(fp.scan(m, c).unwrap().opcodes, None);
}

#[test]
fn every_string_must_be_loaded() {
    let pool = pool_of_bodies(&[r#"const-string v0, "try_voice_search"
        const-string/jumbo v1, "search_with_your_voice"
        const-string v0, "try_voice_search"
        return-void"#]);
    let (c, m) = first(&pool);

    let fp = Fingerprint::builder("both")
        .strings(["search_with_your_voice", "try_voice_search"])
        .build();
    assert_eq!(fp.scan(m, c).unwrap().strings, [1, 0]);

    let fp = Fingerprint::builder("missing")
        .strings(["try_voice_search", ",com.example.searchbox="])
        .build();
    assert!(!fp.matches(m, c));
}

#[test]
fn content_constraints_need_a_body() {
    let pool = pool(
        "classes:\n  - class: LA;\n    methods:\n      - name: f\n        access: PUBLIC | ABSTRACT\n",
    );
    let (c, m) = first(&pool);

    assert!(Fingerprint::builder("sig").returns("V").build().matches(m, c));
    assert!(
        !Fingerprint::builder("ops")
            .opcodes([Opcode::ReturnVoid])
            .build()
            .matches(m, c)
    );
    assert!(
        !Fingerprint::builder("str")
            .strings(["x"])
            .build()
            .matches(m, c)
    );
}

#[test]
fn custom_predicate_runs_last() {
    let pool = pool_of_bodies(&["return-void"]);
    let (c, m) = first(&pool);

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let fp = Fingerprint::builder("counted")
        .returns("I")
        .custom(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
        .build();
    assert!(!fp.matches(m, c));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let counter = calls.clone();
    let fp = Fingerprint::builder("counted")
        .returns("V")
        .custom(move |m, class| {
            counter.fetch_add(1, Ordering::SeqCst);
            class.descriptor() == "Lapp/Main;" && m.name() == "m0"
        })
        .build();
    assert!(fp.matches(m, c));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn literal_helpers() {
    let pool = pool_of_bodies(&[
        "const v0, 0x7f0e01d8\nreturn-void",
        "const-wide v0, 0x7f0e01d8\nreturn-void",
        "const/16 v0, -0x2\nreturn-void",
    ]);
    let class = &pool.classes()[0];
    let ms = class.methods();

    let one = has_literal(0x7f0e01d8);
    assert!(one(&ms[0], class));
    // Wide loads are not narrow literals.
    assert!(!one(&ms[1], class));

    let any = has_any_literal([0x7f0e06c4, -2]);
    assert!(!any(&ms[0], class));
    assert!(any(&ms[2], class));
}

#[test]
fn evaluation_does_not_touch_the_method() {
    let pool = pool_of_bodies(&["const v0, 0x7f0e01d8\nreturn-void"]);
    let before = pool.clone();
    let (c, m) = first(&pool);
    let fp = Fingerprint::builder("lit")
        .opcodes([Opcode::Const])
        .custom(has_literal(0x7f0e01d8))
        .build();
    assert!(fp.matches(m, c));
    assert!(fp.matches(m, c));
    assert_eq!(pool, before);
}

#[test]
fn fingerprints_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Fingerprint>();
}
