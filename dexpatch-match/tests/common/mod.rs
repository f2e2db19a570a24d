use dexpatch_file::{Pool, document};

/// Two classes with the same bridge method shape; only the first one has a
/// constructor loading the resource id `0x7f0e01d8`.
#[allow(dead_code)]
pub const HINTS: &str = r#"
classes:
  - class: Lapp/DidYouMean;
    access: PUBLIC
    methods:
      - name: <init>
        parameters: [Landroid/content/Context;]
        access: PUBLIC | CONSTRUCTOR
        code: |
          const v0, 0x7f0e01d8
          iput v0, v1, Lapp/DidYouMean;->layout:I
          return-void
      - name: bind
        parameters: [Ljava/lang/Object;]
        access: PUBLIC | FINAL | BRIDGE | SYNTHETIC
        code: |
          check-cast v1, Lapp/Hint;
          return-void
  - class: Lapp/ShowingResults;
    access: PUBLIC
    methods:
      - name: <init>
        access: PUBLIC | CONSTRUCTOR
        code: |
          const v0, 0x7f0e06c4
          return-void
      - name: bind
        parameters: [Ljava/lang/Object;]
        access: PUBLIC | FINAL | BRIDGE | SYNTHETIC
        code: |
          return-void
"#;

#[allow(dead_code)]
pub fn pool(yaml: &str) -> Pool {
    document::from_str(yaml).unwrap_or_else(|e| panic!("{e}"))
}

/// A pool with one class holding one public method per body.
#[allow(dead_code)]
pub fn pool_of_bodies(bodies: &[&str]) -> Pool {
    let mut doc = String::from("classes:\n  - class: Lapp/Main;\n    methods:\n");
    for (i, body) in bodies.iter().enumerate() {
        doc.push_str(&format!(
            "      - name: m{i}\n        access: PUBLIC\n        code: |\n"
        ));
        for line in body.lines() {
            doc.push_str(&format!("          {}\n", line.trim()));
        }
    }
    pool(&doc)
}
