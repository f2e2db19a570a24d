use dexpatch_file::{Pool, document};

#[allow(dead_code)]
pub const SAMPLE: &str = r#"
classes:
  - class: Lapp/SearchFragment;
    super: Landroid/app/Fragment;
    access: PUBLIC
    methods:
      - name: <init>
        parameters: [Landroid/content/Context;]
        access: PUBLIC | CONSTRUCTOR
        registers: 3
        code: |
          invoke-direct {v1}, Landroid/app/Fragment;-><init>()V
          const v0, 0x7f0e01d8
          iput v0, v1, Lapp/SearchFragment;->layout:I
          return-void
      - name: query
        returns: Ljava/lang/String;
        access: PUBLIC
        code: |
          const-string v0, "search_query"
          return-object v0
  - class: Lapp/Listener;
    access: PUBLIC | INTERFACE | ABSTRACT
    methods:
      - name: onQuery
        parameters: [Ljava/lang/String;, I]
        access: PUBLIC | ABSTRACT
"#;

#[allow(dead_code)]
pub fn sample_pool() -> Pool {
    document::from_str(SAMPLE).unwrap()
}
