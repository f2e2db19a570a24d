use dexpatch_file::{Pool, document};

/// A search fragment plus two hint views sharing a bridge method shape.
#[allow(dead_code)]
pub const APP: &str = r#"
classes:
  - class: Lapp/SearchFragment;
    super: Landroid/app/Fragment;
    access: PUBLIC
    methods:
      - name: onCreateView
        returns: Landroid/view/View;
        access: PUBLIC | FINAL
        code: |
          iget-object v0, v3, Lapp/SearchFragment;->args:Landroid/os/Bundle;
          if-eqz v0, :skip
          const-string v1, "search_query"
          invoke-virtual {v0, v1}, Landroid/os/Bundle;->getString(Ljava/lang/String;)Ljava/lang/String;
          move-result-object v2
          invoke-virtual {v3, v2}, Lapp/SearchFragment;->submit(Ljava/lang/String;)V
          :skip
          const/4 v0, 0x0
          return-object v0
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
pub const ON_CREATE_VIEW: &str = "Lapp/SearchFragment;->onCreateView()Landroid/view/View;";

#[allow(dead_code)]
pub fn app() -> Pool {
    document::from_str(APP).unwrap_or_else(|e| panic!("{e}"))
}

/// Body listing of the method with signature `sig`.
#[allow(dead_code)]
pub fn listing(pool: &Pool, sig: &str) -> String {
    let sig = dexpatch_isa::MethodRef::parse(sig).unwrap();
    let id = pool.find_method(&sig).unwrap();
    dexpatch_isa::disassemble(pool.method(id).unwrap().instructions())
}
