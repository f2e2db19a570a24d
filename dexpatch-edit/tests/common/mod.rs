use dexpatch_file::Body;
use dexpatch_isa::disassemble;

pub const HOOKS: &str = "Lapp/Hooks;";

/// Assemble a body, panicking on error.
#[allow(dead_code)]
pub fn body(registers: u16, code: &str) -> Body {
    Body::parse(registers, code).unwrap_or_else(|e| panic!("{e}\n{code}"))
}

/// The body as text, for readable assertion failures.
#[allow(dead_code)]
pub fn listing(body: &Body) -> String {
    disassemble(body.instructions())
}

/// Shaped like a fragment's `onCreateView`: reads the query out of a bundle.
#[allow(dead_code)]
pub const SEARCH_FRAGMENT: &str = r#"
move-object/from16 v0, v20
const-string v3, "other"
invoke-direct {v0}, Lapp/Frag;->check()Z
move-result v1
if-eqz v1, :skip
const-string v3, "search_query"
invoke-virtual {v2, v3}, Landroid/os/Bundle;->getString(Ljava/lang/String;)Ljava/lang/String;
move-result-object v3
iput-object v3, v0, Lapp/Frag;->query:Ljava/lang/String;
:skip
return-object v0
"#;
