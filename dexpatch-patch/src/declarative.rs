//! Patches written as YAML documents.
//!
//! ```yaml
//! patches:
//!   - name: Hook query
//!     description: Route the search query through a hook.
//!     compatible:
//!       - package: com.example.app
//!         versions: ["1.2.0"]
//!     depends: [Shared hooks]
//!     fingerprints:
//!       fragment:
//!         access: PUBLIC | FINAL
//!         returns: Landroid/view/View;
//!         strings: [search_query]
//!       hint_ctor:
//!         access: PUBLIC | CONSTRUCTOR
//!         literals: [0x7f0e01d8]
//!       hint_bind:
//!         class_of: hint_ctor
//!         access: PUBLIC | BRIDGE
//!     edits:
//!       - method: fragment
//!         anchor: { opcode: const-string, string: search_query }
//!         registers:
//!           query: { offset: 1, role: D }
//!           bundle: { offset: 1, role: C }
//!         at: 3
//!         template: |
//!           invoke-static {$query, $bundle}, Lapp/Hooks;->append(Ljava/lang/String;Landroid/os/Bundle;)Ljava/lang/String;
//!           move-result-object $query
//! ```
//!
//! In `method_parameters`, `*` stands for any single parameter type. A
//! `remove` edit takes neither `template` nor `registers`.
//!
//! Each edit searches for its anchor in the method body as left by the
//! previous edits, so later edits never rely on stale indices.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use dexpatch_edit::predicates;
use dexpatch_edit::{Bindings, Direction, Placement, Template, find_anchor, register_at};
use dexpatch_file::{AccessFlags, Body, MethodId, Pool, Scope};
use dexpatch_isa::{Instruction, Opcode, Role};
use dexpatch_match::{Fingerprint, Match, has_any_literal, matcher};
use serde::Deserialize;

use crate::context::PatchContext;
use crate::error::{DeclarativeError, PatchError};
use crate::patch::{Compatibility, Patch};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    #[serde(default)]
    patches: Vec<PatchDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PatchDoc {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    compatible: Vec<Compatibility>,
    #[serde(default)]
    depends: Vec<String>,
    #[serde(default)]
    fingerprints: BTreeMap<String, FingerprintDoc>,
    #[serde(default)]
    edits: Vec<EditDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FingerprintDoc {
    #[serde(default)]
    access: AccessFlags,
    #[serde(default)]
    parameters: Option<Vec<String>>,
    #[serde(default)]
    returns: Option<String>,
    #[serde(default)]
    opcodes: Vec<String>,
    #[serde(default)]
    strings: Vec<String>,
    #[serde(default)]
    literals: Vec<i64>,
    #[serde(default)]
    class_of: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ActionDoc {
    #[default]
    Insert,
    Replace,
    Remove,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PlacementDoc {
    #[default]
    Before,
    After,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum DirectionDoc {
    #[default]
    First,
    Last,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EditDoc {
    method: String,
    anchor: AnchorDoc,
    #[serde(default)]
    registers: BTreeMap<String, RegisterDoc>,
    #[serde(default)]
    at: isize,
    #[serde(default)]
    action: ActionDoc,
    #[serde(default)]
    placement: PlacementDoc,
    #[serde(default)]
    template: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnchorDoc {
    #[serde(default)]
    opcode: Option<String>,
    #[serde(default)]
    string: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    method_class: Option<String>,
    #[serde(default)]
    method_parameters: Option<Vec<String>>,
    #[serde(default)]
    method_returns: Option<String>,
    #[serde(default)]
    literal: Option<i64>,
    #[serde(default)]
    direction: DirectionDoc,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegisterDoc {
    #[serde(default)]
    offset: isize,
    role: String,
}

type InsnPredicate = Box<dyn Fn(&Instruction) -> bool + Send + Sync>;

struct Anchor {
    tests: Vec<InsnPredicate>,
    direction: Direction,
    description: String,
}

impl Anchor {
    fn matches(&self, insn: &Instruction) -> bool {
        self.tests.iter().all(|t| t(insn))
    }
}

enum Action {
    Insert(Placement),
    Replace,
    Remove,
}

struct RegisterSource {
    name: String,
    offset: isize,
    role: Role,
}

struct EditStep {
    method: String,
    anchor: Anchor,
    registers: Vec<RegisterSource>,
    at: isize,
    action: Action,
    template: Template,
}

struct NamedFingerprint {
    fingerprint: Fingerprint,
    class_of: Option<String>,
}

/// A patch loaded from a YAML document.
pub struct DeclarativePatch {
    name: String,
    description: Option<String>,
    compatibility: Vec<Compatibility>,
    dependencies: Vec<String>,
    fingerprints: BTreeMap<String, NamedFingerprint>,
    steps: Vec<EditStep>,
}

/// Parse a YAML patch document.
pub fn from_str(text: &str) -> Result<Vec<DeclarativePatch>, DeclarativeError> {
    let doc: Document = serde_yaml::from_str(text)?;
    doc.patches.into_iter().map(DeclarativePatch::compile).collect()
}

pub fn load(path: &Path) -> Result<Vec<DeclarativePatch>, DeclarativeError> {
    from_str(&std::fs::read_to_string(path)?)
}

impl DeclarativePatch {
    fn compile(doc: PatchDoc) -> Result<Self, DeclarativeError> {
        let patch = doc.name;

        let mut fingerprints = BTreeMap::new();
        for (name, fp) in doc.fingerprints {
            let compiled = compile_fingerprint(&patch, &name, fp)?;
            fingerprints.insert(name, compiled);
        }
        for name in fingerprints.keys() {
            check_class_of(&patch, name, &fingerprints)?;
        }

        let steps = doc
            .edits
            .into_iter()
            .enumerate()
            .map(|(i, e)| compile_step(&patch, i + 1, e, &fingerprints))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: patch,
            description: doc.description,
            compatibility: doc.compatible,
            dependencies: doc.depends,
            fingerprints,
            steps,
        })
    }

    /// Fingerprint names with their optional `class_of` anchor.
    pub fn fingerprints(&self) -> impl Iterator<Item = (&str, &Fingerprint, Option<&str>)> {
        self.fingerprints
            .iter()
            .map(|(n, f)| (n.as_str(), &f.fingerprint, f.class_of.as_deref()))
    }

    pub fn edit_count(&self) -> usize {
        self.steps.len()
    }

    /// Resolve a named fingerprint, first resolving its `class_of` chain.
    pub fn resolve<'p>(&self, name: &str, pool: &'p Pool) -> Result<Match<'p>, PatchError> {
        let named = self
            .fingerprints
            .get(name)
            .ok_or_else(|| PatchError::Custom(format!("unknown fingerprint `{name}`")))?;
        let scope = match &named.class_of {
            Some(anchor) => self.resolve(anchor, pool)?.class_scope(),
            None => Scope::Package,
        };
        Ok(matcher::resolve(&named.fingerprint, pool, &scope)?)
    }
}

impl Patch for DeclarativePatch {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn compatibility(&self) -> &[Compatibility] {
        &self.compatibility
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    fn execute(&self, ctx: &mut PatchContext<'_>) -> Result<(), PatchError> {
        let mut methods: HashMap<&str, MethodId> = HashMap::new();
        for (i, step) in self.steps.iter().enumerate() {
            let id = match methods.get(step.method.as_str()) {
                Some(&id) => id,
                None => {
                    let id = self.resolve(&step.method, ctx.pool())?.id;
                    methods.insert(&step.method, id);
                    id
                }
            };
            log::debug!(
                "{}: edit {} on `{}` at {}",
                self.name,
                i + 1,
                step.method,
                step.anchor.description
            );
            ctx.edit(id, |body| step.apply(body))
                .map_err(|e| e.context(format!("edit {}", i + 1)))?;
        }
        Ok(())
    }
}

impl fmt::Debug for DeclarativePatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeclarativePatch")
            .field("name", &self.name)
            .field("compatibility", &self.compatibility)
            .field("dependencies", &self.dependencies)
            .field("fingerprints", &self.fingerprints.keys().collect::<Vec<_>>())
            .field("edits", &self.steps.len())
            .finish()
    }
}

impl EditStep {
    fn apply(&self, body: &Body) -> Result<Body, PatchError> {
        let insns = body.instructions();
        let anchor = find_anchor(insns, |i| self.anchor.matches(i), self.anchor.direction)?;

        let mut bindings = Bindings::new();
        for r in &self.registers {
            let index = offset(anchor, r.offset)?;
            bindings.insert(r.name.as_str(), register_at(insns, index, r.role)?);
        }

        let at = offset(anchor, self.at)?;
        let out = match self.action {
            Action::Insert(p) => dexpatch_edit::insert(body, at, p, &self.template, &bindings)?,
            Action::Replace => dexpatch_edit::replace(body, at, &self.template, &bindings)?,
            Action::Remove => dexpatch_edit::remove(body, at)?,
        };
        Ok(out)
    }
}

fn offset(anchor: usize, delta: isize) -> Result<usize, PatchError> {
    anchor.checked_add_signed(delta).ok_or_else(|| {
        PatchError::Custom(format!(
            "offset {delta} from anchor {anchor} is before the start of the body"
        ))
    })
}

fn compile_fingerprint(
    patch: &str,
    name: &str,
    doc: FingerprintDoc,
) -> Result<NamedFingerprint, DeclarativeError> {
    let opcodes = doc
        .opcodes
        .iter()
        .map(|m| parse_opcode(patch, m))
        .collect::<Result<Vec<_>, _>>()?;

    let mut b = Fingerprint::builder(name)
        .access_flags(doc.access)
        .opcodes(opcodes)
        .strings(doc.strings);
    if let Some(p) = doc.parameters {
        b = b.parameters(p);
    }
    if let Some(r) = doc.returns {
        b = b.returns(r);
    }
    if !doc.literals.is_empty() {
        b = b.custom(has_any_literal(doc.literals));
    }
    Ok(NamedFingerprint {
        fingerprint: b.build(),
        class_of: doc.class_of,
    })
}

fn check_class_of(
    patch: &str,
    start: &str,
    fingerprints: &BTreeMap<String, NamedFingerprint>,
) -> Result<(), DeclarativeError> {
    let mut current = start;
    for _ in 0..=fingerprints.len() {
        let Some(next) = fingerprints[current].class_of.as_deref() else {
            return Ok(());
        };
        if !fingerprints.contains_key(next) {
            return Err(DeclarativeError::UnknownFingerprint {
                patch: patch.to_string(),
                name: next.to_string(),
            });
        }
        current = next;
    }
    Err(DeclarativeError::ClassOfCycle {
        patch: patch.to_string(),
        name: start.to_string(),
    })
}

fn compile_step(
    patch: &str,
    step: usize,
    doc: EditDoc,
    fingerprints: &BTreeMap<String, NamedFingerprint>,
) -> Result<EditStep, DeclarativeError> {
    if !fingerprints.contains_key(&doc.method) {
        return Err(DeclarativeError::UnknownFingerprint {
            patch: patch.to_string(),
            name: doc.method,
        });
    }

    let anchor = compile_anchor(patch, step, doc.anchor)?;

    if matches!(doc.action, ActionDoc::Remove)
        && (!doc.template.trim().is_empty() || !doc.registers.is_empty())
    {
        return Err(DeclarativeError::RemoveWithCode {
            patch: patch.to_string(),
            step,
        });
    }

    let registers = doc
        .registers
        .into_iter()
        .map(|(name, r)| {
            let role = parse_role(&r.role).ok_or_else(|| DeclarativeError::UnknownRole {
                patch: patch.to_string(),
                role: r.role.clone(),
            })?;
            Ok(RegisterSource {
                name,
                offset: r.offset,
                role,
            })
        })
        .collect::<Result<Vec<_>, DeclarativeError>>()?;

    let template = Template::parse(&doc.template).map_err(|source| DeclarativeError::Template {
        patch: patch.to_string(),
        step,
        source,
    })?;
    if let Some(name) = template
        .placeholders()
        .find(|p| !registers.iter().any(|r| r.name == *p))
    {
        return Err(DeclarativeError::UnboundPlaceholder {
            patch: patch.to_string(),
            step,
            name: name.to_string(),
        });
    }

    let action = match doc.action {
        ActionDoc::Insert => Action::Insert(match doc.placement {
            PlacementDoc::Before => Placement::Before,
            PlacementDoc::After => Placement::After,
        }),
        ActionDoc::Replace => Action::Replace,
        ActionDoc::Remove => Action::Remove,
    };

    Ok(EditStep {
        method: doc.method,
        anchor,
        registers,
        at: doc.at,
        action,
        template,
    })
}

fn compile_anchor(patch: &str, step: usize, doc: AnchorDoc) -> Result<Anchor, DeclarativeError> {
    let mut tests: Vec<InsnPredicate> = Vec::new();
    let mut parts = Vec::new();

    if let Some(m) = &doc.opcode {
        let op = parse_opcode(patch, m)?;
        tests.push(Box::new(predicates::opcode(op)));
        parts.push(format!("opcode={op}"));
    }
    if let Some(s) = doc.string {
        parts.push(format!("string={s:?}"));
        tests.push(Box::new(predicates::string_eq(s)));
    }
    if let Some(name) = doc.method {
        parts.push(format!("method={name}"));
        tests.push(Box::new(predicates::method_named(name)));
    }
    let (class, params, ret) = (doc.method_class, doc.method_parameters, doc.method_returns);
    if class.is_some() || params.is_some() || ret.is_some() {
        parts.push("callee shape".to_string());
        tests.push(Box::new(predicates::method_matches(move |m| {
            class.as_ref().is_none_or(|c| *c == m.class)
                && params.as_ref().is_none_or(|p| parameters_match(p, &m.parameters))
                && ret.as_ref().is_none_or(|r| *r == m.return_type)
        })));
    }
    if let Some(v) = doc.literal {
        parts.push(format!("literal={v:#x}"));
        tests.push(Box::new(predicates::literal_eq(v)));
    }

    if tests.is_empty() {
        return Err(DeclarativeError::EmptyAnchor {
            patch: patch.to_string(),
            step,
        });
    }

    let direction = match doc.direction {
        DirectionDoc::First => Direction::First,
        DirectionDoc::Last => Direction::Last,
    };
    Ok(Anchor {
        tests,
        direction,
        description: format!("{direction} {}", parts.join(" ")),
    })
}

/// Exact match, except that `*` accepts any type at its position.
fn parameters_match(pattern: &[String], actual: &[String]) -> bool {
    pattern.len() == actual.len()
        && pattern
            .iter()
            .zip(actual)
            .all(|(p, a)| p == "*" || p == a)
}

fn parse_opcode(patch: &str, mnemonic: &str) -> Result<Opcode, DeclarativeError> {
    Opcode::from_mnemonic(mnemonic).ok_or_else(|| DeclarativeError::UnknownOpcode {
        patch: patch.to_string(),
        name: mnemonic.to_string(),
    })
}

/// `C` or `registerC`.
fn parse_role(s: &str) -> Option<Role> {
    let letter = s.strip_prefix("register").unwrap_or(s);
    let mut chars = letter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Role::from_letter(c),
        _ => None,
    }
}
