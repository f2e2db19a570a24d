//! Declarative method fingerprints.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use dexpatch_file::{AccessFlags, ClassDef, Method};
use dexpatch_isa::Opcode;

/// A caller-supplied test run after every declarative constraint passed.
pub type CustomPredicate = dyn Fn(&Method, &ClassDef) -> bool + Send + Sync;

/// A set of structural constraints that identifies a method.
///
/// All constraints must hold. Absent constraints match anything.
/// Fingerprints hold no per-match state and can be shared between threads.
#[derive(Clone)]
pub struct Fingerprint {
    name: String,
    access: AccessFlags,
    parameters: Option<Vec<String>>,
    returns: Option<String>,
    opcodes: Option<Vec<Opcode>>,
    strings: Vec<String>,
    custom: Option<Arc<CustomPredicate>>,
}

/// Where the content constraints of a fingerprint were satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    /// First occurrence of the opcode run.
    pub opcodes: Option<Range<usize>>,
    /// Index of the first `const-string` for each required string, in the
    /// order the strings were declared.
    pub strings: Vec<usize>,
}

impl Fingerprint {
    pub fn builder(name: impl Into<String>) -> FingerprintBuilder {
        FingerprintBuilder {
            fp: Fingerprint {
                name: name.into(),
                access: AccessFlags::empty(),
                parameters: None,
                returns: None,
                opcodes: None,
                strings: Vec::new(),
                custom: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn access_flags(&self) -> AccessFlags {
        self.access
    }

    pub fn parameters(&self) -> Option<&[String]> {
        self.parameters.as_deref()
    }

    pub fn return_type(&self) -> Option<&str> {
        self.returns.as_deref()
    }

    pub fn opcodes(&self) -> Option<&[Opcode]> {
        self.opcodes.as_deref()
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn matches(&self, method: &Method, class: &ClassDef) -> bool {
        self.scan(method, class).is_some()
    }

    /// Evaluate the fingerprint against one method. Returns where the
    /// content constraints matched, or `None` if any constraint fails.
    pub fn scan(&self, method: &Method, class: &ClassDef) -> Option<Scan> {
        if !method.access_flags().contains(self.access) {
            return None;
        }
        if self
            .returns
            .as_deref()
            .is_some_and(|r| r != method.return_type())
        {
            return None;
        }
        if self
            .parameters
            .as_deref()
            .is_some_and(|p| p != method.parameters())
        {
            return None;
        }

        let needs_body = self.opcodes.is_some() || !self.strings.is_empty();
        if needs_body && method.body().is_none() {
            return None;
        }
        let insns = method.instructions();

        let mut strings = Vec::with_capacity(self.strings.len());
        for wanted in &self.strings {
            let at = insns
                .iter()
                .position(|i| i.string_ref() == Some(wanted.as_str()))?;
            strings.push(at);
        }

        let opcodes = match &self.opcodes {
            Some(pattern) => Some(find_run(insns.iter().map(|i| i.opcode()), pattern)?),
            None => None,
        };

        if let Some(custom) = &self.custom
            && !custom(method, class)
        {
            return None;
        }

        Some(Scan { opcodes, strings })
    }
}

/// First window of `haystack` equal to `pattern`.
fn find_run(haystack: impl Iterator<Item = Opcode>, pattern: &[Opcode]) -> Option<Range<usize>> {
    let ops: Vec<Opcode> = haystack.collect();
    ops.windows(pattern.len())
        .position(|w| w == pattern)
        .map(|start| start..start + pattern.len())
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fingerprint")
            .field("name", &self.name)
            .field("access", &self.access)
            .field("parameters", &self.parameters)
            .field("returns", &self.returns)
            .field("opcodes", &self.opcodes)
            .field("strings", &self.strings)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Builder for [`Fingerprint`].
pub struct FingerprintBuilder {
    fp: Fingerprint,
}

impl FingerprintBuilder {
    /// Flags the method must have. Extra flags on the method are allowed.
    pub fn access_flags(mut self, flags: AccessFlags) -> Self {
        self.fp.access = flags;
        self
    }

    /// Exact parameter type descriptors, in order.
    pub fn parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fp.parameters = Some(parameters.into_iter().map(Into::into).collect());
        self
    }

    pub fn returns(mut self, ty: impl Into<String>) -> Self {
        self.fp.returns = Some(ty.into());
        self
    }

    /// A run of opcodes that must appear back to back. An empty run is the
    /// same as no constraint.
    pub fn opcodes(mut self, opcodes: impl IntoIterator<Item = Opcode>) -> Self {
        let opcodes: Vec<_> = opcodes.into_iter().collect();
        self.fp.opcodes = (!opcodes.is_empty()).then_some(opcodes);
        self
    }

    /// Strings that must each be loaded by some `const-string`.
    pub fn strings<I, S>(mut self, strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fp.strings = strings.into_iter().map(Into::into).collect();
        self
    }

    pub fn custom<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Method, &ClassDef) -> bool + Send + Sync + 'static,
    {
        self.fp.custom = Some(Arc::new(predicate));
        self
    }

    pub fn build(self) -> Fingerprint {
        self.fp
    }
}

/// Custom predicate: some narrow `const*` load in the body equals `value`.
pub fn has_literal(value: i64) -> impl Fn(&Method, &ClassDef) -> bool + Send + Sync + 'static {
    move |method: &Method, _: &ClassDef| {
        method
            .instructions()
            .iter()
            .any(|i| i.narrow_literal().map(i64::from) == Some(value))
    }
}

/// Custom predicate: some narrow `const*` load equals any of `values`.
pub fn has_any_literal(
    values: impl IntoIterator<Item = i64>,
) -> impl Fn(&Method, &ClassDef) -> bool + Send + Sync + 'static {
    let values: Vec<i64> = values.into_iter().collect();
    move |method: &Method, _: &ClassDef| {
        method.instructions().iter().any(|i| {
            i.narrow_literal()
                .is_some_and(|v| values.contains(&i64::from(v)))
        })
    }
}
