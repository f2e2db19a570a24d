//! Instruction templates with `$placeholder` registers.

use std::collections::BTreeMap;

use dexpatch_isa::{Instruction, Program, Reg};

use crate::error::{EditError, Result};

/// A parsed instruction sequence whose registers may be placeholders.
///
/// ```text
/// invoke-static {$query, $bundle}, Lapp/Hooks;->append(Ljava/lang/String;Landroid/os/Bundle;)Ljava/lang/String;
/// move-result-object $query
/// ```
///
/// Labels are local to the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    program: Program,
}

impl Template {
    /// Parse and check a template. Labels, operand layouts and references
    /// are validated here; only register bindings are left for later.
    pub fn parse(text: &str) -> Result<Self> {
        let program = Program::parse(text)?;
        program.lower(0, |_| Some(Reg(0)))?;
        Ok(Self { program })
    }

    /// Number of instructions the template expands to.
    pub fn len(&self) -> usize {
        self.program.len()
    }

    pub fn is_empty(&self) -> bool {
        self.program.is_empty()
    }

    /// Placeholder names, sorted.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.program.placeholders().into_iter()
    }

    /// Expand with placeholders bound to registers and local labels placed
    /// as if the first instruction sits at index `base`.
    pub fn instantiate(&self, base: u32, bindings: &Bindings) -> Result<Vec<Instruction>> {
        if let Some(name) = self
            .program
            .placeholders()
            .into_iter()
            .find(|name| bindings.get(name).is_none())
        {
            return Err(EditError::UnboundPlaceholder(name.to_string()));
        }
        Ok(self.program.lower(base, |name| bindings.get(name))?)
    }
}

/// Placeholder name to register.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(BTreeMap<String, Reg>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, name: impl Into<String>, reg: Reg) -> Self {
        self.insert(name, reg);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, reg: Reg) -> Option<Reg> {
        self.0.insert(name.into(), reg)
    }

    pub fn get(&self, name: &str) -> Option<Reg> {
        self.0.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Reg)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, Reg)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (S, Reg)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
