use dexpatch_file::{Body, Method};
use dexpatch_isa::{Instruction, Reg, Role};

use crate::anchor::{self, Direction};
use crate::error::{EditError, Result};
use crate::ops::{self, Placement};
use crate::template::{Bindings, Template};

/// Editing operations on a [`Method`].
///
/// The `with_*` methods return the edited body and leave the method alone;
/// [`add_instructions`](MethodEdit::add_instructions) installs the result.
pub trait MethodEdit {
    fn find_anchor(
        &self,
        predicate: impl Fn(&Instruction) -> bool,
        direction: Direction,
    ) -> Result<usize>;

    fn register_at(&self, index: usize, role: Role) -> Result<Reg>;

    fn with_inserted(
        &self,
        index: usize,
        placement: Placement,
        template: &Template,
        bindings: &Bindings,
    ) -> Result<Body>;

    fn with_replaced(&self, index: usize, template: &Template, bindings: &Bindings) -> Result<Body>;

    fn with_removed(&self, index: usize) -> Result<Body>;

    fn add_instructions(
        &mut self,
        index: usize,
        placement: Placement,
        template: &Template,
        bindings: &Bindings,
    ) -> Result<()>;
}

fn body_of(method: &Method) -> Result<&Body> {
    method
        .body()
        .ok_or_else(|| EditError::MissingBody(method.signature().to_string()))
}

impl MethodEdit for Method {
    fn find_anchor(
        &self,
        predicate: impl Fn(&Instruction) -> bool,
        direction: Direction,
    ) -> Result<usize> {
        anchor::find_anchor(body_of(self)?.instructions(), predicate, direction)
    }

    fn register_at(&self, index: usize, role: Role) -> Result<Reg> {
        anchor::register_at(body_of(self)?.instructions(), index, role)
    }

    fn with_inserted(
        &self,
        index: usize,
        placement: Placement,
        template: &Template,
        bindings: &Bindings,
    ) -> Result<Body> {
        ops::insert(body_of(self)?, index, placement, template, bindings)
    }

    fn with_replaced(
        &self,
        index: usize,
        template: &Template,
        bindings: &Bindings,
    ) -> Result<Body> {
        ops::replace(body_of(self)?, index, template, bindings)
    }

    fn with_removed(&self, index: usize) -> Result<Body> {
        ops::remove(body_of(self)?, index)
    }

    fn add_instructions(
        &mut self,
        index: usize,
        placement: Placement,
        template: &Template,
        bindings: &Bindings,
    ) -> Result<()> {
        let body = self.with_inserted(index, placement, template, bindings)?;
        self.replace_body(body)?;
        Ok(())
    }
}
