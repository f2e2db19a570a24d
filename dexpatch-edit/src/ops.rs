//! Body rewriting. Every operation returns a new [`Body`]; the input is
//! never modified.

use dexpatch_file::Body;
use dexpatch_isa::{Instruction, Label};

use crate::error::{EditError, Result};
use crate::template::{Bindings, Template};

/// Where template code goes relative to the anchor instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Placement {
    #[default]
    Before,
    After,
}

/// Insert `template` before or after the instruction at `index`.
///
/// `Before` with `index == len` appends. Existing branches to the insertion
/// point or beyond are shifted so they keep their original targets.
pub fn insert(
    body: &Body,
    index: usize,
    placement: Placement,
    template: &Template,
    bindings: &Bindings,
) -> Result<Body> {
    let len = body.len();
    let at = match placement {
        Placement::Before if index <= len => index,
        Placement::After if index < len => index + 1,
        _ => return Err(EditError::IndexOutOfBounds { index, len }),
    };
    let code = template.instantiate(at as u32, bindings)?;
    log::debug!(
        "inserting {} instruction(s) at {at} ({placement:?} {index})",
        code.len()
    );
    splice(body, at, 0, code)
}

/// Replace the instruction at `index` with `template`. Branches to the
/// replaced instruction land on the first template instruction.
pub fn replace(
    body: &Body,
    index: usize,
    template: &Template,
    bindings: &Bindings,
) -> Result<Body> {
    check_index(body, index)?;
    let code = template.instantiate(index as u32, bindings)?;
    splice(body, index, 1, code)
}

/// Remove the instruction at `index`. Branches to it land on its successor.
pub fn remove(body: &Body, index: usize) -> Result<Body> {
    check_index(body, index)?;
    splice(body, index, 1, Vec::new())
}

fn check_index(body: &Body, index: usize) -> Result<()> {
    if index < body.len() {
        Ok(())
    } else {
        Err(EditError::IndexOutOfBounds {
            index,
            len: body.len(),
        })
    }
}

/// Replace `removed` instructions at `at` with `code`, whose branch targets
/// are already absolute.
fn splice(body: &Body, at: usize, removed: usize, code: Vec<Instruction>) -> Result<Body> {
    let registers = body.register_count();
    if let Some(&reg) = code
        .iter()
        .flat_map(|i| i.registers())
        .find(|r| r.0 >= registers)
    {
        return Err(EditError::RegisterOutOfRange { reg, registers });
    }

    let (at32, removed32, added32) = (at as u32, removed as u32, code.len() as u32);
    let relocate = |l: Label| {
        if l.0 < at32 {
            l
        } else if l.0 < at32 + removed32 {
            Label(at32)
        } else {
            Label(l.0 - removed32 + added32)
        }
    };

    let old = body.instructions();
    let mut out = Vec::with_capacity(old.len() - removed + code.len());
    out.extend(old[..at].iter().map(|i| i.map_target(relocate)));
    out.extend(code);
    out.extend(old[at + removed..].iter().map(|i| i.map_target(relocate)));
    Ok(body.with_instructions(out)?)
}
