//! Methods and their copy-on-write bodies.

use std::sync::Arc;

use dexpatch_isa::{Instruction, MethodRef, assemble};

use crate::access::AccessFlags;
use crate::error::{Error, Result};

/// A method body: register frame size plus an immutable instruction
/// sequence. Cloning is cheap; edits build a new body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    registers: u16,
    insns: Arc<[Instruction]>,
}

impl Body {
    /// Build a body, checking every register fits the frame and every branch
    /// lands inside the body.
    pub fn new(registers: u16, insns: impl Into<Arc<[Instruction]>>) -> Result<Self> {
        let insns = insns.into();
        for (index, insn) in insns.iter().enumerate() {
            if let Some(&reg) = insn.registers().iter().find(|r| r.0 >= registers) {
                return Err(Error::RegisterOutOfRange { reg, registers });
            }
            if let Some(target) = insn.target()
                && target.0 as usize >= insns.len()
            {
                return Err(Error::TargetOutOfRange {
                    index,
                    target: target.0,
                    len: insns.len(),
                });
            }
        }
        Ok(Self { registers, insns })
    }

    /// Assemble `code` into a body with `registers` registers.
    pub fn parse(registers: u16, code: &str) -> Result<Self> {
        Self::new(registers, assemble(code)?)
    }

    /// A body with the same frame size and new instructions.
    pub fn with_instructions(&self, insns: impl Into<Arc<[Instruction]>>) -> Result<Self> {
        Self::new(self.registers, insns)
    }

    #[inline]
    pub fn register_count(&self) -> u16 {
        self.registers
    }

    #[inline]
    pub fn instructions(&self) -> &[Instruction] {
        &self.insns
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.insns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.insns.get(index)
    }

    /// Whether two bodies share the same instruction storage.
    pub fn ptr_eq(&self, other: &Body) -> bool {
        Arc::ptr_eq(&self.insns, &other.insns)
    }
}

/// A method: signature, access flags and optional body.
///
/// Identity is the signature. The body can only be changed through
/// [`Method::replace_body`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    signature: MethodRef,
    access: AccessFlags,
    body: Option<Body>,
}

impl Method {
    pub fn new(signature: MethodRef, access: AccessFlags, body: Option<Body>) -> Self {
        Self {
            signature,
            access,
            body,
        }
    }

    #[inline]
    pub fn signature(&self) -> &MethodRef {
        &self.signature
    }

    #[inline]
    pub fn class(&self) -> &str {
        &self.signature.class
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    #[inline]
    pub fn parameters(&self) -> &[String] {
        &self.signature.parameters
    }

    #[inline]
    pub fn return_type(&self) -> &str {
        &self.signature.return_type
    }

    #[inline]
    pub fn access_flags(&self) -> AccessFlags {
        self.access
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// The body's instructions, or an empty slice for abstract and native
    /// methods.
    pub fn instructions(&self) -> &[Instruction] {
        self.body.as_ref().map_or(&[], Body::instructions)
    }

    pub fn is_constructor(&self) -> bool {
        self.access.contains(AccessFlags::CONSTRUCTOR)
    }

    pub fn is_static(&self) -> bool {
        self.access.contains(AccessFlags::STATIC)
    }

    /// Install a new body. Methods declared without one (abstract, native)
    /// cannot receive code.
    pub fn replace_body(&mut self, body: Body) -> Result<()> {
        if self.body.is_none() {
            return Err(Error::NoBody(self.signature.to_string()));
        }
        log::debug!(
            "{}: body replaced ({} -> {} instructions)",
            self.signature,
            self.instructions().len(),
            body.len()
        );
        self.body = Some(body);
        Ok(())
    }
}
