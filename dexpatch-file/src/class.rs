use dexpatch_isa::MethodRef;

use crate::access::AccessFlags;
use crate::error::{Error, Result};
use crate::method::Method;

/// A class definition and the methods it declares, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    descriptor: String,
    access: AccessFlags,
    superclass: Option<String>,
    pub(crate) methods: Vec<Method>,
}

impl ClassDef {
    pub fn new(
        descriptor: impl Into<String>,
        access: AccessFlags,
        superclass: Option<String>,
    ) -> Self {
        Self {
            descriptor: descriptor.into(),
            access,
            superclass,
            methods: Vec::new(),
        }
    }

    /// The class type descriptor, `Lpkg/Name;`.
    #[inline]
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    #[inline]
    pub fn access_flags(&self) -> AccessFlags {
        self.access
    }

    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Append a method. Its signature must name this class and must not
    /// already be declared.
    pub fn add_method(&mut self, method: Method) -> Result<()> {
        if method.class() != self.descriptor {
            return Err(Error::BadDescriptor(method.class().to_string()));
        }
        if self.find_method(method.signature()).is_some() {
            return Err(Error::DuplicateMethod(method.signature().to_string()));
        }
        self.methods.push(method);
        Ok(())
    }

    pub fn find_method(&self, signature: &MethodRef) -> Option<usize> {
        self.methods.iter().position(|m| m.signature() == signature)
    }
}
