//! The method pool: the set of classes a patch run sees.

use std::fmt;

use dexpatch_isa::MethodRef;

use crate::class::ClassDef;
use crate::error::{Error, Result};
use crate::method::{Body, Method};

/// Stable handle to a method: class index and method index within the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId {
    pub class: u32,
    pub method: u32,
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.class, self.method)
    }
}

/// Which part of the pool a resolution looks at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// Every class.
    #[default]
    Package,
    /// One class, by descriptor.
    Class(String),
    /// Several classes, by descriptor.
    Classes(Vec<String>),
}

impl Scope {
    pub fn includes(&self, class: &str) -> bool {
        match self {
            Scope::Package => true,
            Scope::Class(c) => c == class,
            Scope::Classes(cs) => cs.iter().any(|c| c == class),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Package => f.write_str("package"),
            Scope::Class(c) => f.write_str(c),
            Scope::Classes(cs) => write!(f, "[{}]", cs.join(", ")),
        }
    }
}

/// Ordered classes. Iteration order is insertion order and never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pool {
    classes: Vec<ClassDef>,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, class: ClassDef) -> Result<u32> {
        if self.find_class(class.descriptor()).is_some() {
            return Err(Error::DuplicateClass(class.descriptor().to_string()));
        }
        self.classes.push(class);
        Ok((self.classes.len() - 1) as u32)
    }

    pub fn classes(&self) -> &[ClassDef] {
        &self.classes
    }

    pub fn find_class(&self, descriptor: &str) -> Option<u32> {
        self.classes
            .iter()
            .position(|c| c.descriptor() == descriptor)
            .map(|i| i as u32)
    }

    pub fn find_method(&self, signature: &MethodRef) -> Option<MethodId> {
        let class = self.find_class(&signature.class)?;
        let method = self.classes[class as usize].find_method(signature)?;
        Some(MethodId {
            class,
            method: method as u32,
        })
    }

    /// Total number of methods.
    pub fn method_count(&self) -> usize {
        self.classes.iter().map(|c| c.methods().len()).sum()
    }

    /// Methods within `scope`, in pool order.
    pub fn candidates<'a>(
        &'a self,
        scope: &Scope,
    ) -> impl Iterator<Item = (MethodId, &'a ClassDef, &'a Method)> {
        self.classes
            .iter()
            .enumerate()
            .filter(move |(_, c)| scope.includes(c.descriptor()))
            .flat_map(|(ci, c)| {
                c.methods().iter().enumerate().map(move |(mi, m)| {
                    let id = MethodId {
                        class: ci as u32,
                        method: mi as u32,
                    };
                    (id, c, m)
                })
            })
    }

    pub fn get(&self, id: MethodId) -> Option<(&ClassDef, &Method)> {
        let class = self.classes.get(id.class as usize)?;
        let method = class.methods().get(id.method as usize)?;
        Some((class, method))
    }

    pub fn method(&self, id: MethodId) -> Option<&Method> {
        self.get(id).map(|(_, m)| m)
    }

    pub fn class_of(&self, id: MethodId) -> Option<&ClassDef> {
        self.get(id).map(|(c, _)| c)
    }

    /// Install a new body for `id`.
    pub fn replace_body(&mut self, id: MethodId, body: Body) -> Result<()> {
        self.classes
            .get_mut(id.class as usize)
            .and_then(|c| c.methods.get_mut(id.method as usize))
            .ok_or(Error::UnknownMethod(id))?
            .replace_body(body)
    }
}
