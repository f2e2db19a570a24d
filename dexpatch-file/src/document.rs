//! YAML pool documents.
//!
//! ```yaml
//! classes:
//!   - class: Lapp/SearchFragment;
//!     super: Landroid/app/Fragment;
//!     access: PUBLIC
//!     methods:
//!       - name: <init>
//!         parameters: [Landroid/content/Context;]
//!         returns: V
//!         access: PUBLIC | CONSTRUCTOR
//!         registers: 3
//!         code: |
//!           invoke-direct {v1}, Landroid/app/Fragment;-><init>()V
//!           const v0, 0x7f0e01d8
//!           return-void
//! ```
//!
//! Method code uses the text syntax of [`dexpatch_isa::syntax`]. A method
//! without `code` has no body. When `registers` is omitted it is the
//! smallest frame that holds every register the code names.

use std::path::Path;

use dexpatch_isa::insn::{is_type_descriptor, split_type_list};
use dexpatch_isa::{MethodRef, assemble, disassemble};
use serde::{Deserialize, Serialize};

use crate::access::AccessFlags;
use crate::class::ClassDef;
use crate::error::{Error, Result};
use crate::method::{Body, Method};
use crate::pool::Pool;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolDoc {
    #[serde(default)]
    pub classes: Vec<ClassDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDoc {
    pub class: String,
    #[serde(rename = "super", default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default)]
    pub access: AccessFlags,
    #[serde(default)]
    pub methods: Vec<MethodDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodDoc {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default = "void")]
    pub returns: String,
    #[serde(default)]
    pub access: AccessFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registers: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

fn void() -> String {
    "V".to_string()
}

impl PoolDoc {
    pub fn from_pool(pool: &Pool) -> Self {
        let classes = pool
            .classes()
            .iter()
            .map(|c| ClassDoc {
                class: c.descriptor().to_string(),
                superclass: c.superclass().map(str::to_string),
                access: c.access_flags(),
                methods: c.methods().iter().map(MethodDoc::from_method).collect(),
            })
            .collect();
        Self { classes }
    }

    pub fn into_pool(self) -> Result<Pool> {
        let mut pool = Pool::new();
        for doc in self.classes {
            check_descriptor(&doc.class)?;
            if let Some(sup) = &doc.superclass {
                check_descriptor(sup)?;
            }
            let mut class = ClassDef::new(doc.class, doc.access, doc.superclass);
            for m in doc.methods {
                let method = m.into_method(class.descriptor())?;
                class.add_method(method)?;
            }
            pool.add_class(class)?;
        }
        log::debug!(
            "loaded pool: {} classes, {} methods",
            pool.classes().len(),
            pool.method_count()
        );
        Ok(pool)
    }
}

impl MethodDoc {
    fn from_method(m: &Method) -> Self {
        Self {
            name: m.name().to_string(),
            parameters: m.parameters().to_vec(),
            returns: m.return_type().to_string(),
            access: m.access_flags(),
            registers: m.body().map(Body::register_count),
            code: m.body().map(|b| disassemble(b.instructions())),
        }
    }

    fn into_method(self, class: &str) -> Result<Method> {
        for p in &self.parameters {
            // A single parameter entry may not smuggle in several types.
            if split_type_list(p).is_none_or(|ts| ts.len() != 1) {
                return Err(Error::BadDescriptor(p.clone()));
            }
        }
        if !is_type_descriptor(&self.returns) {
            return Err(Error::BadDescriptor(self.returns));
        }
        let signature = MethodRef::new(class, self.name, self.parameters, self.returns);

        let body = match self.code {
            None => None,
            Some(_) if self.access.is_bodiless() => {
                return Err(Error::UnexpectedBody(signature.to_string()));
            }
            Some(code) => {
                let insns = assemble(&code).map_err(|source| Error::Code {
                    method: signature.to_string(),
                    source,
                })?;
                let registers = match self.registers {
                    Some(n) => n,
                    None => {
                        let needed = insns
                            .iter()
                            .flat_map(|i| i.registers())
                            .map(|r| u32::from(r.0) + 1)
                            .max()
                            .unwrap_or(0);
                        u16::try_from(needed)
                            .map_err(|_| Error::TooManyRegisters(signature.to_string()))?
                    }
                };
                Some(Body::new(registers, insns)?)
            }
        };
        Ok(Method::new(signature, self.access, body))
    }
}

fn check_descriptor(desc: &str) -> Result<()> {
    if desc.starts_with('L') && is_type_descriptor(desc) {
        Ok(())
    } else {
        Err(Error::BadDescriptor(desc.to_string()))
    }
}

/// Parse a YAML pool document.
pub fn from_str(text: &str) -> Result<Pool> {
    serde_yaml::from_str::<PoolDoc>(text)?.into_pool()
}

/// Render a pool as a YAML document accepted by [`from_str`].
pub fn to_string(pool: &Pool) -> Result<String> {
    Ok(serde_yaml::to_string(&PoolDoc::from_pool(pool))?)
}

pub fn load(path: &Path) -> Result<Pool> {
    from_str(&std::fs::read_to_string(path)?)
}

pub fn save(pool: &Pool, path: &Path) -> Result<()> {
    std::fs::write(path, to_string(pool)?)?;
    Ok(())
}
