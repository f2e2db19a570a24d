//! Access flags for classes and methods.
//!
//! Values follow the Dalvik executable format. In YAML documents they are
//! written as `PUBLIC | STATIC | CONSTRUCTOR`.

use std::fmt;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[derive(serde::Serialize, serde::Deserialize)]
    pub struct AccessFlags: u32 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        /// Bridge method (same bit as `VOLATILE` on fields).
        const BRIDGE = 0x0040;
        /// Varargs method (same bit as `TRANSIENT` on fields).
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        /// `<init>` or `<clinit>`.
        const CONSTRUCTOR = 0x1_0000;
        const DECLARED_SYNCHRONIZED = 0x2_0000;
    }
}

impl AccessFlags {
    /// Whether a method with these flags cannot carry code.
    pub fn is_bodiless(self) -> bool {
        self.intersects(AccessFlags::ABSTRACT | AccessFlags::NATIVE)
    }
}

impl fmt::Display for AccessFlags {
    /// Lower-case smali keywords, space separated.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            f.write_str(&name.to_ascii_lowercase().replace('_', "-"))?;
        }
        Ok(())
    }
}
