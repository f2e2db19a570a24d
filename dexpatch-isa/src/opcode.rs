//! Opcode table and instruction formats.
//!
//! Format names follow the Dalvik executable format ("35c" = three units,
//! five registers, constant-pool reference).

use std::fmt;
use std::str::FromStr;

bitflags::bitflags! {
    /// Static properties of an opcode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpcodeFlags: u16 {
        /// Transfers control to a label (`goto`, `if-*`).
        const JUMP = 1 << 0;
        /// Jump that may fall through.
        const CONDITIONAL = 1 << 1;
        /// Returns from the method.
        const RETURN = 1 << 2;
        /// The `throw` instruction itself.
        const THROW = 1 << 3;
        /// May raise an exception at runtime.
        const CAN_THROW = 1 << 4;
        /// Calls another method.
        const INVOKE = 1 << 5;
        /// Loads a constant into a register.
        const CONST = 1 << 6;
        /// Reads the result of the preceding invoke.
        const RESULT = 1 << 7;
    }
}

/// Operand slot names, as used by the format documentation.
///
/// For the variadic formats (`35c`, `3rc`) slots `C` through `G` are the
/// argument registers in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::A,
        Role::B,
        Role::C,
        Role::D,
        Role::E,
        Role::F,
        Role::G,
    ];

    pub fn from_letter(c: char) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.letter() == c.to_ascii_uppercase())
    }

    pub const fn letter(self) -> char {
        match self {
            Role::A => 'A',
            Role::B => 'B',
            Role::C => 'C',
            Role::D => 'D',
            Role::E => 'E',
            Role::F => 'F',
            Role::G => 'G',
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "register{}", self.letter())
    }
}

/// Kind of constant-pool item an opcode refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    None,
    String,
    Type,
    Field,
    Method,
}

/// The single non-register operand a format carries, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    None,
    Literal,
    Reference,
    Target,
}

/// Instruction format: register slots, their widths and the extra operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    F10x,
    F10t,
    F20t,
    F30t,
    F11n,
    F11x,
    F12x,
    F21c,
    F21h,
    F21s,
    F21t,
    F22c,
    F22t,
    F22x,
    F23x,
    F31c,
    F31i,
    F32x,
    F35c,
    F3rc,
    F51l,
}

impl Format {
    pub const fn name(self) -> &'static str {
        match self {
            Format::F10x => "10x",
            Format::F10t => "10t",
            Format::F20t => "20t",
            Format::F30t => "30t",
            Format::F11n => "11n",
            Format::F11x => "11x",
            Format::F12x => "12x",
            Format::F21c => "21c",
            Format::F21h => "21h",
            Format::F21s => "21s",
            Format::F21t => "21t",
            Format::F22c => "22c",
            Format::F22t => "22t",
            Format::F22x => "22x",
            Format::F23x => "23x",
            Format::F31c => "31c",
            Format::F31i => "31i",
            Format::F32x => "32x",
            Format::F35c => "35c",
            Format::F3rc => "3rc",
            Format::F51l => "51l",
        }
    }

    /// Register slots in operand order.
    pub const fn roles(self) -> &'static [Role] {
        match self {
            Format::F10x | Format::F10t | Format::F20t | Format::F30t => &[],
            Format::F11n
            | Format::F11x
            | Format::F21c
            | Format::F21h
            | Format::F21s
            | Format::F21t
            | Format::F31c
            | Format::F31i
            | Format::F51l => &[Role::A],
            Format::F12x | Format::F22c | Format::F22t | Format::F22x | Format::F32x => {
                &[Role::A, Role::B]
            }
            Format::F23x => &[Role::A, Role::B, Role::C],
            Format::F35c | Format::F3rc => &[Role::C, Role::D, Role::E, Role::F, Role::G],
        }
    }

    /// Bit width of the register slot at `slot`.
    pub const fn register_bits(self, slot: usize) -> u8 {
        match self {
            Format::F11n | Format::F12x | Format::F22c | Format::F22t | Format::F35c => 4,
            Format::F22x if slot == 1 => 16,
            Format::F32x | Format::F3rc => 16,
            _ => 8,
        }
    }

    /// `35c` takes up to five registers, `3rc` any consecutive range.
    pub const fn is_variadic(self) -> bool {
        matches!(self, Format::F35c | Format::F3rc)
    }

    pub const fn is_range(self) -> bool {
        matches!(self, Format::F3rc)
    }

    pub const fn max_registers(self) -> usize {
        match self {
            Format::F35c => 5,
            Format::F3rc => 255,
            _ => self.roles().len(),
        }
    }

    pub const fn operand_kind(self) -> OperandKind {
        match self {
            Format::F10t | Format::F20t | Format::F30t | Format::F21t | Format::F22t => {
                OperandKind::Target
            }
            Format::F11n | Format::F21h | Format::F21s | Format::F31i | Format::F51l => {
                OperandKind::Literal
            }
            Format::F21c | Format::F22c | Format::F31c | Format::F35c | Format::F3rc => {
                OperandKind::Reference
            }
            _ => OperandKind::None,
        }
    }

    /// Whether `value` is encodable as this format's literal.
    pub fn literal_fits(self, value: i64) -> bool {
        match self {
            Format::F11n => (-8..=7).contains(&value),
            Format::F21s => i16::try_from(value).is_ok(),
            Format::F21h => i32::try_from(value).is_ok() && value & 0xffff == 0,
            Format::F31i => i32::try_from(value).is_ok(),
            Format::F51l => true,
            _ => false,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! opcodes {
    ($( $variant:ident => $mnemonic:literal, $format:ident, $reference:ident, $flags:expr; )*) => {
        /// A register-bytecode opcode.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Opcode {
            $($variant,)*
        }

        impl Opcode {
            /// Every opcode, in table order.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant,)*];

            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $mnemonic,)*
                }
            }

            pub const fn format(self) -> Format {
                match self {
                    $(Opcode::$variant => Format::$format,)*
                }
            }

            pub const fn ref_kind(self) -> RefKind {
                match self {
                    $(Opcode::$variant => RefKind::$reference,)*
                }
            }

            pub const fn flags(self) -> OpcodeFlags {
                match self {
                    $(Opcode::$variant => $flags,)*
                }
            }
        }
    };
}

const NONE: OpcodeFlags = OpcodeFlags::empty();
const CAN_THROW: OpcodeFlags = OpcodeFlags::CAN_THROW;
const CONST: OpcodeFlags = OpcodeFlags::CONST;
const CONST_THROW: OpcodeFlags = OpcodeFlags::CONST.union(OpcodeFlags::CAN_THROW);
const RESULT: OpcodeFlags = OpcodeFlags::RESULT;
const RETURN: OpcodeFlags = OpcodeFlags::RETURN;
const GOTO: OpcodeFlags = OpcodeFlags::JUMP;
const IF: OpcodeFlags = OpcodeFlags::JUMP.union(OpcodeFlags::CONDITIONAL);
const THROW: OpcodeFlags = OpcodeFlags::THROW.union(OpcodeFlags::CAN_THROW);
const INVOKE: OpcodeFlags = OpcodeFlags::INVOKE.union(OpcodeFlags::CAN_THROW);

opcodes! {
    Nop => "nop", F10x, None, NONE;
    Move => "move", F12x, None, NONE;
    MoveFrom16 => "move/from16", F22x, None, NONE;
    Move16 => "move/16", F32x, None, NONE;
    MoveWide => "move-wide", F12x, None, NONE;
    MoveWideFrom16 => "move-wide/from16", F22x, None, NONE;
    MoveObject => "move-object", F12x, None, NONE;
    MoveObjectFrom16 => "move-object/from16", F22x, None, NONE;
    MoveObject16 => "move-object/16", F32x, None, NONE;
    MoveResult => "move-result", F11x, None, RESULT;
    MoveResultWide => "move-result-wide", F11x, None, RESULT;
    MoveResultObject => "move-result-object", F11x, None, RESULT;
    MoveException => "move-exception", F11x, None, NONE;
    ReturnVoid => "return-void", F10x, None, RETURN;
    Return => "return", F11x, None, RETURN;
    ReturnWide => "return-wide", F11x, None, RETURN;
    ReturnObject => "return-object", F11x, None, RETURN;
    Const4 => "const/4", F11n, None, CONST;
    Const16 => "const/16", F21s, None, CONST;
    Const => "const", F31i, None, CONST;
    ConstHigh16 => "const/high16", F21h, None, CONST;
    ConstWide16 => "const-wide/16", F21s, None, CONST;
    ConstWide32 => "const-wide/32", F31i, None, CONST;
    ConstWide => "const-wide", F51l, None, CONST;
    ConstString => "const-string", F21c, String, CONST_THROW;
    ConstStringJumbo => "const-string/jumbo", F31c, String, CONST_THROW;
    ConstClass => "const-class", F21c, Type, CONST_THROW;
    MonitorEnter => "monitor-enter", F11x, None, CAN_THROW;
    MonitorExit => "monitor-exit", F11x, None, CAN_THROW;
    CheckCast => "check-cast", F21c, Type, CAN_THROW;
    InstanceOf => "instance-of", F22c, Type, CAN_THROW;
    ArrayLength => "array-length", F12x, None, CAN_THROW;
    NewInstance => "new-instance", F21c, Type, CAN_THROW;
    NewArray => "new-array", F22c, Type, CAN_THROW;
    FilledNewArray => "filled-new-array", F35c, Type, CAN_THROW;
    Throw => "throw", F11x, None, THROW;
    Goto => "goto", F10t, None, GOTO;
    Goto16 => "goto/16", F20t, None, GOTO;
    Goto32 => "goto/32", F30t, None, GOTO;
    IfEq => "if-eq", F22t, None, IF;
    IfNe => "if-ne", F22t, None, IF;
    IfLt => "if-lt", F22t, None, IF;
    IfGe => "if-ge", F22t, None, IF;
    IfGt => "if-gt", F22t, None, IF;
    IfLe => "if-le", F22t, None, IF;
    IfEqz => "if-eqz", F21t, None, IF;
    IfNez => "if-nez", F21t, None, IF;
    IfLtz => "if-ltz", F21t, None, IF;
    IfGez => "if-gez", F21t, None, IF;
    IfGtz => "if-gtz", F21t, None, IF;
    IfLez => "if-lez", F21t, None, IF;
    Aget => "aget", F23x, None, CAN_THROW;
    AgetObject => "aget-object", F23x, None, CAN_THROW;
    Aput => "aput", F23x, None, CAN_THROW;
    AputObject => "aput-object", F23x, None, CAN_THROW;
    Iget => "iget", F22c, Field, CAN_THROW;
    IgetWide => "iget-wide", F22c, Field, CAN_THROW;
    IgetObject => "iget-object", F22c, Field, CAN_THROW;
    IgetBoolean => "iget-boolean", F22c, Field, CAN_THROW;
    Iput => "iput", F22c, Field, CAN_THROW;
    IputWide => "iput-wide", F22c, Field, CAN_THROW;
    IputObject => "iput-object", F22c, Field, CAN_THROW;
    IputBoolean => "iput-boolean", F22c, Field, CAN_THROW;
    Sget => "sget", F21c, Field, CAN_THROW;
    SgetWide => "sget-wide", F21c, Field, CAN_THROW;
    SgetObject => "sget-object", F21c, Field, CAN_THROW;
    SgetBoolean => "sget-boolean", F21c, Field, CAN_THROW;
    Sput => "sput", F21c, Field, CAN_THROW;
    SputWide => "sput-wide", F21c, Field, CAN_THROW;
    SputObject => "sput-object", F21c, Field, CAN_THROW;
    SputBoolean => "sput-boolean", F21c, Field, CAN_THROW;
    InvokeVirtual => "invoke-virtual", F35c, Method, INVOKE;
    InvokeSuper => "invoke-super", F35c, Method, INVOKE;
    InvokeDirect => "invoke-direct", F35c, Method, INVOKE;
    InvokeStatic => "invoke-static", F35c, Method, INVOKE;
    InvokeInterface => "invoke-interface", F35c, Method, INVOKE;
    InvokeVirtualRange => "invoke-virtual/range", F3rc, Method, INVOKE;
    InvokeSuperRange => "invoke-super/range", F3rc, Method, INVOKE;
    InvokeDirectRange => "invoke-direct/range", F3rc, Method, INVOKE;
    InvokeStaticRange => "invoke-static/range", F3rc, Method, INVOKE;
    InvokeInterfaceRange => "invoke-interface/range", F3rc, Method, INVOKE;
    NegInt => "neg-int", F12x, None, NONE;
    NotInt => "not-int", F12x, None, NONE;
    IntToLong => "int-to-long", F12x, None, NONE;
    AddInt => "add-int", F23x, None, NONE;
    SubInt => "sub-int", F23x, None, NONE;
    MulInt => "mul-int", F23x, None, NONE;
    DivInt => "div-int", F23x, None, CAN_THROW;
    AddInt2addr => "add-int/2addr", F12x, None, NONE;
}

impl Opcode {
    /// Look up an opcode by its mnemonic (`"invoke-static"`).
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic() == mnemonic)
    }

    #[inline]
    pub const fn is_jump(self) -> bool {
        self.flags().contains(OpcodeFlags::JUMP)
    }

    /// Ends a basic block: unconditional jump, return or throw.
    pub const fn is_terminator(self) -> bool {
        let flags = self.flags();
        (flags.contains(OpcodeFlags::JUMP) && !flags.contains(OpcodeFlags::CONDITIONAL))
            || flags.contains(OpcodeFlags::RETURN)
            || flags.contains(OpcodeFlags::THROW)
    }

    #[inline]
    pub const fn is_invoke(self) -> bool {
        self.flags().contains(OpcodeFlags::INVOKE)
    }

    #[inline]
    pub const fn is_const(self) -> bool {
        self.flags().contains(OpcodeFlags::CONST)
    }

    #[inline]
    pub const fn is_move_result(self) -> bool {
        self.flags().contains(OpcodeFlags::RESULT)
    }

    #[inline]
    pub const fn can_throw(self) -> bool {
        self.flags().contains(OpcodeFlags::CAN_THROW)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Error for [`Opcode::from_str`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown opcode `{0}`")]
pub struct UnknownOpcode(pub String);

impl FromStr for Opcode {
    type Err = UnknownOpcode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_mnemonic(s).ok_or_else(|| UnknownOpcode(s.to_string()))
    }
}
