use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

/// Closed set of opcodes the translator knows about.
///
/// Mnemonics outside this set parse into [`Opcode::Unsupported`], which every
/// dispatcher rejects explicitly instead of falling back to a default rule.
/// Conditional jumps accept their pseudo-instruction aliases (`JZ` for `JE`,
/// `JNBE` for `JA`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(from = "String", into = "String")]
pub enum Opcode {
    Add,
    And,
    Call,
    Cmp,
    Imul,
    Inc,
    Mov,
    Pop,
    Push,
    Xor,

    #[strum(to_string = "JA", serialize = "JNBE")]
    Ja,
    #[strum(to_string = "JAE", serialize = "JNB", serialize = "JNC")]
    Jae,
    #[strum(to_string = "JB", serialize = "JC", serialize = "JNAE")]
    Jb,
    #[strum(to_string = "JBE", serialize = "JNA")]
    Jbe,
    Jcxz,
    #[strum(to_string = "JE", serialize = "JZ")]
    Je,
    Jecxz,
    #[strum(to_string = "JG", serialize = "JNLE")]
    Jg,
    #[strum(to_string = "JGE", serialize = "JNL")]
    Jge,
    #[strum(to_string = "JL", serialize = "JNGE")]
    Jl,
    #[strum(to_string = "JLE", serialize = "JNG")]
    Jle,
    #[strum(to_string = "JNE", serialize = "JNZ")]
    Jne,
    Jno,
    #[strum(to_string = "JNP", serialize = "JPO")]
    Jnp,
    Jns,
    Jo,
    #[strum(to_string = "JP", serialize = "JPE")]
    Jp,
    Jrcxz,
    Js,

    Jmp,
    Ret,

    /// Any mnemonic without a translation rule, kept verbatim for diagnostics.
    #[strum(default)]
    Unsupported(String),
}

impl Opcode {
    /// Whether this opcode is one of the conditional jumps (`Jcc`).
    #[must_use]
    pub fn is_conditional_branch(&self) -> bool {
        matches!(
            self,
            Self::Ja
                | Self::Jae
                | Self::Jb
                | Self::Jbe
                | Self::Jcxz
                | Self::Je
                | Self::Jecxz
                | Self::Jg
                | Self::Jge
                | Self::Jl
                | Self::Jle
                | Self::Jne
                | Self::Jno
                | Self::Jnp
                | Self::Jns
                | Self::Jo
                | Self::Jp
                | Self::Jrcxz
                | Self::Js
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(mnemonic) => f.write_str(mnemonic),
            other => f.write_str(other.into()),
        }
    }
}

impl From<String> for Opcode {
    fn from(mnemonic: String) -> Self {
        mnemonic
            .parse()
            .unwrap_or_else(|_| Self::Unsupported(mnemonic))
    }
}

impl From<Opcode> for String {
    fn from(op: Opcode) -> Self {
        op.to_string()
    }
}
