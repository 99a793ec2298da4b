//! Decoded x86 input model.
//!
//! The instruction decoder itself lives outside this crate. Its output is
//! handed to the translator as [`Instruction`] records (opcode, operands,
//! address, encoded length) already partitioned into basic blocks, typically
//! deserialized from a JSON document.

mod flags;
mod opcode;
mod operand;
mod register;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use flags::StatusFlag;
pub use opcode::Opcode;
pub use operand::{Instruction, Mem, Operand, Terminator};
pub use register::Register;

use crate::Error;

/// Absolute virtual address within the executable image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "AddressRepr", into = "String")]
pub struct Address(pub u64);

impl Address {
    /// The address `delta` bytes away from this one (wrapping at 64 bits).
    #[must_use]
    pub fn offset(self, delta: i64) -> Self {
        Self(self.0.wrapping_add_signed(delta))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16)
        } else {
            s.parse()
        };
        parsed
            .map(Address)
            .map_err(|_| Error::AddressSyntax(s.to_string()))
    }
}

impl From<u64> for Address {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}

/// Addresses are accepted both as JSON numbers and as `"0x…"` strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum AddressRepr {
    Num(u64),
    Str(String),
}

impl TryFrom<AddressRepr> for Address {
    type Error = Error;

    fn try_from(repr: AddressRepr) -> Result<Self, Self::Error> {
        match repr {
            AddressRepr::Num(n) => Ok(Address(n)),
            AddressRepr::Str(s) => s.parse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse_and_display() {
        assert_eq!("0x401000".parse::<Address>().unwrap(), Address(0x40_1000));
        assert_eq!("4198400".parse::<Address>().unwrap(), Address(0x40_1000));
        assert_eq!(Address(0x40_1000).to_string(), "0x00401000");
        assert!("0xZZ".parse::<Address>().is_err());
    }

    #[test]
    fn test_address_offset_is_signed() {
        assert_eq!(Address(0x1000).offset(-0x10), Address(0xFF0));
        assert_eq!(Address(0x1000).offset(5), Address(0x1005));
    }

    #[test]
    fn test_address_json_forms() {
        let a: Address = serde_json::from_str("\"0x10\"").unwrap();
        let b: Address = serde_json::from_str("16").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"0x00000010\"");
    }
}
