use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Address, Opcode, Register};
use crate::{Error, Result};

/// Instruction operand as produced by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Reg(Register),
    Mem(Mem),
    Imm(i64),
    /// Displacement relative to the address of the following instruction.
    Rel(i64),
}

/// Memory operand `Segment:[Base+Scale*Index+Disp]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mem {
    #[serde(default)]
    pub segment: Option<Register>,
    #[serde(default)]
    pub base: Option<Register>,
    #[serde(default)]
    pub index: Option<Register>,
    #[serde(default)]
    pub scale: u8,
    #[serde(default)]
    pub disp: i64,
}

impl Mem {
    /// A bare `[disp]` operand with no segment, base, index or scale.
    #[must_use]
    pub fn absolute(disp: i64) -> Self {
        Self {
            disp,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.segment.is_none() && self.base.is_none() && self.index.is_none() && self.scale == 0
    }
}

impl fmt::Display for Mem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(segment) = self.segment {
            write!(f, "{segment}:")?;
        }
        f.write_str("[")?;
        let mut sep = "";
        if let Some(base) = self.base {
            write!(f, "{base}")?;
            sep = "+";
        }
        if let Some(index) = self.index {
            write!(f, "{sep}{index}*{}", self.scale)?;
            sep = "+";
        }
        if self.disp < 0 {
            write!(f, "-0x{:X}", self.disp.unsigned_abs())?;
        } else if self.disp > 0 || sep.is_empty() {
            write!(f, "{sep}0x{:X}", self.disp)?;
        }
        f.write_str("]")
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reg(reg) => write!(f, "{reg}"),
            Self::Mem(mem) => write!(f, "{mem}"),
            Self::Imm(imm) => write!(f, "0x{imm:X}"),
            Self::Rel(rel) => write!(f, ".{rel:+}"),
        }
    }
}

/// A decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub addr: Address,
    /// Encoded length in bytes.
    pub len: u32,
    pub op: Opcode,
    #[serde(default)]
    pub args: Vec<Operand>,
}

impl Instruction {
    #[must_use]
    pub fn new(addr: impl Into<Address>, len: u32, op: Opcode, args: Vec<Operand>) -> Self {
        Self {
            addr: addr.into(),
            len,
            op,
            args,
        }
    }

    /// Address of the instruction immediately following this one.
    #[must_use]
    pub fn next_addr(&self) -> Address {
        self.addr.offset(i64::from(self.len))
    }

    /// The operands, checked to be exactly `N` of them.
    pub fn operands<const N: usize>(&self) -> Result<&[Operand; N]> {
        self.args.as_slice().try_into().map_err(|_| Error::OperandCount {
            addr: self.addr,
            op: self.op.clone(),
            expected: N,
            found: self.args.len(),
        })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.addr, self.op)?;
        for (i, arg) in self.args.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{arg}")?;
        }
        Ok(())
    }
}

/// Final instruction of a basic block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminator {
    /// Inserted when a block ends without a control transfer; records the
    /// start address of the block execution falls through to.
    Fallthrough(Address),
    Inst(Instruction),
}
