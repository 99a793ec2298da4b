//! Per-function storage cells standing in for machine registers and status
//! flags.

use std::collections::BTreeMap;

use crate::ir::{Builder, Inst, Type, Value};
use crate::x86::{Register, StatusFlag};
use crate::{Error, Result};

/// A cell's `alloca` (placed in the entry block once translation is done)
/// and the pointer it defines.
#[derive(Debug)]
struct Cell {
    alloca: Inst,
    ptr: Value,
}

/// Register and flag cells of one function, created on first use.
///
/// Keyed by ordered maps so that draining the cells yields them in canonical
/// register order followed by canonical flag order.
#[derive(Debug, Default)]
pub(crate) struct Cells {
    regs: BTreeMap<Register, Cell>,
    flags: BTreeMap<StatusFlag, Cell>,
}

impl Cells {
    /// Pointer to the cell of `reg`, creating the cell on first use.
    pub fn register(&mut self, builder: &mut Builder, reg: Register) -> Result<Value> {
        if let Some(cell) = self.regs.get(&reg) {
            return Ok(cell.ptr.clone());
        }
        let bits = reg.bits().ok_or(Error::UnsupportedRegister(reg))?;
        let (alloca, ptr) = builder.create_alloca(Type::Int(bits), &reg.cell_name());
        tracing::trace!(%reg, "register cell created");
        self.regs.insert(
            reg,
            Cell {
                alloca,
                ptr: ptr.clone(),
            },
        );
        Ok(ptr)
    }

    /// Pointer to the `i1` cell of `flag`, creating the cell on first use.
    pub fn flag(&mut self, builder: &mut Builder, flag: StatusFlag) -> Value {
        self.flags
            .entry(flag)
            .or_insert_with(|| {
                let (alloca, ptr) = builder.create_alloca(Type::I1, &flag.cell_name());
                Cell { alloca, ptr }
            })
            .ptr
            .clone()
    }

    /// Pointer to the cell of `reg` if the function uses that register.
    pub fn existing_register(&self, reg: Register) -> Option<&Value> {
        self.regs.get(&reg).map(|cell| &cell.ptr)
    }

    pub fn is_empty(&self) -> bool {
        self.regs.is_empty() && self.flags.is_empty()
    }

    /// The `alloca`s of all cells: registers in enumeration order, then flags.
    pub fn into_allocas(self) -> Vec<Inst> {
        self.regs
            .into_values()
            .chain(self.flags.into_values())
            .map(|cell| cell.alloca)
            .collect()
    }
}
