//! Operand resolver: reads and writes the values denoted by instruction
//! operands.

use super::function::FunctionTranslator;
use super::globals;
use crate::abi::WORD_BITS;
use crate::ir::Value;
use crate::x86::{Address, Instruction, Mem, Operand, Register, StatusFlag};
use crate::{Error, Result};

impl FunctionTranslator<'_> {
    /// Value of `operand` as read by `inst`.
    pub(super) fn use_operand(&mut self, inst: &Instruction, operand: &Operand) -> Result<Value> {
        tracing::trace!(%operand, "use operand");
        match operand {
            Operand::Reg(reg) => self.use_register(*reg),
            Operand::Mem(mem) => {
                let ptr = self.memory_ptr(mem)?;
                self.builder.build_load(&ptr)
            }
            Operand::Imm(imm) => Ok(Value::const_int(WORD_BITS, *imm)),
            Operand::Rel(rel) => {
                let addr = inst.next_addr().offset(*rel);
                if let Some(func) = self.module.functions.get(&addr) {
                    return Ok(func.value());
                }
                let ptr = self.global_ptr(addr)?;
                self.builder.build_load(&ptr)
            }
        }
    }

    /// Write `value` to operand `index` of `inst`.
    pub(super) fn def_operand(
        &mut self,
        inst: &Instruction,
        index: usize,
        value: Value,
    ) -> Result<()> {
        let operand = inst.args.get(index).ok_or_else(|| Error::OperandCount {
            addr: inst.addr,
            op: inst.op.clone(),
            expected: index + 1,
            found: inst.args.len(),
        })?;
        tracing::trace!(%operand, "define operand");
        match operand {
            Operand::Reg(reg) => self.def_register(*reg, value),
            Operand::Mem(mem) => {
                let ptr = self.memory_ptr(mem)?;
                self.builder.build_store(value, &ptr)
            }
            Operand::Imm(_) | Operand::Rel(_) => Err(Error::NotWritable {
                addr: inst.addr,
                op: inst.op.clone(),
                index,
            }),
        }
    }

    pub(super) fn use_register(&mut self, reg: Register) -> Result<Value> {
        let cell = self.cells.register(&mut self.builder, reg)?;
        self.builder.build_load(&cell)
    }

    pub(super) fn def_register(&mut self, reg: Register, value: Value) -> Result<()> {
        let cell = self.cells.register(&mut self.builder, reg)?;
        self.builder.build_store(value, &cell)
    }

    pub(super) fn use_flag(&mut self, flag: StatusFlag) -> Result<Value> {
        let cell = self.cells.flag(&mut self.builder, flag);
        self.builder.build_load(&cell)
    }

    pub(super) fn def_flag(&mut self, flag: StatusFlag, value: Value) -> Result<()> {
        let cell = self.cells.flag(&mut self.builder, flag);
        self.builder.build_store(value, &cell)
    }

    /// Pointer to the location of a memory operand. Only bare `[disp]`
    /// operands are supported; they address global variables.
    fn memory_ptr(&mut self, mem: &Mem) -> Result<Value> {
        if !mem.is_absolute() {
            if mem.disp > 0 {
                tracing::warn!(
                    addr = %Address::default().offset(mem.disp),
                    operand = %mem,
                    "unable to locate memory at address"
                );
            }
            return Err(Error::UnsupportedOperand(mem.to_string()));
        }
        self.global_ptr(Address::default().offset(mem.disp))
    }

    /// Pointer to the global variable, or global element, at `addr`.
    fn global_ptr(&mut self, addr: Address) -> Result<Value> {
        let module = self.module;
        let location = globals::locate(&module.globals, addr)?;
        let base = location.global.value();
        if location.path.is_empty() {
            Ok(base)
        } else {
            self.builder.build_gep(&base, location.path)
        }
    }
}
