//! Instruction translator: non-terminal x86 instructions to IR operations.

use super::function::FunctionTranslator;
use crate::abi::{FASTCALL_ARG_REGS, RETURN_REG, WORD_BITS};
use crate::ir::{BinaryOp, CallConv, Function, IntPredicate, Value};
use crate::x86::{Instruction, Opcode, StatusFlag};
use crate::{Error, Result};

impl FunctionTranslator<'_> {
    pub(super) fn translate_inst(&mut self, inst: &Instruction) -> Result<()> {
        tracing::trace!(%inst, "translating instruction");
        match &inst.op {
            Opcode::Add => self.binary(inst, BinaryOp::Add),
            Opcode::And => self.binary(inst, BinaryOp::And),
            Opcode::Xor => self.binary(inst, BinaryOp::Xor),
            Opcode::Imul => self.imul(inst),
            Opcode::Inc => self.inc(inst),
            Opcode::Mov => self.mov(inst),
            Opcode::Cmp => self.cmp(inst),
            Opcode::Push | Opcode::Pop => {
                // Stack effects are not modelled.
                tracing::debug!(%inst, "ignoring stack instruction");
                Ok(())
            }
            Opcode::Call => self.call(inst),
            op => Err(Error::UnsupportedOpcode(op.clone())),
        }
    }

    /// `dst = dst <op> src`
    fn binary(&mut self, inst: &Instruction, op: BinaryOp) -> Result<()> {
        let [dst, src] = inst.operands::<2>()?;
        let x = self.use_operand(inst, dst)?;
        let y = self.use_operand(inst, src)?;
        let result = self.builder.build_binary(op, x, y)?;
        self.def_operand(inst, 0, result)
    }

    /// Three-operand form only: `dst = src1 * src2`.
    fn imul(&mut self, inst: &Instruction) -> Result<()> {
        if inst.args.len() != 3 {
            return Err(Error::Unsupported(format!(
                "{}-operand IMUL at {}",
                inst.args.len(),
                inst.addr
            )));
        }
        let [_, src1, src2] = inst.operands::<3>()?;
        let x = self.use_operand(inst, src1)?;
        let y = self.use_operand(inst, src2)?;
        let result = self.builder.build_binary(BinaryOp::Mul, x, y)?;
        self.def_operand(inst, 0, result)
    }

    fn inc(&mut self, inst: &Instruction) -> Result<()> {
        let [dst] = inst.operands::<1>()?;
        let x = self.use_operand(inst, dst)?;
        let one = Value::const_int(WORD_BITS, 1);
        let result = self.builder.build_binary(BinaryOp::Add, x, one)?;
        self.def_operand(inst, 0, result)
    }

    fn mov(&mut self, inst: &Instruction) -> Result<()> {
        let [_, src] = inst.operands::<2>()?;
        let value = self.use_operand(inst, src)?;
        self.def_operand(inst, 0, value)
    }

    fn cmp(&mut self, inst: &Instruction) -> Result<()> {
        let [lhs, rhs] = inst.operands::<2>()?;
        let x = self.use_operand(inst, lhs)?;
        let y = self.use_operand(inst, rhs)?;
        self.update_status_flags(x, y)
    }

    /// Set the status flags from comparing `x` against `y`.
    ///
    /// Only ZF (`x == y`) and SF (`x < y`, signed) are computed; CF, PF, AF
    /// and OF are left untouched.
    fn update_status_flags(&mut self, x: Value, y: Value) -> Result<()> {
        let zf = self
            .builder
            .build_icmp(IntPredicate::Eq, x.clone(), y.clone())?;
        self.def_flag(StatusFlag::Zf, zf)?;
        let sf = self.builder.build_icmp(IntPredicate::Slt, x, y)?;
        self.def_flag(StatusFlag::Sf, sf)
    }

    /// Call the function denoted by operand 0. Also used for tail calls.
    pub(super) fn call(&mut self, inst: &Instruction) -> Result<()> {
        let [target] = inst.operands::<1>()?;
        let callee = self.use_operand(inst, target)?;
        let module = self.module;
        let Some(callee_fn) = callee
            .as_function()
            .and_then(|addr| module.functions.get(&addr))
        else {
            return Err(Error::InvalidCallee {
                addr: inst.addr,
                found: callee.ty,
            });
        };
        let args = self.call_args(callee_fn)?;
        if let Some(result) = self
            .builder
            .build_call(&callee, args, callee_fn.call_conv)?
        {
            self.def_register(RETURN_REG, result)?;
        }
        Ok(())
    }

    /// Arguments for a call to `callee`, read from the registers its calling
    /// convention passes them in.
    fn call_args(&mut self, callee: &Function) -> Result<Vec<Value>> {
        let params = callee.sig.params.len();
        match callee.call_conv {
            _ if params == 0 => Ok(Vec::new()),
            CallConv::Fastcall if params <= FASTCALL_ARG_REGS.len() => FASTCALL_ARG_REGS
                [..params]
                .iter()
                .map(|&reg| self.use_register(reg))
                .collect(),
            conv => Err(Error::Unsupported(format!(
                "passing {params} arguments to {} ({conv:?} calling convention)",
                callee.name
            ))),
        }
    }
}
