//! Terminator translator: branches, jumps and returns to IR control flow.

use super::function::FunctionTranslator;
use crate::abi::{COUNT_REGS, RETURN_REG};
use crate::ir::{self, BinaryOp, IntPredicate, Type, Value};
use crate::x86::{self, Instruction, Opcode, Operand, StatusFlag};
use crate::{Error, Result};

impl FunctionTranslator<'_> {
    pub(super) fn translate_term(&mut self, term: &x86::Terminator) -> Result<ir::Terminator> {
        let inst = match term {
            x86::Terminator::Fallthrough(next) => {
                let target = self.block_label(*next)?;
                return Ok(self.builder.build_br(target));
            }
            x86::Terminator::Inst(inst) => inst,
        };
        tracing::trace!(%inst, "translating terminator");
        match &inst.op {
            op if op.is_conditional_branch() => self.cond_branch(inst),
            Opcode::Jmp => self.jmp(inst),
            Opcode::Ret => self.ret(),
            op => Err(Error::UnsupportedTerminator(op.clone())),
        }
    }

    /// `Jcc rel`: taken edge to `next + rel`, fallthrough edge to `next`.
    fn cond_branch(&mut self, inst: &Instruction) -> Result<ir::Terminator> {
        let [target] = inst.operands::<1>()?;
        let Operand::Rel(rel) = target else {
            return Err(Error::UnsupportedOperand(format!(
                "branch target {target} at {}",
                inst.addr
            )));
        };
        let next = inst.next_addr();
        let then_label = self.block_label(next.offset(*rel))?;
        let else_label = self.block_label(next)?;
        let cond = self.condition(&inst.op)?;
        self.builder.build_cond_br(cond, then_label, else_label)
    }

    /// Branch condition of a conditional jump, computed from the flag cells.
    ///
    /// ```text
    /// JE   ZF=1
    /// JNE  ZF=0
    /// JS   SF=1
    /// JNS  SF=0
    /// JL   SF≠OF
    /// JGE  SF=OF
    /// JG   ZF=0 and SF=OF
    /// JLE  ZF=1 or SF≠OF
    /// JCXZ, JECXZ, JRCXZ   CX, ECX, RCX = 0
    /// ```
    fn condition(&mut self, op: &Opcode) -> Result<Value> {
        match op {
            Opcode::Je => self.flag_is(StatusFlag::Zf, true),
            Opcode::Jne => self.flag_is(StatusFlag::Zf, false),
            Opcode::Js => self.flag_is(StatusFlag::Sf, true),
            Opcode::Jns => self.flag_is(StatusFlag::Sf, false),
            Opcode::Jl => {
                let sf = self.use_flag(StatusFlag::Sf)?;
                let of = self.use_flag(StatusFlag::Of)?;
                self.builder.build_icmp(IntPredicate::Ne, sf, of)
            }
            Opcode::Jge => {
                let sf = self.use_flag(StatusFlag::Sf)?;
                let of = self.use_flag(StatusFlag::Of)?;
                self.builder.build_icmp(IntPredicate::Eq, sf, of)
            }
            Opcode::Jg => {
                let sf = self.use_flag(StatusFlag::Sf)?;
                let of = self.use_flag(StatusFlag::Of)?;
                let zf = self.use_flag(StatusFlag::Zf)?;
                let not_zero = self
                    .builder
                    .build_icmp(IntPredicate::Eq, zf, Value::bool(false))?;
                let same_sign = self.builder.build_icmp(IntPredicate::Eq, sf, of)?;
                self.builder.build_binary(BinaryOp::And, not_zero, same_sign)
            }
            Opcode::Jle => {
                let sf = self.use_flag(StatusFlag::Sf)?;
                let of = self.use_flag(StatusFlag::Of)?;
                let zf = self.use_flag(StatusFlag::Zf)?;
                let zero = self
                    .builder
                    .build_icmp(IntPredicate::Eq, zf, Value::bool(true))?;
                let sign_differs = self.builder.build_icmp(IntPredicate::Ne, sf, of)?;
                self.builder.build_binary(BinaryOp::Or, zero, sign_differs)
            }
            Opcode::Jcxz | Opcode::Jecxz | Opcode::Jrcxz => {
                let reg = match op {
                    Opcode::Jcxz => COUNT_REGS[0],
                    Opcode::Jecxz => COUNT_REGS[1],
                    _ => COUNT_REGS[2],
                };
                let count = self.use_register(reg)?;
                let Type::Int(bits) = count.ty else {
                    return Err(Error::UnsupportedRegister(reg));
                };
                self.builder
                    .build_icmp(IntPredicate::Eq, count, Value::const_int(bits, 0))
            }
            op => Err(Error::UnsupportedCondition(op.clone())),
        }
    }

    /// `flag == expected`
    fn flag_is(&mut self, flag: StatusFlag, expected: bool) -> Result<Value> {
        let value = self.use_flag(flag)?;
        self.builder
            .build_icmp(IntPredicate::Eq, value, Value::bool(expected))
    }

    /// `JMP rel`: a tail call when the target is another function's entry,
    /// a branch when it is a block of this function.
    fn jmp(&mut self, inst: &Instruction) -> Result<ir::Terminator> {
        let [target] = inst.operands::<1>()?;
        let Operand::Rel(rel) = target else {
            tracing::trace!(%inst, "indirect jump");
            return Err(Error::UnsupportedTerminator(inst.op.clone()));
        };
        let dest = inst.next_addr().offset(*rel);
        if dest != self.func.addr && self.module.functions.contains_key(&dest) {
            tracing::trace!(%dest, "tail call");
            self.call(inst)?;
            return self.ret();
        }
        if self.blocks.contains_key(&dest) {
            return Ok(self.builder.build_br(ir::BlockLabel::Addr(dest)));
        }
        tracing::trace!(%dest, "jump to unknown target");
        Err(Error::UnsupportedTerminator(inst.op.clone()))
    }

    /// Return the accumulator for non-void functions.
    fn ret(&mut self) -> Result<ir::Terminator> {
        let ret_ty = &self.func.sig.ret;
        if ret_ty.is_void() {
            return self.builder.build_ret(None, ret_ty);
        }
        let value = self.use_register(RETURN_REG)?;
        self.builder.build_ret(Some(value), &self.func.sig.ret)
    }
}
