// Lowering of the typed IR into an LLVM module via inkwell.
//
// The IR already carries explicit element types for every load, store and
// getelementptr, so lowering maps one IR instruction to one LLVM instruction
// and works with LLVM's opaque pointers.

// Constants are stored as sign-normalized i64 and handed to LLVM as u64 bit
// patterns masked to the constant's width.
#![allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]

use std::collections::HashMap;

use inkwell::AddressSpace;
use inkwell::basic_block::BasicBlock;
use inkwell::builder::{Builder, BuilderError};
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType};
use inkwell::values::{BasicMetadataValueEnum, BasicValue, BasicValueEnum, FunctionValue};

use crate::ir::{
    self, BinaryOp, BlockLabel, CallConv, FuncType, InstKind, IntPredicate, LocalId, Terminator,
    Type, Value, ValueKind,
};
use crate::{Error, Result};

/// LLVM calling convention numbers (`llvm::CallingConv::ID`).
const LLVM_CC_C: u32 = 0;
const LLVM_CC_X86_STDCALL: u32 = 64;
const LLVM_CC_X86_FASTCALL: u32 = 65;

fn llvm_err<T>(result: std::result::Result<T, BuilderError>) -> Result<T> {
    result.map_err(|e| Error::Internal(format!("LLVM builder error: {e:?}")))
}

fn llvm_call_conv(conv: CallConv) -> u32 {
    match conv {
        CallConv::C => LLVM_CC_C,
        CallConv::Fastcall => LLVM_CC_X86_FASTCALL,
        CallConv::Stdcall => LLVM_CC_X86_STDCALL,
    }
}

/// Lower `module` into a new LLVM module and run LLVM's verifier on it.
pub fn lower_module<'ctx>(
    context: &'ctx Context,
    module: &ir::Module,
    name: &str,
) -> Result<Module<'ctx>> {
    let mut lowering = Lowering::new(context, name);
    lowering.declare(module)?;
    for func in module.functions.values() {
        if !func.is_declaration() {
            lowering.lower_function(func)?;
        }
    }
    lowering
        .module
        .verify()
        .map_err(|e| Error::Internal(format!("LLVM verify failed: {e}")))?;
    Ok(lowering.module)
}

/// Lower `module` and print it in LLVM's own textual format.
pub fn emit_llvm_ir(module: &ir::Module, name: &str) -> Result<String> {
    let context = Context::create();
    let llvm_module = lower_module(&context, module, name)?;
    Ok(llvm_module.print_to_string().to_string())
}

struct Lowering<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    functions: HashMap<String, FunctionValue<'ctx>>,
}

/// Per-function lowering state.
struct FunctionState<'ctx> {
    function: FunctionValue<'ctx>,
    blocks: HashMap<BlockLabel, BasicBlock<'ctx>>,
    locals: HashMap<LocalId, BasicValueEnum<'ctx>>,
}

impl<'ctx> Lowering<'ctx> {
    fn new(context: &'ctx Context, name: &str) -> Self {
        Self {
            context,
            module: context.create_module(name),
            builder: context.create_builder(),
            functions: HashMap::new(),
        }
    }

    // ── Types ──

    fn basic_type(&self, ty: &Type) -> Result<BasicTypeEnum<'ctx>> {
        Ok(match ty {
            Type::Int(bits) => self.context.custom_width_int_type(*bits).into(),
            Type::Pointer(_) => self.context.ptr_type(AddressSpace::default()).into(),
            Type::Array { len, elem } => {
                let len = u32::try_from(*len)
                    .map_err(|_| Error::Unsupported(format!("array length of {ty}")))?;
                self.basic_type(elem)?.array_type(len).into()
            }
            Type::Struct(fields) => {
                let fields = fields
                    .iter()
                    .map(|field| self.basic_type(field))
                    .collect::<Result<Vec<_>>>()?;
                self.context.struct_type(&fields, true).into()
            }
            Type::Void | Type::Func(_) => {
                return Err(Error::Internal(format!("{ty} is not a first-class type")));
            }
        })
    }

    fn fn_type(&self, sig: &FuncType) -> Result<FunctionType<'ctx>> {
        let params = sig
            .params
            .iter()
            .map(|param| self.basic_type(param).map(BasicMetadataTypeEnum::from))
            .collect::<Result<Vec<_>>>()?;
        Ok(if sig.ret.is_void() {
            self.context.void_type().fn_type(&params, false)
        } else {
            self.basic_type(&sig.ret)?.fn_type(&params, false)
        })
    }

    // ── Declarations ──

    fn declare(&mut self, module: &ir::Module) -> Result<()> {
        for global in module.globals.values() {
            let ty = self.basic_type(&global.content)?;
            self.module.add_global(ty, None, &global.name);
        }
        for func in module.functions.values() {
            let fn_type = self.fn_type(&func.sig)?;
            let function = self.module.add_function(&func.name, fn_type, None);
            function.set_call_conventions(llvm_call_conv(func.call_conv));
            self.functions.insert(func.name.clone(), function);
        }
        Ok(())
    }

    // ── Function bodies ──

    fn lower_function(&self, func: &ir::Function) -> Result<()> {
        tracing::debug!(name = %func.name, "lowering function to LLVM");
        let function = self.function(&func.name)?;
        let mut state = FunctionState {
            function,
            blocks: HashMap::new(),
            locals: HashMap::new(),
        };
        for block in &func.blocks {
            let bb = self
                .context
                .append_basic_block(function, &block.label.to_string());
            state.blocks.insert(block.label, bb);
        }
        for block in &func.blocks {
            self.builder
                .position_at_end(self.block(&state, block.label)?);
            for inst in &block.insts {
                let name = inst
                    .result
                    .and_then(|id| func.local(id))
                    .and_then(|local| local.name.as_deref())
                    .unwrap_or("");
                let result = self.lower_inst(&state, &inst.kind, name)?;
                if let (Some(id), Some(value)) = (inst.result, result) {
                    state.locals.insert(id, value);
                }
            }
            self.lower_term(&state, &block.term)?;
        }
        Ok(())
    }

    fn lower_inst(
        &self,
        state: &FunctionState<'ctx>,
        kind: &InstKind,
        name: &str,
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        let b = &self.builder;
        let value = match kind {
            InstKind::Alloca(ty) => llvm_err(b.build_alloca(self.basic_type(ty)?, name))?.into(),
            InstKind::Load { ptr } => {
                let elem = self.pointee_type(ptr)?;
                let ptr = self.value(state, ptr)?.into_pointer_value();
                llvm_err(b.build_load(elem, ptr, name))?
            }
            InstKind::Store { value, ptr } => {
                let value = self.value(state, value)?;
                let ptr = self.value(state, ptr)?.into_pointer_value();
                llvm_err(b.build_store(ptr, value))?;
                return Ok(None);
            }
            InstKind::Binary { op, lhs, rhs } => {
                let lhs = self.value(state, lhs)?.into_int_value();
                let rhs = self.value(state, rhs)?.into_int_value();
                llvm_err(match op {
                    BinaryOp::Add => b.build_int_add(lhs, rhs, name),
                    BinaryOp::Mul => b.build_int_mul(lhs, rhs, name),
                    BinaryOp::And => b.build_and(lhs, rhs, name),
                    BinaryOp::Or => b.build_or(lhs, rhs, name),
                    BinaryOp::Xor => b.build_xor(lhs, rhs, name),
                })?
                .into()
            }
            InstKind::ICmp { pred, lhs, rhs } => {
                let lhs = self.value(state, lhs)?.into_int_value();
                let rhs = self.value(state, rhs)?.into_int_value();
                llvm_err(b.build_int_compare(int_predicate(*pred), lhs, rhs, name))?.into()
            }
            InstKind::GetElementPtr { base, indices } => {
                let elem = self.pointee_type(base)?;
                let base = self.value(state, base)?.into_pointer_value();
                let i64_type = self.context.i64_type();
                let indices: Vec<_> = indices
                    .iter()
                    .map(|&index| i64_type.const_int(index, false))
                    .collect();
                // SAFETY: the IR builder only creates paths that stay within
                // `elem`, with a leading zero index over the base pointer.
                #[allow(unsafe_code)]
                let ptr = unsafe { b.build_gep(elem, base, &indices, name) };
                llvm_err(ptr)?.into()
            }
            InstKind::Call { callee, args, conv } => {
                let function = match &callee.kind {
                    ValueKind::Function { name, .. } => self.function(name)?,
                    _ => return Err(Error::Internal(format!("indirect call through {}", callee.ty))),
                };
                let args = args
                    .iter()
                    .map(|arg| self.value(state, arg).map(BasicMetadataValueEnum::from))
                    .collect::<Result<Vec<_>>>()?;
                let call = llvm_err(b.build_call(function, &args, name))?;
                call.set_call_convention(llvm_call_conv(*conv));
                match call.try_as_basic_value().basic() {
                    Some(value) => value,
                    None => return Ok(None),
                }
            }
        };
        Ok(Some(value))
    }

    fn lower_term(&self, state: &FunctionState<'ctx>, term: &Terminator) -> Result<()> {
        let b = &self.builder;
        match term {
            Terminator::Br(target) => {
                llvm_err(b.build_unconditional_branch(self.block(state, *target)?))?;
            }
            Terminator::CondBr {
                cond,
                then_label,
                else_label,
            } => {
                let cond = self.value(state, cond)?.into_int_value();
                llvm_err(b.build_conditional_branch(
                    cond,
                    self.block(state, *then_label)?,
                    self.block(state, *else_label)?,
                ))?;
            }
            Terminator::Ret(Some(value)) => {
                let value = self.value(state, value)?;
                llvm_err(b.build_return(Some(&value as &dyn BasicValue<'ctx>)))?;
            }
            Terminator::Ret(None) => {
                llvm_err(b.build_return(None))?;
            }
        }
        Ok(())
    }

    // ── Values ──

    fn value(&self, state: &FunctionState<'ctx>, value: &Value) -> Result<BasicValueEnum<'ctx>> {
        match &value.kind {
            ValueKind::Const(v) => {
                let Type::Int(bits) = value.ty else {
                    return Err(Error::Internal(format!("constant of type {}", value.ty)));
                };
                let bits_value = if bits >= 64 {
                    *v as u64
                } else {
                    (*v as u64) & ((1u64 << bits) - 1)
                };
                Ok(self
                    .context
                    .custom_width_int_type(bits)
                    .const_int(bits_value, false)
                    .into())
            }
            ValueKind::Local(id) => state
                .locals
                .get(id)
                .copied()
                .ok_or_else(|| Error::Internal(format!("use of undefined local {}", id.0))),
            ValueKind::Param(index) => state
                .function
                .get_nth_param(*index)
                .ok_or_else(|| Error::Internal(format!("missing parameter {index}"))),
            ValueKind::Global(name) => self
                .module
                .get_global(name)
                .map(|global| global.as_pointer_value().into())
                .ok_or_else(|| Error::Internal(format!("undeclared global {name}"))),
            ValueKind::Function { name, .. } => Ok(self
                .function(name)?
                .as_global_value()
                .as_pointer_value()
                .into()),
        }
    }

    fn pointee_type(&self, ptr: &Value) -> Result<BasicTypeEnum<'ctx>> {
        let elem = ptr
            .ty
            .pointee()
            .ok_or_else(|| Error::Internal(format!("{} is not a pointer", ptr.ty)))?;
        self.basic_type(elem)
    }

    fn function(&self, name: &str) -> Result<FunctionValue<'ctx>> {
        self.functions
            .get(name)
            .copied()
            .ok_or_else(|| Error::Internal(format!("undeclared function {name}")))
    }

    fn block(&self, state: &FunctionState<'ctx>, label: BlockLabel) -> Result<BasicBlock<'ctx>> {
        state
            .blocks
            .get(&label)
            .copied()
            .ok_or_else(|| Error::Internal(format!("undefined block {label}")))
    }
}

fn int_predicate(pred: IntPredicate) -> inkwell::IntPredicate {
    match pred {
        IntPredicate::Eq => inkwell::IntPredicate::EQ,
        IntPredicate::Ne => inkwell::IntPredicate::NE,
        IntPredicate::Slt => inkwell::IntPredicate::SLT,
    }
}
