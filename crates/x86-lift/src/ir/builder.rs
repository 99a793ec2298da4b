use super::{
    BasicBlock, BinaryOp, BlockLabel, CallConv, Inst, InstKind, IntPredicate, LocalId, LocalInfo,
    Terminator, Type, Value, ValueKind,
};
use crate::{Error, Result};

/// Appends type-checked instructions to the block under construction.
///
/// One builder is used per function: it owns the function's local value
/// table, and each call to [`Builder::finish_block`] seals the pending
/// instructions into a [`BasicBlock`].
#[derive(Debug, Default)]
pub struct Builder {
    locals: Vec<LocalInfo>,
    insts: Vec<Inst>,
}

fn mismatch(context: &'static str, expected: &Type, found: &Type) -> Error {
    Error::TypeMismatch {
        context,
        expected: expected.clone(),
        found: found.clone(),
    }
}

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn new_local(&mut self, ty: &Type, name: Option<String>) -> LocalId {
        let id = LocalId(u32::try_from(self.locals.len()).unwrap_or(u32::MAX));
        self.locals.push(LocalInfo {
            ty: ty.clone(),
            name,
        });
        id
    }

    fn push(&mut self, ty: Type, kind: InstKind) -> Value {
        let id = self.new_local(&ty, None);
        self.insts.push(Inst {
            result: Some(id),
            kind,
        });
        Value {
            ty,
            kind: ValueKind::Local(id),
        }
    }

    /// Create a named `alloca` without appending it to the current block.
    ///
    /// Returns the instruction (to be placed later, e.g. in an entry block)
    /// and the pointer value it defines.
    pub fn create_alloca(&mut self, ty: Type, name: &str) -> (Inst, Value) {
        let ptr_ty = ty.clone().pointer_to();
        let id = self.new_local(&ptr_ty, Some(name.to_string()));
        let inst = Inst {
            result: Some(id),
            kind: InstKind::Alloca(ty),
        };
        let ptr = Value {
            ty: ptr_ty,
            kind: ValueKind::Local(id),
        };
        (inst, ptr)
    }

    /// Append a previously created instruction to the current block.
    pub fn append(&mut self, inst: Inst) {
        self.insts.push(inst);
    }

    pub fn build_load(&mut self, ptr: &Value) -> Result<Value> {
        let elem = match ptr.ty.pointee() {
            Some(Type::Void | Type::Func(_)) | None => {
                return Err(mismatch("load", &Type::I8.pointer_to(), &ptr.ty));
            }
            Some(elem) => elem.clone(),
        };
        Ok(self.push(elem, InstKind::Load { ptr: ptr.clone() }))
    }

    pub fn build_store(&mut self, value: Value, ptr: &Value) -> Result<()> {
        match ptr.ty.pointee() {
            Some(elem) if *elem == value.ty => {}
            Some(elem) => return Err(mismatch("store", elem, &value.ty)),
            None => return Err(mismatch("store", &value.ty.clone().pointer_to(), &ptr.ty)),
        }
        self.insts.push(Inst {
            result: None,
            kind: InstKind::Store {
                value,
                ptr: ptr.clone(),
            },
        });
        Ok(())
    }

    pub fn build_binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
        if !matches!(lhs.ty, Type::Int(_)) {
            return Err(mismatch("binary operation", &Type::I32, &lhs.ty));
        }
        if lhs.ty != rhs.ty {
            return Err(mismatch("binary operation", &lhs.ty, &rhs.ty));
        }
        let ty = lhs.ty.clone();
        Ok(self.push(ty, InstKind::Binary { op, lhs, rhs }))
    }

    pub fn build_icmp(&mut self, pred: IntPredicate, lhs: Value, rhs: Value) -> Result<Value> {
        if !matches!(lhs.ty, Type::Int(_)) {
            return Err(mismatch("icmp", &Type::I32, &lhs.ty));
        }
        if lhs.ty != rhs.ty {
            return Err(mismatch("icmp", &lhs.ty, &rhs.ty));
        }
        Ok(self.push(Type::I1, InstKind::ICmp { pred, lhs, rhs }))
    }

    /// Address of the element of `base` selected by `indices`.
    ///
    /// The first index steps over the base pointer and must be zero; the
    /// remaining ones select array elements and struct fields.
    pub fn build_gep(&mut self, base: &Value, indices: Vec<u64>) -> Result<Value> {
        let Some(mut elem) = base.ty.pointee() else {
            return Err(mismatch("getelementptr", &Type::I8.pointer_to(), &base.ty));
        };
        if indices.first() != Some(&0) {
            return Err(Error::Internal(format!(
                "getelementptr on {} must start with index 0",
                base.ty
            )));
        }
        for &index in &indices[1..] {
            elem = match elem {
                Type::Array { len, elem } if index < *len => elem.as_ref(),
                Type::Struct(fields) if index < fields.len() as u64 => &fields[index as usize],
                Type::Array { .. } | Type::Struct(_) => {
                    return Err(Error::Internal(format!(
                        "index {index} out of range for {elem}"
                    )));
                }
                Type::Pointer(_) => return Err(Error::IndexThroughPointer(elem.clone())),
                other => return Err(Error::UnsupportedIndexing(other.clone())),
            };
        }
        let result_ty = elem.clone().pointer_to();
        Ok(self.push(
            result_ty,
            InstKind::GetElementPtr {
                base: base.clone(),
                indices,
            },
        ))
    }

    /// Call `callee`; returns the result value unless the callee is void.
    pub fn build_call(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        conv: CallConv,
    ) -> Result<Option<Value>> {
        let Some(sig) = callee.ty.func_signature() else {
            return Err(mismatch("call", &Type::Void, &callee.ty));
        };
        if sig.params.len() != args.len() {
            return Err(Error::Internal(format!(
                "call expects {} arguments, got {}",
                sig.params.len(),
                args.len()
            )));
        }
        for (param, arg) in sig.params.iter().zip(&args) {
            if *param != arg.ty {
                return Err(mismatch("call argument", param, &arg.ty));
            }
        }
        let kind = InstKind::Call {
            callee: callee.clone(),
            args,
            conv,
        };
        if sig.ret.is_void() {
            self.insts.push(Inst { result: None, kind });
            Ok(None)
        } else {
            let ret = sig.ret.clone();
            Ok(Some(self.push(ret, kind)))
        }
    }

    #[must_use]
    pub fn build_br(&self, target: BlockLabel) -> Terminator {
        Terminator::Br(target)
    }

    pub fn build_cond_br(
        &self,
        cond: Value,
        then_label: BlockLabel,
        else_label: BlockLabel,
    ) -> Result<Terminator> {
        if cond.ty != Type::I1 {
            return Err(mismatch("conditional branch", &Type::I1, &cond.ty));
        }
        Ok(Terminator::CondBr {
            cond,
            then_label,
            else_label,
        })
    }

    /// Return `value` from a function whose return type is `ret`.
    pub fn build_ret(&self, value: Option<Value>, ret: &Type) -> Result<Terminator> {
        match &value {
            None if ret.is_void() => {}
            None => return Err(mismatch("return", ret, &Type::Void)),
            Some(v) if v.ty == *ret => {}
            Some(v) => return Err(mismatch("return", ret, &v.ty)),
        }
        Ok(Terminator::Ret(value))
    }

    /// Seal the pending instructions into a block with the given terminator.
    pub fn finish_block(&mut self, label: BlockLabel, term: Terminator) -> BasicBlock {
        BasicBlock {
            label,
            insts: std::mem::take(&mut self.insts),
            term,
        }
    }

    /// Consume the builder, returning the local value table.
    #[must_use]
    pub fn into_locals(self) -> Vec<LocalInfo> {
        self.locals
    }
}
