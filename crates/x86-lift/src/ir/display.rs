use std::collections::HashMap;
use std::fmt;

use super::{
    BasicBlock, BinaryOp, BlockLabel, Function, Global, Inst, InstKind, IntPredicate, LocalId,
    Module, Terminator, Type, Value, ValueKind,
};

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Int(bits) => write!(f, "i{bits}"),
            Type::Pointer(elem) => write!(f, "{elem}*"),
            Type::Array { len, elem } => write!(f, "[{len} x {elem}]"),
            Type::Struct(fields) => {
                write!(f, "<{{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}")?;
                }
                write!(f, " }}>")
            }
            Type::Func(sig) => {
                write!(f, "{} (", sig.ret)?;
                for (i, param) in sig.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for BlockLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockLabel::Entry => write!(f, "entry"),
            BlockLabel::Addr(addr) => write!(f, "block_{:06X}", addr.0),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "add",
            BinaryOp::Mul => "mul",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
        })
    }
}

impl fmt::Display for IntPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntPredicate::Eq => "eq",
            IntPredicate::Ne => "ne",
            IntPredicate::Slt => "slt",
        })
    }
}

/// Printed names of a function's parameters and locals.
///
/// Named locals print as `%name`; parameters and unnamed locals are numbered
/// in order of appearance, parameters first.
struct Namer {
    locals: HashMap<LocalId, String>,
}

impl Namer {
    fn new(func: &Function) -> Self {
        let mut next = func.sig.params.len();
        let mut locals = HashMap::new();
        for block in &func.blocks {
            for inst in &block.insts {
                let Some(id) = inst.result else { continue };
                let name = match func.local(id).and_then(|l| l.name.as_ref()) {
                    Some(name) => name.clone(),
                    None => {
                        next += 1;
                        (next - 1).to_string()
                    }
                };
                locals.insert(id, name);
            }
        }
        Self { locals }
    }

    fn operand(&self, value: &Value) -> String {
        match &value.kind {
            ValueKind::Const(v) if value.ty == Type::I1 => {
                if *v == 0 { "false" } else { "true" }.to_string()
            }
            ValueKind::Const(v) => v.to_string(),
            ValueKind::Local(id) => match self.locals.get(id) {
                Some(name) => format!("%{name}"),
                None => format!("%<unplaced {}>", id.0),
            },
            ValueKind::Param(i) => format!("%{i}"),
            ValueKind::Global(name) | ValueKind::Function { name, .. } => format!("@{name}"),
        }
    }

    fn typed(&self, value: &Value) -> String {
        format!("{} {}", value.ty, self.operand(value))
    }

    fn write_inst(&self, f: &mut fmt::Formatter<'_>, inst: &Inst) -> fmt::Result {
        write!(f, "  ")?;
        if let Some(id) = inst.result {
            let result = Value {
                ty: Type::Void,
                kind: ValueKind::Local(id),
            };
            write!(f, "{} = ", self.operand(&result))?;
        }
        match &inst.kind {
            InstKind::Alloca(ty) => write!(f, "alloca {ty}"),
            InstKind::Load { ptr } => {
                let elem = ptr.ty.pointee().unwrap_or(&Type::Void);
                write!(f, "load {elem}, {}", self.typed(ptr))
            }
            InstKind::Store { value, ptr } => {
                write!(f, "store {}, {}", self.typed(value), self.typed(ptr))
            }
            InstKind::Binary { op, lhs, rhs } => {
                write!(f, "{op} {}, {}", self.typed(lhs), self.operand(rhs))
            }
            InstKind::ICmp { pred, lhs, rhs } => {
                write!(f, "icmp {pred} {}, {}", self.typed(lhs), self.operand(rhs))
            }
            InstKind::GetElementPtr { base, indices } => {
                let elem = base.ty.pointee().unwrap_or(&Type::Void);
                write!(f, "getelementptr {elem}, {}", self.typed(base))?;
                for index in indices {
                    write!(f, ", i64 {index}")?;
                }
                Ok(())
            }
            InstKind::Call { callee, args, conv } => {
                let ret = callee
                    .ty
                    .func_signature()
                    .map_or(Type::Void, |sig| sig.ret.clone());
                write!(f, "call ")?;
                if !conv.keyword().is_empty() {
                    write!(f, "{} ", conv.keyword())?;
                }
                write!(f, "{ret} {}(", self.operand(callee))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", self.typed(arg))?;
                }
                write!(f, ")")
            }
        }
    }

    fn write_term(&self, f: &mut fmt::Formatter<'_>, term: &Terminator) -> fmt::Result {
        match term {
            Terminator::Br(target) => write!(f, "  br label %{target}"),
            Terminator::CondBr {
                cond,
                then_label,
                else_label,
            } => write!(
                f,
                "  br {}, label %{then_label}, label %{else_label}",
                self.typed(cond)
            ),
            Terminator::Ret(Some(value)) => write!(f, "  ret {}", self.typed(value)),
            Terminator::Ret(None) => write!(f, "  ret void"),
        }
    }

    fn write_block(&self, f: &mut fmt::Formatter<'_>, block: &BasicBlock) -> fmt::Result {
        writeln!(f, "{}:", block.label)?;
        for inst in &block.insts {
            self.write_inst(f, inst)?;
            writeln!(f)?;
        }
        self.write_term(f, &block.term)?;
        writeln!(f)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = if self.is_declaration() {
            "declare"
        } else {
            "define"
        };
        write!(f, "; {} at {}\n{keyword} ", self.name, self.addr)?;
        if !self.call_conv.keyword().is_empty() {
            write!(f, "{} ", self.call_conv.keyword())?;
        }
        write!(f, "{} @{}(", self.sig.ret, self.name)?;
        for (i, param) in self.sig.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if self.is_declaration() {
                write!(f, "{param}")?;
            } else {
                write!(f, "{param} %{i}")?;
            }
        }
        write!(f, ")")?;
        if self.is_declaration() {
            return writeln!(f);
        }
        writeln!(f, " {{")?;
        let namer = Namer::new(self);
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            namer.write_block(f, block)?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for Global {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{} = external global {} ; {}",
            self.name, self.content, self.addr
        )
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for global in self.globals.values() {
            writeln!(f, "{global}")?;
        }
        for (i, func) in self.functions.values().enumerate() {
            if i > 0 || !self.globals.is_empty() {
                writeln!(f)?;
            }
            write!(f, "{func}")?;
        }
        Ok(())
    }
}
