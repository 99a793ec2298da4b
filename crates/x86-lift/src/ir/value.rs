use super::Type;
use crate::x86::Address;

/// Index of an instruction result within its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Integer constant, normalized to the width of its type.
    Const(i64),
    Local(LocalId),
    Param(u32),
    Global(String),
    Function { name: String, addr: Address },
}

/// A typed IR value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Value {
    pub ty: Type,
    pub kind: ValueKind,
}

impl Value {
    /// Integer constant of the given width. The value is truncated to `bits`
    /// and sign-extended back, so `const_int(8, 0xFF)` is `i8 -1`.
    #[must_use]
    pub fn const_int(bits: u32, value: i64) -> Self {
        let value = if bits >= 64 {
            value
        } else {
            let shift = 64 - bits;
            (value << shift) >> shift
        };
        Self {
            ty: Type::Int(bits),
            kind: ValueKind::Const(value),
        }
    }

    #[must_use]
    pub fn bool(value: bool) -> Self {
        Self::const_int(1, i64::from(value))
    }

    /// Address of the function this value refers to, if it is a function.
    #[must_use]
    pub fn as_function(&self) -> Option<Address> {
        match self.kind {
            ValueKind::Function { addr, .. } => Some(addr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_const_normalization() {
        assert_eq!(Value::const_int(8, 0xFF).kind, ValueKind::Const(-1));
        assert_eq!(Value::const_int(32, 5).kind, ValueKind::Const(5));
        assert_eq!(Value::const_int(32, 0xFFFF_FFFF).kind, ValueKind::Const(-1));
        assert_eq!(Value::const_int(64, i64::MIN).kind, ValueKind::Const(i64::MIN));
        assert_eq!(Value::bool(true).kind, ValueKind::Const(-1));
        assert_eq!(Value::bool(true).ty, Type::I1);
    }
}
