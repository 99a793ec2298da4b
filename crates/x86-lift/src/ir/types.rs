use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::abi::POINTER_SIZE;
use crate::{Error, Result};

/// IR type.
///
/// Structs are packed: their size is the sum of their field sizes, which is
/// how globals recovered from data sections are laid out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Type {
    Void,
    Int(u32),
    Pointer(Box<Type>),
    Array { len: u64, elem: Box<Type> },
    Struct(Vec<Type>),
    Func(Box<FuncType>),
}

/// Function signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncType {
    pub ret: Type,
    pub params: Vec<Type>,
}

impl FuncType {
    #[must_use]
    pub fn new(ret: Type, params: Vec<Type>) -> Self {
        Self { ret, params }
    }
}

/// Calling convention of a function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallConv {
    #[default]
    #[serde(alias = "cdecl")]
    C,
    /// First two integer arguments in ECX and EDX.
    Fastcall,
    Stdcall,
}

impl CallConv {
    /// Keyword used in textual IR, empty for the default convention.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::C => "",
            Self::Fastcall => "x86_fastcallcc",
            Self::Stdcall => "x86_stdcallcc",
        }
    }
}

impl Type {
    pub const I1: Type = Type::Int(1);
    pub const I8: Type = Type::Int(8);
    pub const I16: Type = Type::Int(16);
    pub const I32: Type = Type::Int(32);
    pub const I64: Type = Type::Int(64);

    #[must_use]
    pub fn pointer_to(self) -> Type {
        Type::Pointer(Box::new(self))
    }

    #[must_use]
    pub fn array_of(self, len: u64) -> Type {
        Type::Array {
            len,
            elem: Box::new(self),
        }
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    /// Element type of a pointer type.
    #[must_use]
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer(elem) => Some(elem),
            _ => None,
        }
    }

    /// Signature of a function pointer type.
    #[must_use]
    pub fn func_signature(&self) -> Option<&FuncType> {
        match self.pointee() {
            Some(Type::Func(sig)) => Some(sig),
            _ => None,
        }
    }

    /// Size in bytes of a value of this type.
    pub fn size(&self) -> Result<u64> {
        match self {
            Type::Int(bits) => Ok(u64::from(bits.div_ceil(8))),
            Type::Pointer(_) => Ok(POINTER_SIZE),
            Type::Array { len, elem } => len
                .checked_mul(elem.size()?)
                .ok_or_else(|| Error::SizeOverflow(self.clone())),
            Type::Struct(fields) => fields.iter().try_fold(0u64, |total, field| {
                total
                    .checked_add(field.size()?)
                    .ok_or_else(|| Error::SizeOverflow(self.clone()))
            }),
            Type::Void | Type::Func(_) => Err(Error::Unsized(self.clone())),
        }
    }
}

impl FromStr for Type {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = TypeParser { src: s, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error());
        }
        Ok(ty)
    }
}

impl TryFrom<String> for Type {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Type> for String {
    fn from(ty: Type) -> Self {
        ty.to_string()
    }
}

/// Parser for the LLVM-style type syntax: `void`, `i32`, `i8*`, `[4 x i32]`,
/// `{ i32, i8 }` and `<{ i32, i8 }>`.
struct TypeParser<'a> {
    src: &'a str,
    pos: usize,
}

impl TypeParser<'_> {
    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn error(&self) -> Error {
        Error::TypeSyntax(self.src.to_string())
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn number(&mut self) -> Result<u64> {
        self.skip_ws();
        let digits = self
            .rest()
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        let value = self.rest()[..digits].parse().map_err(|_| self.error())?;
        self.pos += digits;
        Ok(value)
    }

    fn parse_type(&mut self) -> Result<Type> {
        let mut ty = if self.eat("void") {
            Type::Void
        } else if self.eat("i") {
            let bits = u32::try_from(self.number()?).map_err(|_| self.error())?;
            if bits == 0 {
                return Err(self.error());
            }
            Type::Int(bits)
        } else if self.eat("[") {
            let len = self.number()?;
            self.expect("x")?;
            let elem = self.parse_type()?;
            self.expect("]")?;
            elem.array_of(len)
        } else if self.eat("<{") {
            let fields = self.parse_fields("}>")?;
            Type::Struct(fields)
        } else if self.eat("{") {
            let fields = self.parse_fields("}")?;
            Type::Struct(fields)
        } else {
            return Err(self.error());
        };
        while self.eat("*") {
            ty = ty.pointer_to();
        }
        Ok(ty)
    }

    fn parse_fields(&mut self, close: &str) -> Result<Vec<Type>> {
        let mut fields = Vec::new();
        if self.eat(close) {
            return Ok(fields);
        }
        loop {
            fields.push(self.parse_type()?);
            if self.eat(close) {
                return Ok(fields);
            }
            self.expect(",")?;
        }
    }
}
