use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// x86 register identifiers.
///
/// Declaration order is the canonical enumeration order used when the entry
/// block declares register cells, so `Ord` on this type is load-bearing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Register {
    // 8-bit
    Al,
    Cl,
    Dl,
    Bl,
    Ah,
    Ch,
    Dh,
    Bh,
    Spb,
    Bpb,
    Sib,
    Dib,
    R8b,
    R9b,
    R10b,
    R11b,
    R12b,
    R13b,
    R14b,
    R15b,

    // 16-bit
    Ax,
    Cx,
    Dx,
    Bx,
    Sp,
    Bp,
    Si,
    Di,
    R8w,
    R9w,
    R10w,
    R11w,
    R12w,
    R13w,
    R14w,
    R15w,

    // 32-bit
    Eax,
    Ecx,
    Edx,
    Ebx,
    Esp,
    Ebp,
    Esi,
    Edi,
    R8l,
    R9l,
    R10l,
    R11l,
    R12l,
    R13l,
    R14l,
    R15l,

    // 64-bit
    Rax,
    Rcx,
    Rdx,
    Rbx,
    Rsp,
    Rbp,
    Rsi,
    Rdi,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,

    // Instruction pointer
    Ip,
    Eip,
    Rip,

    // 387 floating point
    F0,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,

    // MMX
    M0,
    M1,
    M2,
    M3,
    M4,
    M5,
    M6,
    M7,

    // XMM
    X0,
    X1,
    X2,
    X3,
    X4,
    X5,
    X6,
    X7,
    X8,
    X9,
    X10,
    X11,
    X12,
    X13,
    X14,
    X15,

    // Segment
    Es,
    Cs,
    Ss,
    Ds,
    Fs,
    Gs,
}

impl Register {
    /// Bit width of the register's integer storage, or `None` for register
    /// classes (FPU, MMX, XMM, segment) that have no cell representation.
    #[must_use]
    pub fn bits(self) -> Option<u32> {
        use Register::*;
        match self {
            Al | Cl | Dl | Bl | Ah | Ch | Dh | Bh | Spb | Bpb | Sib | Dib | R8b | R9b | R10b
            | R11b | R12b | R13b | R14b | R15b => Some(8),
            Ax | Cx | Dx | Bx | Sp | Bp | Si | Di | R8w | R9w | R10w | R11w | R12w | R13w
            | R14w | R15w | Ip => Some(16),
            Eax | Ecx | Edx | Ebx | Esp | Ebp | Esi | Edi | R8l | R9l | R10l | R11l | R12l
            | R13l | R14l | R15l | Eip => Some(32),
            Rax | Rcx | Rdx | Rbx | Rsp | Rbp | Rsi | Rdi | R8 | R9 | R10 | R11 | R12 | R13
            | R14 | R15 | Rip => Some(64),
            F0 | F1 | F2 | F3 | F4 | F5 | F6 | F7 | M0 | M1 | M2 | M3 | M4 | M5 | M6 | M7
            | X0 | X1 | X2 | X3 | X4 | X5 | X6 | X7 | X8 | X9 | X10 | X11 | X12 | X13 | X14
            | X15 | Es | Cs | Ss | Ds | Fs | Gs => None,
        }
    }

    /// Lower-case name used for the register's cell in emitted IR.
    #[must_use]
    pub fn cell_name(self) -> String {
        <&'static str>::from(self).to_ascii_lowercase()
    }
}

impl TryFrom<String> for Register {
    type Error = strum::ParseError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}
