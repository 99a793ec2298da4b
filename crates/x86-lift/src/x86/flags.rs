use strum::{Display, EnumIter, IntoStaticStr};

/// Status flags of the EFLAGS register.
///
/// ```text
/// CF (bit 0)    Carry Flag
/// PF (bit 2)    Parity Flag
/// AF (bit 4)    Auxiliary Carry Flag
/// ZF (bit 6)    Zero Flag
/// SF (bit 7)    Sign Flag
/// OF (bit 11)   Overflow Flag
/// ```
///
/// Declaration order is the canonical order of flag cells in the entry block.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum StatusFlag {
    Cf,
    Pf,
    Af,
    Zf,
    Sf,
    Of,
}

impl StatusFlag {
    #[must_use]
    pub fn cell_name(self) -> String {
        <&'static str>::from(self).to_ascii_lowercase()
    }
}
