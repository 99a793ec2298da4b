//! Global memory model: maps an absolute address to a global variable and,
//! for addresses inside a global, to the element path that reaches it.

use std::collections::BTreeMap;

use crate::ir::{Global, Type};
use crate::x86::Address;
use crate::{Error, Result};

/// A resolved global location: the containing global and the
/// `getelementptr` indices of the addressed element. The path is empty for
/// a direct access to the global's start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalLocation<'a> {
    pub global: &'a Global,
    pub path: Vec<u64>,
}

/// Locate the global containing `addr`.
///
/// An exact match on a global's start wins; otherwise the global with the
/// greatest start below `addr` is used if `addr` falls within its storage.
pub fn locate(globals: &BTreeMap<Address, Global>, addr: Address) -> Result<GlobalLocation<'_>> {
    let Some((&start, global)) = globals.range(..=addr).next_back() else {
        return Err(Error::GlobalNotFound(addr));
    };
    if start == addr {
        return Ok(GlobalLocation {
            global,
            path: Vec::new(),
        });
    }
    let offset = addr.0 - start.0;
    if offset >= global.content.size()? {
        return Err(Error::GlobalNotFound(addr));
    }
    let (path, _) = element_path(&global.content, offset)?;
    Ok(GlobalLocation { global, path })
}

/// Walk `content` to the element at byte `offset`.
///
/// Returns the `getelementptr` indices (starting with the zero index that
/// steps over the base pointer) and the type of the addressed element. The
/// walk stops as soon as an element starts exactly at `offset`, so an offset
/// of zero yields an empty path and `content` itself. Offsets that land
/// inside a scalar are unsupported.
pub fn element_path(content: &Type, offset: u64) -> Result<(Vec<u64>, &Type)> {
    let mut path = Vec::new();
    let mut ty = content;
    if offset == 0 {
        return Ok((path, ty));
    }
    let size = content.size()?;
    if offset >= size {
        return Err(Error::OffsetOutOfRange {
            offset,
            ty: content.clone(),
        });
    }
    path.push(0);
    let mut total = 0;
    while total < offset {
        ty = match ty {
            Type::Pointer(_) => return Err(Error::IndexThroughPointer(ty.clone())),
            Type::Array { len, elem } => {
                let elem_size = elem.size()?;
                if elem_size == 0 {
                    return Err(Error::UnsupportedIndexing(ty.clone()));
                }
                let index = ((offset - total) / elem_size).min(len.saturating_sub(1));
                total += index * elem_size;
                path.push(index);
                elem
            }
            Type::Struct(fields) => {
                let mut index = 0;
                let mut field = None;
                for candidate in fields {
                    let field_size = candidate.size()?;
                    if total + field_size > offset {
                        field = Some(candidate);
                        break;
                    }
                    total += field_size;
                    index += 1;
                }
                let Some(field) = field else {
                    return Err(Error::OffsetOutOfRange {
                        offset,
                        ty: content.clone(),
                    });
                };
                path.push(index);
                field
            }
            other => return Err(Error::UnsupportedIndexing(other.clone())),
        };
    }
    Ok((path, ty))
}
