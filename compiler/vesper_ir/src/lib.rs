//! Vesper IR - shared semantic-layer types
//!
//! This crate contains the data structures the pattern-match compiler and its
//! callers exchange:
//! - Spans for source locations
//! - Names for interned identifiers
//! - `TypeTable` for nominal types (primitives, classes, interfaces)
//! - Constant values with hashable float/string representations
//! - Member symbols (properties, deconstructors) resolved by the binder
//! - The pattern arena (`PatternKind` addressed by `PatternId`)
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: Strings → `Name(u32)`, Types → `TypeId(u32)`
//! - **Flatten Everything**: No `Box<Pattern>`, use `PatternId(u32)` indices
//!
//! Types that contain floats store them as u64 bits for Hash compatibility.
//! Types that contain strings use interned `Name` for O(1) equality.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod consts;
mod ids;
mod name;
mod pattern;
mod span;
mod symbols;
mod types;

pub use consts::ConstValue;
pub use ids::{GuardId, LabelId, PatternId};
pub use name::{Name, NameInterner};
pub use pattern::{Clause, PatternArena, PatternKind, RelOp};
pub use span::Span;
pub use symbols::{DeconstructId, DeconstructSym, PropertyId, PropertySym, Symbols};
pub use types::{TypeId, TypeKind, TypeTable};
