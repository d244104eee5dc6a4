//! Nominal type table.
//!
//! The match compiler needs very little from the type system: subtype
//! queries for runtime type tests, value-type vs. reference-type
//! classification for null handling, and orderability for relational
//! patterns. The table is append-only and built by the caller before
//! compilation; `add_class`/`add_interface` only accept already-existing
//! ids for bases, so the hierarchy is acyclic by construction.

use std::fmt;

use smallvec::SmallVec;

use crate::{Name, NameInterner};

/// Index into a [`TypeTable`].
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    /// Error sentinel type (index 0). Propagated by the binder for
    /// malformed input; never matches and is never a match's input type.
    pub const ERROR: TypeId = TypeId(0);
    pub const BOOL: TypeId = TypeId(1);
    pub const INT: TypeId = TypeId(2);
    pub const FLOAT: TypeId = TypeId(3);
    pub const CHAR: TypeId = TypeId(4);
    pub const STR: TypeId = TypeId(5);
    /// Top type of the reference hierarchy.
    pub const OBJECT: TypeId = TypeId(6);

    /// Create a new `TypeId` from a raw index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw index into the table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw `u32` value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// A type's shape, as far as match compilation cares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    /// Binder error sentinel.
    Error,
    Bool,
    Int,
    Float,
    Char,
    /// Immutable string; a reference type (nullable).
    Str,
    /// Top of the reference hierarchy.
    Object,
    /// Nominal class with single inheritance and interface list.
    Class {
        name: Name,
        base: Option<TypeId>,
        interfaces: SmallVec<[TypeId; 2]>,
    },
    /// Nominal interface; may extend other interfaces.
    Interface {
        name: Name,
        extends: SmallVec<[TypeId; 2]>,
    },
}

/// Append-only nominal type table.
///
/// Indices 0..=6 are pre-seeded with the primitives ([`TypeId::ERROR`]
/// through [`TypeId::OBJECT`]); classes and interfaces follow.
pub struct TypeTable {
    kinds: Vec<TypeKind>,
}

impl TypeTable {
    /// Create a table holding only the pre-seeded primitives.
    pub fn new() -> Self {
        TypeTable {
            kinds: vec![
                TypeKind::Error,
                TypeKind::Bool,
                TypeKind::Int,
                TypeKind::Float,
                TypeKind::Char,
                TypeKind::Str,
                TypeKind::Object,
            ],
        }
    }

    /// Add a class. `base` and every interface id must already exist.
    pub fn add_class(
        &mut self,
        name: Name,
        base: Option<TypeId>,
        interfaces: impl IntoIterator<Item = TypeId>,
    ) -> TypeId {
        self.push(TypeKind::Class {
            name,
            base,
            interfaces: interfaces.into_iter().collect(),
        })
    }

    /// Add an interface. Every extended id must already exist.
    pub fn add_interface(
        &mut self,
        name: Name,
        extends: impl IntoIterator<Item = TypeId>,
    ) -> TypeId {
        self.push(TypeKind::Interface {
            name,
            extends: extends.into_iter().collect(),
        })
    }

    fn push(&mut self, kind: TypeKind) -> TypeId {
        let id = u32::try_from(self.kinds.len())
            .unwrap_or_else(|_| panic!("type table exceeded u32::MAX entries"));
        self.kinds.push(kind);
        TypeId::new(id)
    }

    /// Look up a type's kind. Out-of-range ids resolve to `Error`.
    pub fn kind(&self, ty: TypeId) -> &TypeKind {
        self.kinds.get(ty.index()).unwrap_or(&TypeKind::Error)
    }

    /// Number of types in the table.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Always `false`; the primitives are pre-seeded.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Value types cannot hold `null` and need no null tests.
    pub fn is_value_type(&self, ty: TypeId) -> bool {
        matches!(
            self.kind(ty),
            TypeKind::Bool | TypeKind::Int | TypeKind::Float | TypeKind::Char
        )
    }

    /// Reference types can hold `null`.
    pub fn is_reference(&self, ty: TypeId) -> bool {
        matches!(
            self.kind(ty),
            TypeKind::Str | TypeKind::Object | TypeKind::Class { .. } | TypeKind::Interface { .. }
        )
    }

    /// Types the relational operators accept.
    pub fn is_orderable(&self, ty: TypeId) -> bool {
        matches!(
            self.kind(ty),
            TypeKind::Int | TypeKind::Float | TypeKind::Char
        )
    }

    /// Nominal subtype query: is `sub` assignable to `sup`?
    ///
    /// Reflexive; walks the base-class chain and interface closure.
    /// Everything except `Error` is a subtype of `Object`.
    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        if sub == sup {
            return true;
        }
        if sub == TypeId::ERROR || sup == TypeId::ERROR {
            return false;
        }
        if sup == TypeId::OBJECT {
            return true;
        }
        match self.kind(sub) {
            TypeKind::Class {
                base, interfaces, ..
            } => {
                if interfaces.iter().any(|&i| self.is_subtype(i, sup)) {
                    return true;
                }
                base.is_some_and(|b| self.is_subtype(b, sup))
            }
            TypeKind::Interface { extends, .. } => {
                extends.iter().any(|&e| self.is_subtype(e, sup))
            }
            _ => false,
        }
    }

    /// Render a type name for dumps and diagnostics.
    pub fn display(&self, ty: TypeId, names: &NameInterner) -> String {
        match self.kind(ty) {
            TypeKind::Error => "<error>".to_owned(),
            TypeKind::Bool => "bool".to_owned(),
            TypeKind::Int => "int".to_owned(),
            TypeKind::Float => "float".to_owned(),
            TypeKind::Char => "char".to_owned(),
            TypeKind::Str => "str".to_owned(),
            TypeKind::Object => "object".to_owned(),
            TypeKind::Class { name, .. } | TypeKind::Interface { name, .. } => {
                names.resolve(*name).to_owned()
            }
        }
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

// Size assertions to prevent accidental regressions
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::TypeId;
    crate::static_assert_size!(TypeId, 4);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (TypeTable, NameInterner, TypeId, TypeId, TypeId, TypeId) {
        let mut names = NameInterner::new();
        let mut types = TypeTable::new();
        let animal = types.add_class(names.intern("Animal"), None, []);
        let pet = types.add_interface(names.intern("Pet"), []);
        let dog = types.add_class(names.intern("Dog"), Some(animal), [pet]);
        let puppy = types.add_class(names.intern("Puppy"), Some(dog), []);
        (types, names, animal, pet, dog, puppy)
    }

    #[test]
    fn subtype_reflexive_and_chain() {
        let (types, _, animal, pet, dog, puppy) = sample();
        assert!(types.is_subtype(dog, dog));
        assert!(types.is_subtype(dog, animal));
        assert!(types.is_subtype(puppy, animal)); // transitive base chain
        assert!(types.is_subtype(puppy, pet)); // interface via base
        assert!(!types.is_subtype(animal, dog));
        assert!(!types.is_subtype(pet, dog));
    }

    #[test]
    fn object_is_top() {
        let (types, _, animal, pet, _, _) = sample();
        assert!(types.is_subtype(animal, TypeId::OBJECT));
        assert!(types.is_subtype(pet, TypeId::OBJECT));
        assert!(types.is_subtype(TypeId::INT, TypeId::OBJECT));
        assert!(!types.is_subtype(TypeId::ERROR, TypeId::OBJECT));
    }

    #[test]
    fn interface_extension() {
        let mut names = NameInterner::new();
        let mut types = TypeTable::new();
        let shape = types.add_interface(names.intern("Shape"), []);
        let polygon = types.add_interface(names.intern("Polygon"), [shape]);
        let square = types.add_class(names.intern("Square"), None, [polygon]);
        assert!(types.is_subtype(square, shape));
        assert!(types.is_subtype(polygon, shape));
    }

    #[test]
    fn classification() {
        let (types, _, animal, _, _, _) = sample();
        assert!(types.is_value_type(TypeId::INT));
        assert!(types.is_value_type(TypeId::CHAR));
        assert!(!types.is_value_type(TypeId::STR));
        assert!(types.is_reference(TypeId::STR));
        assert!(types.is_reference(animal));
        assert!(types.is_orderable(TypeId::FLOAT));
        assert!(!types.is_orderable(TypeId::BOOL));
        assert!(!types.is_orderable(animal));
    }

    #[test]
    fn display_names() {
        let (types, names, animal, _, _, _) = sample();
        assert_eq!(types.display(TypeId::INT, &names), "int");
        assert_eq!(types.display(animal, &names), "Animal");
        assert_eq!(types.display(TypeId::ERROR, &names), "<error>");
    }
}
