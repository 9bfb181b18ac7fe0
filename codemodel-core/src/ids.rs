//! Typed handles into the code model arenas
//!
//! Every handle wraps a `NonZeroU32` so that `Option<Handle>` costs nothing.
//! Handle value 1 in every arena is reserved for that arena's dummy entry.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

const fn fixed(value: u32) -> NonZeroU32 {
    match NonZeroU32::new(value) {
        Some(value) => value,
        None => panic!("fixed handles are non-zero"),
    }
}

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal, $arena:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub NonZeroU32);

        impl $name {
            /// Creates a handle from a raw value.
            /// Returns None if the value is 0.
            pub fn new(value: u32) -> Option<Self> {
                NonZeroU32::new(value).map($name)
            }

            /// Gets the inner u32 value
            pub fn get(&self) -> u32 {
                self.0.get()
            }

            pub(crate) fn index(&self) -> usize {
                (self.0.get() - 1) as usize
            }

            pub(crate) fn from_index(index: usize) -> Result<Self> {
                u32::try_from(index + 1)
                    .ok()
                    .and_then(Self::new)
                    .ok_or(Error::HandleOverflow($arena))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_handle!(
    /// Handle of an expression node
    ExprId, "e", "expressions"
);
define_handle!(
    /// Handle of a statement node
    StmtId, "s", "statements"
);
define_handle!(
    /// Handle of a local variable definition
    LocalId, "l", "locals"
);
define_handle!(
    /// Handle of a parameter definition
    ParamId, "p", "parameters"
);
define_handle!(
    /// Handle of a type definition
    TypeId, "t", "types"
);
define_handle!(
    /// Handle of a field definition
    FieldId, "f", "fields"
);
define_handle!(
    /// Handle of a method definition
    MethodId, "m", "methods"
);
define_handle!(
    /// Handle of a property definition
    PropertyId, "pr", "properties"
);

impl ExprId {
    /// The shared placeholder expression. Never copied, never mutated.
    pub const DUMMY: ExprId = ExprId(fixed(1));
}

impl StmtId {
    /// The shared empty placeholder block.
    ///
    /// A mutator hook returning this handle for a statement removes that
    /// statement from its enclosing list.
    pub const DUMMY_BLOCK: StmtId = StmtId(fixed(1));
}

impl LocalId {
    /// Placeholder local
    pub const DUMMY: LocalId = LocalId(fixed(1));
}

impl ParamId {
    /// Placeholder parameter
    pub const DUMMY: ParamId = ParamId(fixed(1));
}

impl FieldId {
    /// Placeholder field
    pub const DUMMY: FieldId = FieldId(fixed(1));
}

impl MethodId {
    /// Placeholder method
    pub const DUMMY: MethodId = MethodId(fixed(1));
}

impl PropertyId {
    /// Placeholder property
    pub const DUMMY: PropertyId = PropertyId(fixed(1));
}

// Platform types are allocated in this order by `CodeModel::new`.
impl TypeId {
    /// Placeholder type
    pub const DUMMY: TypeId = TypeId(fixed(1));
    /// `void`
    pub const VOID: TypeId = TypeId(fixed(2));
    /// `bool`
    pub const BOOLEAN: TypeId = TypeId(fixed(3));
    /// `char`
    pub const CHAR: TypeId = TypeId(fixed(4));
    /// 32-bit signed integer
    pub const INT32: TypeId = TypeId(fixed(5));
    /// 64-bit signed integer
    pub const INT64: TypeId = TypeId(fixed(6));
    /// 32-bit unsigned integer
    pub const UINT32: TypeId = TypeId(fixed(7));
    /// 64-bit unsigned integer
    pub const UINT64: TypeId = TypeId(fixed(8));
    /// 64-bit float
    pub const FLOAT64: TypeId = TypeId(fixed(9));
    /// `string`
    pub const STRING: TypeId = TypeId(fixed(10));
    /// `object`
    pub const OBJECT: TypeId = TypeId(fixed(11));
    /// Native-sized integer
    pub const INTPTR: TypeId = TypeId(fixed(12));
    /// Typed reference
    pub const TYPED_REFERENCE: TypeId = TypeId(fixed(13));
    /// Runtime argument handle
    pub const RUNTIME_ARGUMENT_HANDLE: TypeId = TypeId(fixed(14));
    /// Reflection type object
    pub const SYSTEM_TYPE: TypeId = TypeId(fixed(15));
}

macro_rules! dummy_default {
    ($($name:ident => $value:expr),* $(,)?) => {
        $(impl Default for $name {
            fn default() -> Self {
                $value
            }
        })*
    };
}

dummy_default! {
    ExprId => ExprId::DUMMY,
    StmtId => StmtId::DUMMY_BLOCK,
    LocalId => LocalId::DUMMY,
    ParamId => ParamId::DUMMY,
    TypeId => TypeId::DUMMY,
    FieldId => FieldId::DUMMY,
    MethodId => MethodId::DUMMY,
    PropertyId => PropertyId::DUMMY,
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
