//! Metadata definitions referenced by code: types, fields, methods,
//! properties, parameters and locals
//!
//! These live outside any method body cone. Copying a body never copies
//! them, with the exception of locals and parameters declared inside the
//! copied cone.

use crate::expressions::Constant;
use crate::ids::{ExprId, FieldId, MethodId, ParamId, PropertyId, TypeId};
use crate::location::Location;
use serde::{Deserialize, Serialize};

/// Member accessibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    /// Visible everywhere
    Public,
    /// Visible to the declaring type only
    #[default]
    Private,
    /// Visible to derived types
    Family,
    /// Visible inside the declaring unit
    Assembly,
    /// Derived types or the declaring unit
    FamilyOrAssembly,
    /// Derived types inside the declaring unit
    FamilyAndAssembly,
}

/// An attribute attached to a member
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomAttribute {
    /// The attribute type
    pub ty: TypeId,
    /// Positional constructor arguments
    pub arguments: Vec<Constant>,
}

impl CustomAttribute {
    /// Attribute of the given type with no arguments
    pub fn new(ty: TypeId) -> Self {
        Self {
            ty,
            arguments: Vec::new(),
        }
    }
}

/// Types every model provides at fixed handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformType {
    Void,
    Boolean,
    Char,
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float64,
    String,
    Object,
    IntPtr,
    TypedReference,
    RuntimeArgumentHandle,
    SystemType,
}

impl PlatformType {
    /// All platform types in allocation order
    pub const ALL: [PlatformType; 14] = [
        PlatformType::Void,
        PlatformType::Boolean,
        PlatformType::Char,
        PlatformType::Int32,
        PlatformType::Int64,
        PlatformType::UInt32,
        PlatformType::UInt64,
        PlatformType::Float64,
        PlatformType::String,
        PlatformType::Object,
        PlatformType::IntPtr,
        PlatformType::TypedReference,
        PlatformType::RuntimeArgumentHandle,
        PlatformType::SystemType,
    ];

    /// The fixed handle of this type
    pub fn id(self) -> TypeId {
        match self {
            PlatformType::Void => TypeId::VOID,
            PlatformType::Boolean => TypeId::BOOLEAN,
            PlatformType::Char => TypeId::CHAR,
            PlatformType::Int32 => TypeId::INT32,
            PlatformType::Int64 => TypeId::INT64,
            PlatformType::UInt32 => TypeId::UINT32,
            PlatformType::UInt64 => TypeId::UINT64,
            PlatformType::Float64 => TypeId::FLOAT64,
            PlatformType::String => TypeId::STRING,
            PlatformType::Object => TypeId::OBJECT,
            PlatformType::IntPtr => TypeId::INTPTR,
            PlatformType::TypedReference => TypeId::TYPED_REFERENCE,
            PlatformType::RuntimeArgumentHandle => TypeId::RUNTIME_ARGUMENT_HANDLE,
            PlatformType::SystemType => TypeId::SYSTEM_TYPE,
        }
    }

    /// Simple name of the type
    pub fn name(self) -> &'static str {
        match self {
            PlatformType::Void => "Void",
            PlatformType::Boolean => "Boolean",
            PlatformType::Char => "Char",
            PlatformType::Int32 => "Int32",
            PlatformType::Int64 => "Int64",
            PlatformType::UInt32 => "UInt32",
            PlatformType::UInt64 => "UInt64",
            PlatformType::Float64 => "Double",
            PlatformType::String => "String",
            PlatformType::Object => "Object",
            PlatformType::IntPtr => "IntPtr",
            PlatformType::TypedReference => "TypedReference",
            PlatformType::RuntimeArgumentHandle => "RuntimeArgumentHandle",
            PlatformType::SystemType => "Type",
        }
    }

    /// Whether the type is a value type
    pub fn is_value_type(self) -> bool {
        !matches!(
            self,
            PlatformType::String | PlatformType::Object | PlatformType::SystemType
        )
    }
}

/// A type definition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    pub namespace: String,
    pub base_type: Option<TypeId>,
    pub is_value_type: bool,
    pub is_compiler_generated: bool,
    pub fields: Vec<FieldId>,
    pub methods: Vec<MethodId>,
    pub properties: Vec<PropertyId>,
    pub nested_types: Vec<TypeId>,
    pub attributes: Vec<CustomAttribute>,
}

impl TypeDefinition {
    /// A reference type with the given name
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            base_type: Some(TypeId::OBJECT),
            ..Default::default()
        }
    }

    /// Namespace-qualified name
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

/// A field definition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub ty: TypeId,
    pub containing_type: TypeId,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_read_only: bool,
    pub is_compiler_generated: bool,
    pub attributes: Vec<CustomAttribute>,
}

impl FieldDefinition {
    /// A private instance field
    pub fn new(name: impl Into<String>, ty: TypeId, containing_type: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            containing_type,
            ..Default::default()
        }
    }
}

/// A method definition. The body, if any, is stored on the model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MethodDefinition {
    pub name: String,
    pub containing_type: TypeId,
    pub return_type: TypeId,
    pub parameters: Vec<ParamId>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_abstract: bool,
    /// Accessors and operators carry a special name
    pub is_special_name: bool,
    pub is_constructor: bool,
    pub is_compiler_generated: bool,
    pub attributes: Vec<CustomAttribute>,
}

impl MethodDefinition {
    /// A private instance method without parameters
    pub fn new(name: impl Into<String>, containing_type: TypeId, return_type: TypeId) -> Self {
        Self {
            name: name.into(),
            containing_type,
            return_type,
            ..Default::default()
        }
    }
}

/// A property definition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    pub ty: TypeId,
    pub containing_type: TypeId,
    pub getter: Option<MethodId>,
    pub setter: Option<MethodId>,
    /// Non-empty for indexers
    pub parameters: Vec<ParamId>,
    pub attributes: Vec<CustomAttribute>,
}

impl PropertyDefinition {
    /// A property without accessors
    pub fn new(name: impl Into<String>, ty: TypeId, containing_type: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            containing_type,
            ..Default::default()
        }
    }
}

/// A local variable
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalDefinition {
    pub name: String,
    pub ty: TypeId,
    pub is_constant: bool,
    pub is_pinned: bool,
    pub is_reference: bool,
    pub locations: Vec<Location>,
}

impl LocalDefinition {
    /// A plain local of the given type
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            ..Default::default()
        }
    }
}

/// What declares a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureOwner {
    Method(MethodId),
    AnonymousDelegate(ExprId),
}

impl Default for SignatureOwner {
    fn default() -> Self {
        SignatureOwner::Method(MethodId::DUMMY)
    }
}

/// A parameter of a method or anonymous delegate
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    pub ty: TypeId,
    /// Zero-based position in the signature
    pub index: u16,
    pub owner: SignatureOwner,
    pub is_by_reference: bool,
    pub is_out: bool,
}

impl ParameterDefinition {
    /// A by-value parameter
    pub fn new(name: impl Into<String>, ty: TypeId, index: u16, owner: SignatureOwner) -> Self {
        Self {
            name: name.into(),
            ty,
            index,
            owner,
            ..Default::default()
        }
    }
}
