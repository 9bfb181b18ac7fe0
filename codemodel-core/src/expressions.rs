//! Expression nodes
//!
//! Each concrete expression kind is its own struct. [`ExpressionKind`] is the
//! closed sum over all of them; every transform matches it exhaustively.
//! Default-constructed nodes point at the dummy handles.

use crate::ids::{ExprId, FieldId, LocalId, MethodId, ParamId, PropertyId, StmtId, TypeId};
use crate::location::Location;
use serde::{Deserialize, Serialize};

/// An expression node: its kind, result type and source tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    /// Type of the value the expression produces
    pub ty: TypeId,
    pub locations: Vec<Location>,
}

impl Expression {
    /// Creates an untagged expression
    pub fn new(kind: impl Into<ExpressionKind>, ty: TypeId) -> Self {
        Self {
            kind: kind.into(),
            ty,
            locations: Vec::new(),
        }
    }

    /// Adds a source location tag
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }
}

/// Access to a concrete node struct through its [`ExpressionKind`] variant
pub trait ExpressionNode: Sized + Into<ExpressionKind> {
    /// Borrows the node if `kind` holds this node type
    fn from_kind(kind: &ExpressionKind) -> Option<&Self>;
    /// Mutably borrows the node if `kind` holds this node type
    fn from_kind_mut(kind: &mut ExpressionKind) -> Option<&mut Self>;
}

macro_rules! expression_kinds {
    ($($variant:ident),* $(,)?) => {
        /// Every expression node kind
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum ExpressionKind {
            $($variant($variant),)*
        }

        /// Fieldless mirror of [`ExpressionKind`] used for dispatch
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ExpressionTag {
            $($variant,)*
        }

        impl ExpressionKind {
            /// The kind's tag
            pub fn tag(&self) -> ExpressionTag {
                match self {
                    $(ExpressionKind::$variant(_) => ExpressionTag::$variant,)*
                }
            }

            /// The kind's name
            pub fn name(&self) -> &'static str {
                self.tag().name()
            }
        }

        impl ExpressionTag {
            /// The kind's name
            pub fn name(self) -> &'static str {
                match self {
                    $(ExpressionTag::$variant => stringify!($variant),)*
                }
            }
        }

        $(
            impl From<$variant> for ExpressionKind {
                fn from(node: $variant) -> Self {
                    ExpressionKind::$variant(node)
                }
            }

            impl ExpressionNode for $variant {
                fn from_kind(kind: &ExpressionKind) -> Option<&Self> {
                    match kind {
                        ExpressionKind::$variant(node) => Some(node),
                        _ => None,
                    }
                }

                fn from_kind_mut(kind: &mut ExpressionKind) -> Option<&mut Self> {
                    match kind {
                        ExpressionKind::$variant(node) => Some(node),
                        _ => None,
                    }
                }
            }
        )*
    };
}

expression_kinds! {
    Addition,
    AddressableExpression,
    AddressDereference,
    AddressOf,
    AnonymousDelegate,
    ArrayIndexer,
    Assignment,
    BitwiseAnd,
    BitwiseOr,
    BlockExpression,
    BoundExpression,
    CastIfPossible,
    CheckIfInstance,
    CompileTimeConstant,
    Conditional,
    Conversion,
    CreateArray,
    CreateDelegateInstance,
    CreateObjectInstance,
    DefaultValue,
    Division,
    DupValue,
    Equality,
    ExclusiveOr,
    GetTypeOfTypedReference,
    GetValueOfTypedReference,
    GreaterThan,
    GreaterThanOrEqual,
    LeftShift,
    LessThan,
    LessThanOrEqual,
    LogicalNot,
    MakeTypedReference,
    MethodCall,
    Modulus,
    Multiplication,
    NamedArgument,
    NotEquality,
    OldValue,
    OnesComplement,
    OutArgument,
    PointerCall,
    PopValue,
    RefArgument,
    ReturnValue,
    RightShift,
    RuntimeArgumentHandleExpression,
    SizeOf,
    StackArrayCreate,
    Subtraction,
    TargetExpression,
    ThisReference,
    TokenOf,
    TypeOf,
    UnaryNegation,
    UnaryPlus,
    VectorLength,
}

impl ExpressionKind {
    /// The two operands if this is a binary operation
    pub fn as_binary(&self) -> Option<&dyn BinaryOperation> {
        let operation: &dyn BinaryOperation = match self {
            ExpressionKind::Addition(node) => node,
            ExpressionKind::BitwiseAnd(node) => node,
            ExpressionKind::BitwiseOr(node) => node,
            ExpressionKind::Division(node) => node,
            ExpressionKind::Equality(node) => node,
            ExpressionKind::ExclusiveOr(node) => node,
            ExpressionKind::GreaterThan(node) => node,
            ExpressionKind::GreaterThanOrEqual(node) => node,
            ExpressionKind::LeftShift(node) => node,
            ExpressionKind::LessThan(node) => node,
            ExpressionKind::LessThanOrEqual(node) => node,
            ExpressionKind::Modulus(node) => node,
            ExpressionKind::Multiplication(node) => node,
            ExpressionKind::NotEquality(node) => node,
            ExpressionKind::RightShift(node) => node,
            ExpressionKind::Subtraction(node) => node,
            _ => return None,
        };
        Some(operation)
    }
}

/// A compile-time constant value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Constant {
    #[default]
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Float64(f64),
    Char(char),
    String(String),
}

impl Constant {
    /// The platform type of the constant. `Null` is typed as object.
    pub fn platform_type(&self) -> TypeId {
        match self {
            Constant::Null => TypeId::OBJECT,
            Constant::Bool(_) => TypeId::BOOLEAN,
            Constant::Int32(_) => TypeId::INT32,
            Constant::Int64(_) => TypeId::INT64,
            Constant::UInt32(_) => TypeId::UINT32,
            Constant::UInt64(_) => TypeId::UINT64,
            Constant::Float64(_) => TypeId::FLOAT64,
            Constant::Char(_) => TypeId::CHAR,
            Constant::String(_) => TypeId::STRING,
        }
    }
}

/// What a [`BoundExpression`] reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundDefinition {
    Local(LocalId),
    Parameter(ParamId),
    Field(FieldId),
}

impl Default for BoundDefinition {
    fn default() -> Self {
        BoundDefinition::Local(LocalId::DUMMY)
    }
}

/// What a [`TargetExpression`] writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetDefinition {
    Local(LocalId),
    Parameter(ParamId),
    Field(FieldId),
    /// Handle of an [`ArrayIndexer`]. The target's instance and type follow the indexer.
    ArrayIndexer(ExprId),
    /// Handle of an [`AddressDereference`]
    AddressDereference(ExprId),
    Property(PropertyId),
}

impl Default for TargetDefinition {
    fn default() -> Self {
        TargetDefinition::Local(LocalId::DUMMY)
    }
}

/// What an [`AddressableExpression`] takes the address of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressableDefinition {
    Local(LocalId),
    Parameter(ParamId),
    Field(FieldId),
    /// Handle of an [`ArrayIndexer`]
    ArrayIndexer(ExprId),
    /// Handle of an [`AddressDereference`]
    AddressDereference(ExprId),
    Method(MethodId),
    /// Handle of a [`ThisReference`]
    This(ExprId),
    /// Any other expression whose value is spilled to a temporary
    Expression(ExprId),
}

impl Default for AddressableDefinition {
    fn default() -> Self {
        AddressableDefinition::Local(LocalId::DUMMY)
    }
}

/// The metadata item a [`TokenOf`] expression loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenDefinition {
    Field(FieldId),
    Method(MethodId),
    Type(TypeId),
}

impl Default for TokenDefinition {
    fn default() -> Self {
        TokenDefinition::Type(TypeId::DUMMY)
    }
}

/// Shared shape of the binary operator nodes
pub trait BinaryOperation {
    fn left_operand(&self) -> ExprId;
    fn right_operand(&self) -> ExprId;
    /// The expression yields the left operand's value from before the
    /// operation (postfix increment and friends)
    fn result_is_unmodified_left_operand(&self) -> bool;
}

macro_rules! binary_operation {
    ($(#[$doc:meta])* $name:ident $({ $($(#[$flag_doc:meta])* $flag:ident),* })?) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
        pub struct $name {
            pub left_operand: ExprId,
            pub right_operand: ExprId,
            pub result_is_unmodified_left_operand: bool,
            $($($(#[$flag_doc])* pub $flag: bool,)*)?
        }

        impl $name {
            /// Operation over the two operands with all flags cleared
            pub fn new(left_operand: ExprId, right_operand: ExprId) -> Self {
                Self {
                    left_operand,
                    right_operand,
                    ..Default::default()
                }
            }
        }

        impl BinaryOperation for $name {
            fn left_operand(&self) -> ExprId {
                self.left_operand
            }

            fn right_operand(&self) -> ExprId {
                self.right_operand
            }

            fn result_is_unmodified_left_operand(&self) -> bool {
                self.result_is_unmodified_left_operand
            }
        }
    };
}

binary_operation!(
    /// `left + right`
    Addition {
        /// Trap on overflow
        check_overflow,
        treat_operands_as_unsigned
    }
);
binary_operation!(
    /// `left - right`
    Subtraction {
        /// Trap on overflow
        check_overflow,
        treat_operands_as_unsigned
    }
);
binary_operation!(
    /// `left * right`
    Multiplication {
        /// Trap on overflow
        check_overflow,
        treat_operands_as_unsigned
    }
);
binary_operation!(
    /// `left / right`
    Division { treat_operands_as_unsigned }
);
binary_operation!(
    /// `left % right`
    Modulus { treat_operands_as_unsigned }
);
binary_operation!(
    /// `left >> right`
    RightShift { treat_operands_as_unsigned }
);
binary_operation!(
    /// `left << right`
    LeftShift
);
binary_operation!(
    /// `left & right`
    BitwiseAnd
);
binary_operation!(
    /// `left | right`
    BitwiseOr
);
binary_operation!(
    /// `left ^ right`
    ExclusiveOr
);
binary_operation!(
    /// `left == right`
    Equality
);
binary_operation!(
    /// `left != right`
    NotEquality
);
binary_operation!(
    /// `left > right`
    GreaterThan {
        /// Unsigned compare, or unordered for floats
        is_unsigned_or_unordered
    }
);
binary_operation!(
    /// `left >= right`
    GreaterThanOrEqual {
        /// Unsigned compare, or unordered for floats
        is_unsigned_or_unordered
    }
);
binary_operation!(
    /// `left < right`
    LessThan {
        /// Unsigned compare, or unordered for floats
        is_unsigned_or_unordered
    }
);
binary_operation!(
    /// `left <= right`
    LessThanOrEqual {
        /// Unsigned compare, or unordered for floats
        is_unsigned_or_unordered
    }
);

/// An expression whose address can be taken
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AddressableExpression {
    pub definition: AddressableDefinition,
    /// Object owning an instance field or method
    pub instance: Option<ExprId>,
}

/// `*address`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AddressDereference {
    pub address: ExprId,
    pub is_unaligned: bool,
    pub alignment: u8,
    pub is_volatile: bool,
}

/// `&expression` where `expression` is an [`AddressableExpression`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AddressOf {
    pub expression: ExprId,
    /// The address may not be used to mutate the object
    pub object_control_mutability: bool,
}

/// A lambda. Its parameters are owned by the delegate expression.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnonymousDelegate {
    pub parameters: Vec<ParamId>,
    pub body: StmtId,
    pub return_type: TypeId,
    pub is_static: bool,
}

/// `indexed_object[indices]`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrayIndexer {
    pub indexed_object: ExprId,
    pub indices: Vec<ExprId>,
}

/// `target = source` where `target` is a [`TargetExpression`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Assignment {
    pub target: ExprId,
    pub source: ExprId,
}

/// Runs a block for its side effects, then yields an expression
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockExpression {
    pub block_statement: StmtId,
    pub expression: ExprId,
}

/// Reads a local, parameter or field
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundExpression {
    pub definition: BoundDefinition,
    /// Object owning an instance field
    pub instance: Option<ExprId>,
    pub is_volatile: bool,
    pub alignment: u8,
}

/// `value as T`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CastIfPossible {
    pub value_to_cast: ExprId,
    pub target_type: TypeId,
}

/// `operand is T`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CheckIfInstance {
    pub operand: ExprId,
    pub type_to_check: TypeId,
}

/// A literal
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompileTimeConstant {
    pub value: Constant,
}

/// `condition ? result_if_true : result_if_false`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Conditional {
    pub condition: ExprId,
    pub result_if_true: ExprId,
    pub result_if_false: ExprId,
}

/// `(T) value`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Conversion {
    pub value_to_convert: ExprId,
    pub type_after_conversion: TypeId,
    pub check_numeric_range: bool,
}

/// `new T[sizes] { initializers }`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreateArray {
    pub element_type: TypeId,
    pub rank: u32,
    pub sizes: Vec<ExprId>,
    pub lower_bounds: Vec<i32>,
    pub initializers: Vec<ExprId>,
}

/// Binds a method (and receiver) into a delegate
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreateDelegateInstance {
    pub instance: Option<ExprId>,
    pub method_to_call_via_delegate: MethodId,
    pub is_virtual_delegate: bool,
}

/// `new T(arguments)`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreateObjectInstance {
    /// The constructor
    pub method_to_call: MethodId,
    pub arguments: Vec<ExprId>,
}

/// `default(T)`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DefaultValue {
    pub default_value_type: TypeId,
}

/// Duplicates the value on top of the evaluation stack
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DupValue;

/// Type stored in a typed reference
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetTypeOfTypedReference {
    pub typed_reference: ExprId,
}

/// Value stored in a typed reference
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetValueOfTypedReference {
    pub typed_reference: ExprId,
    pub target_type: TypeId,
}

/// `!operand`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogicalNot {
    pub operand: ExprId,
}

/// `__makeref(operand)`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MakeTypedReference {
    pub operand: ExprId,
}

/// A direct or virtual call
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MethodCall {
    /// Receiver. Must be absent exactly when the call is static.
    pub this_argument: Option<ExprId>,
    pub arguments: Vec<ExprId>,
    pub method_to_call: MethodId,
    pub is_static_call: bool,
    pub is_virtual_call: bool,
    /// Jump calls reuse the caller's arguments and have no receiver of their own
    pub is_jump_call: bool,
    pub is_tail_call: bool,
}

impl MethodCall {
    /// A static call
    pub fn new_static(method_to_call: MethodId, arguments: Vec<ExprId>) -> Self {
        Self {
            method_to_call,
            arguments,
            is_static_call: true,
            ..Default::default()
        }
    }

    /// A non-virtual instance call
    pub fn new_instance(
        this_argument: ExprId,
        method_to_call: MethodId,
        arguments: Vec<ExprId>,
    ) -> Self {
        Self {
            this_argument: Some(this_argument),
            method_to_call,
            arguments,
            ..Default::default()
        }
    }

    /// Whether the receiver participates in the call
    pub fn has_receiver(&self) -> bool {
        !self.is_static_call && !self.is_jump_call
    }
}

/// `name: value` in a call with named arguments
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NamedArgument {
    pub argument_name: String,
    pub argument_value: ExprId,
}

/// `old(expression)` in a postcondition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OldValue {
    pub expression: ExprId,
}

/// `~operand`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OnesComplement {
    pub operand: ExprId,
}

/// `out expression` where `expression` is a [`TargetExpression`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutArgument {
    pub expression: ExprId,
}

/// Indirect call through a function pointer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerCall {
    pub pointer: ExprId,
    pub arguments: Vec<ExprId>,
}

/// Pops the value on top of the evaluation stack
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PopValue;

/// `ref expression` where `expression` is an [`AddressableExpression`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RefArgument {
    pub expression: ExprId,
}

/// `result` in a postcondition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReturnValue;

/// `__arglist`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuntimeArgumentHandleExpression;

/// `sizeof(T)`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SizeOf {
    pub type_to_size: TypeId,
}

/// `stackalloc T[size]`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StackArrayCreate {
    pub element_type: TypeId,
    pub size: ExprId,
}

/// The left side of an assignment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TargetExpression {
    pub definition: TargetDefinition,
    /// Object owning an instance field or property, or the array of an
    /// [`TargetDefinition::ArrayIndexer`] target
    pub instance: Option<ExprId>,
    pub is_volatile: bool,
    pub alignment: u8,
}

/// `this`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThisReference;

/// Loads a metadata token
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TokenOf {
    pub definition: TokenDefinition,
}

/// `typeof(T)`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeOf {
    pub type_to_get: TypeId,
}

/// `-operand`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnaryNegation {
    pub operand: ExprId,
    pub check_overflow: bool,
}

/// `+operand`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnaryPlus {
    pub operand: ExprId,
}

/// Length of a one-dimensional zero-based array
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VectorLength {
    pub vector: ExprId,
}
