//! Runtime value representation for the interpreter

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use codemodel_core::expressions::Constant;
use codemodel_core::{FieldId, TypeId};

/// Shared, mutable object reference
pub type ObjectRef = Rc<RefCell<Object>>;

/// Runtime value representation
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Null reference, and the result of `void` calls
    #[default]
    Null,
    /// Boolean value
    Boolean(bool),
    /// Every integral type, widened
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Character value
    Char(char),
    /// String value
    String(String),
    /// Instance of a type
    Object(ObjectRef),
}

/// Heap object: its type and the fields assigned so far
#[derive(Debug)]
pub struct Object {
    pub ty: TypeId,
    pub fields: FxHashMap<FieldId, Value>,
}

impl Object {
    /// Creates a new object with no fields set
    pub fn new(ty: TypeId) -> ObjectRef {
        Rc::new(RefCell::new(Self {
            ty,
            fields: FxHashMap::default(),
        }))
    }
}

impl Value {
    /// Create a value from a literal
    pub fn from_constant(constant: &Constant) -> Self {
        match constant {
            Constant::Null => Value::Null,
            Constant::Bool(b) => Value::Boolean(*b),
            Constant::Int32(i) => Value::Integer(i64::from(*i)),
            Constant::Int64(i) => Value::Integer(*i),
            Constant::UInt32(i) => Value::Integer(i64::from(*i)),
            // Reinterpreted, as an unsigned load would be
            Constant::UInt64(i) => Value::Integer(*i as i64),
            Constant::Float64(f) => Value::Float(*f),
            Constant::Char(c) => Value::Char(*c),
            Constant::String(s) => Value::String(s.clone()),
        }
    }

    /// Zero value of a type, as locals and fields start out
    pub fn default_for(ty: TypeId) -> Self {
        const INTEGRAL: [TypeId; 5] = [
            TypeId::INT32,
            TypeId::INT64,
            TypeId::UINT32,
            TypeId::UINT64,
            TypeId::INTPTR,
        ];
        if ty == TypeId::BOOLEAN {
            Value::Boolean(false)
        } else if ty == TypeId::CHAR {
            Value::Char('\0')
        } else if INTEGRAL.contains(&ty) {
            Value::Integer(0)
        } else if ty == TypeId::FLOAT64 {
            Value::Float(0.0)
        } else {
            Value::Null
        }
    }

    /// Create an integer value
    pub fn from_integer(i: i64) -> Self {
        Value::Integer(i)
    }

    /// Check if value is truthy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Char(c) => *c != '\0',
            Value::String(_) | Value::Object(_) => true,
        }
    }

    /// Try to convert to integer
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Char(c) => Some(i64::from(u32::from(*c))),
            Value::Boolean(true) => Some(1),
            Value::Boolean(false) => Some(0),
            _ => None,
        }
    }

    /// Try to convert to float
    pub fn to_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Convert to boolean if possible
    pub fn to_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The object if this is one
    pub fn to_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Name of the value's kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Char(c) => write!(f, "'{}'", c),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Object(object) => write!(f, "<object {}>", object.borrow().ty),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                (*a as f64) == *b
            }
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            // Reference equality
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
