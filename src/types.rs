//! WDL data types as written in declarations
//!
//! WDL has both atomic types such as `Int`, `Boolean`, and `String`; and
//! parametric types like `Array[String]` and `Map[String,Array[Array[Float]]]`.
//! Each type is represented by an immutable instance of a Rust enum. Struct
//! references are kept by name; resolving them against struct definitions is
//! left to downstream consumers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A WDL type as it appears in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    /// Boolean type (true/false)
    Boolean { optional: bool },

    /// Integer type
    Int { optional: bool },

    /// Floating point type
    Float { optional: bool },

    /// String type
    String { optional: bool },

    /// File type (represents a filesystem path)
    File { optional: bool },

    /// Directory type (represents a directory path)
    Directory { optional: bool },

    /// Array type, parameterized by item type
    Array {
        item_type: Box<Type>,
        optional: bool,
        nonempty: bool,
    },

    /// Map type, parameterized by key and value types
    Map {
        key_type: Box<Type>,
        value_type: Box<Type>,
        optional: bool,
    },

    /// Pair type, parameterized by left and right types
    Pair {
        left_type: Box<Type>,
        right_type: Box<Type>,
        optional: bool,
    },

    /// Instance of a struct type, referenced by name
    StructInstance { type_name: String, optional: bool },
}

impl Type {
    /// Create a new Boolean type.
    pub fn boolean(optional: bool) -> Self {
        Type::Boolean { optional }
    }

    /// Create a new Int type.
    pub fn int(optional: bool) -> Self {
        Type::Int { optional }
    }

    /// Create a new Float type.
    pub fn float(optional: bool) -> Self {
        Type::Float { optional }
    }

    /// Create a new String type.
    pub fn string(optional: bool) -> Self {
        Type::String { optional }
    }

    /// Create a new File type.
    pub fn file(optional: bool) -> Self {
        Type::File { optional }
    }

    /// Create a new Directory type.
    pub fn directory(optional: bool) -> Self {
        Type::Directory { optional }
    }

    /// Create a new Array type.
    pub fn array(item_type: Type, optional: bool, nonempty: bool) -> Self {
        Type::Array {
            item_type: Box::new(item_type),
            optional,
            nonempty,
        }
    }

    /// Create a new Map type.
    pub fn map(key_type: Type, value_type: Type, optional: bool) -> Self {
        Type::Map {
            key_type: Box::new(key_type),
            value_type: Box::new(value_type),
            optional,
        }
    }

    /// Create a new Pair type.
    pub fn pair(left_type: Type, right_type: Type, optional: bool) -> Self {
        Type::Pair {
            left_type: Box::new(left_type),
            right_type: Box::new(right_type),
            optional,
        }
    }

    /// Create a new StructInstance type.
    pub fn struct_instance(type_name: String, optional: bool) -> Self {
        Type::StructInstance {
            type_name,
            optional,
        }
    }

    /// Check if this type is optional.
    pub fn is_optional(&self) -> bool {
        match self {
            Type::Boolean { optional }
            | Type::Int { optional }
            | Type::Float { optional }
            | Type::String { optional }
            | Type::File { optional }
            | Type::Directory { optional }
            | Type::Array { optional, .. }
            | Type::Map { optional, .. }
            | Type::Pair { optional, .. }
            | Type::StructInstance { optional, .. } => *optional,
        }
    }

    /// Check if this is a nonempty array type.
    pub fn is_nonempty(&self) -> bool {
        matches!(self, Type::Array { nonempty: true, .. })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base_str = match self {
            Type::Boolean { .. } => "Boolean".to_string(),
            Type::Int { .. } => "Int".to_string(),
            Type::Float { .. } => "Float".to_string(),
            Type::String { .. } => "String".to_string(),
            Type::File { .. } => "File".to_string(),
            Type::Directory { .. } => "Directory".to_string(),
            Type::Array {
                item_type,
                nonempty,
                ..
            } => {
                format!("Array[{}]{}", item_type, if *nonempty { "+" } else { "" })
            }
            Type::Map {
                key_type,
                value_type,
                ..
            } => {
                format!("Map[{},{}]", key_type, value_type)
            }
            Type::Pair {
                left_type,
                right_type,
                ..
            } => {
                format!("Pair[{},{}]", left_type, right_type)
            }
            Type::StructInstance { type_name, .. } => type_name.clone(),
        };

        let optional_suffix = if self.is_optional() { "?" } else { "" };

        write!(f, "{}{}", base_str, optional_suffix)
    }
}
