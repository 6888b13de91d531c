use std::fmt::Display;

use crate::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Void,
    Bool,
    Int,
    Float,
    String,
    List,
    Map,
    Hash,
}

impl BuiltinType {
    pub fn from_name(name: &str) -> Option<BuiltinType> {
        match name {
            "void" => Some(BuiltinType::Void),
            "bool" => Some(BuiltinType::Bool),
            "int" => Some(BuiltinType::Int),
            "float" => Some(BuiltinType::Float),
            "string" => Some(BuiltinType::String),
            "list" => Some(BuiltinType::List),
            "map" => Some(BuiltinType::Map),
            "hash" => Some(BuiltinType::Hash),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinType::Void => "void",
            BuiltinType::Bool => "bool",
            BuiltinType::Int => "int",
            BuiltinType::Float => "float",
            BuiltinType::String => "string",
            BuiltinType::List => "list",
            BuiltinType::Map => "map",
            BuiltinType::Hash => "hash",
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, BuiltinType::List | BuiltinType::Map)
    }

    /// Whether a user type may appear inside this type's brackets.
    pub fn accepts_named_sub_type(&self) -> bool {
        matches!(self, BuiltinType::List | BuiltinType::Map | BuiltinType::Hash)
    }
}

impl Display for BuiltinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// A builtin type with its bracketed sub types, e.g. `map[string, int]`
    Builtin {
        builtin: BuiltinType,
        sub: Vec<TypeDescriptor>,
    },
    /// A class or hash type referenced by name
    Named(String),
    /// A type followed by a parameter list, e.g. `int(string, float)`
    Function {
        returns: Box<TypeDescriptor>,
        params: Vec<TypeDescriptor>,
        required: usize,
        variadic: bool,
    },
}

/// A type as written in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    pub is_const: bool,
    pub position: Position,
}

impl TypeDescriptor {
    pub fn builtin(builtin: BuiltinType, position: Position) -> Self {
        TypeDescriptor {
            kind: TypeKind::Builtin {
                builtin,
                sub: vec![],
            },
            is_const: false,
            position,
        }
    }

    pub fn named(name: String, position: Position) -> Self {
        TypeDescriptor {
            kind: TypeKind::Named(name),
            is_const: false,
            position,
        }
    }

    pub fn with_const(mut self, is_const: bool) -> Self {
        self.is_const = is_const;
        self
    }

    pub fn as_builtin(&self) -> Option<BuiltinType> {
        match &self.kind {
            TypeKind::Builtin { builtin, .. } => Some(*builtin),
            _ => None,
        }
    }
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_const {
            write!(f, "const ")?;
        }

        match &self.kind {
            TypeKind::Builtin { builtin, sub } => {
                write!(f, "{}", builtin)?;
                if !sub.is_empty() {
                    let sub = sub.iter().map(|s| s.to_string()).collect::<Vec<_>>();
                    write!(f, "[{}]", sub.join(", "))?;
                }
                Ok(())
            }
            TypeKind::Named(name) => write!(f, "{}", name),
            TypeKind::Function {
                returns, params, ..
            } => {
                let params = params.iter().map(|p| p.to_string()).collect::<Vec<_>>();
                write!(f, "{}({})", returns, params.join(", "))
            }
        }
    }
}
