//! Interning arena for semantic types.
//!
//! Every type is identified by a canonical id string such as `list[int]`,
//! `map[string,int]` or `int<function(string,float)`. The cache hands out a
//! [`TypeId`] per distinct id string, so structurally equal types share a
//! handle. Constant types carry a `const~` prefix that [`TypeCache::compare`]
//! ignores for everything but function types.

use std::{collections::HashMap, fmt::Display};

use thiserror::Error;

use crate::ast::types::{BuiltinType, TypeDescriptor, TypeKind};

const CONST_PREFIX: &str = "const~";
const NULL: &str = "null";

/// Handle into a [`TypeCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

/// Invariant violations inside the type checker. These are bugs, never
/// problems with the checked program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("Cannot build a type identifier for {descriptor}")]
    UnsupportedDescriptor { descriptor: String },
    #[error("No scope was built for comprehension {id}")]
    MissingComprehensionScope { id: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub returns: TypeId,
    /// For variadic functions the last entry is the element type
    pub params: Vec<TypeId>,
    pub required: usize,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeIdentifier {
    pub id: String,
    /// `id` without any `const~` markers
    pub clean_id: String,
    pub builtin: Option<BuiltinType>,
    /// Class or hash type name
    pub user: Option<String>,
    pub is_const: bool,
    pub sub: Vec<TypeId>,
    pub function: Option<FunctionSignature>,
}

impl TypeIdentifier {
    fn plain(id: String) -> Self {
        TypeIdentifier {
            clean_id: id.replace(CONST_PREFIX, ""),
            id,
            builtin: None,
            user: None,
            is_const: false,
            sub: vec![],
            function: None,
        }
    }

    pub fn is_list(&self) -> bool {
        self.builtin == Some(BuiltinType::List)
    }

    pub fn is_map(&self) -> bool {
        self.builtin == Some(BuiltinType::Map)
    }

    pub fn is_function(&self) -> bool {
        self.function.is_some()
    }

    /// `list` or `map` without sub types, the type of `[]` and `{}`.
    pub fn is_empty_container(&self) -> bool {
        (self.is_list() || self.is_map()) && self.sub.is_empty()
    }

    pub fn is_null(&self) -> bool {
        self.id == NULL
    }

    /// Types that `null` may be assigned to.
    pub fn is_reference(&self) -> bool {
        self.user.is_some()
            || matches!(
                self.builtin,
                Some(BuiltinType::List | BuiltinType::Map | BuiltinType::Hash)
            )
    }
}

impl Display for TypeIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

#[derive(Debug, Default)]
pub struct TypeCache {
    types: Vec<TypeIdentifier>,
    lookup: HashMap<String, TypeId>,
}

impl TypeCache {
    pub fn new() -> Self {
        TypeCache::default()
    }

    fn intern(&mut self, identifier: TypeIdentifier) -> TypeId {
        if let Some(id) = self.lookup.get(&identifier.id) {
            return *id;
        }

        let id = TypeId(self.types.len());
        self.lookup.insert(identifier.id.clone(), id);
        self.types.push(identifier);
        id
    }

    pub fn get(&self, id: TypeId) -> &TypeIdentifier {
        &self.types[id.0]
    }

    /// The id string of a type, used in diagnostics.
    pub fn name(&self, id: TypeId) -> String {
        self.get(id).id.clone()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// A builtin without sub types. For `list` and `map` this is the type
    /// of an empty literal.
    pub fn builtin(&mut self, builtin: BuiltinType) -> TypeId {
        let mut identifier = TypeIdentifier::plain(builtin.name().to_string());
        identifier.builtin = Some(builtin);
        self.intern(identifier)
    }

    pub fn null(&mut self) -> TypeId {
        self.intern(TypeIdentifier::plain(NULL.to_string()))
    }

    pub fn list_of(&mut self, item: TypeId) -> TypeId {
        let mut identifier = TypeIdentifier::plain(format!("list[{}]", self.get(item).id));
        identifier.builtin = Some(BuiltinType::List);
        identifier.sub = vec![item];
        self.intern(identifier)
    }

    pub fn map_of(&mut self, key: TypeId, value: TypeId) -> TypeId {
        let mut identifier = TypeIdentifier::plain(format!(
            "map[{},{}]",
            self.get(key).id,
            self.get(value).id
        ));
        identifier.builtin = Some(BuiltinType::Map);
        identifier.sub = vec![key, value];
        self.intern(identifier)
    }

    pub fn function_of(
        &mut self,
        returns: TypeId,
        params: Vec<TypeId>,
        required: usize,
        variadic: bool,
    ) -> TypeId {
        let param_ids = params
            .iter()
            .map(|param| self.get(*param).id.as_str())
            .collect::<Vec<_>>();

        let mut identifier = TypeIdentifier::plain(format!(
            "{}<function({}{})",
            self.get(returns).id,
            param_ids.join(","),
            if variadic { "..." } else { "" }
        ));
        identifier.function = Some(FunctionSignature {
            returns,
            params,
            required,
            variadic,
        });
        self.intern(identifier)
    }

    /// A class or hash type, identified by its name.
    pub fn user_type(&mut self, name: &str) -> TypeId {
        let mut identifier = TypeIdentifier::plain(name.to_string());
        identifier.user = Some(name.to_string());
        self.intern(identifier)
    }

    pub fn make_const(&mut self, id: TypeId) -> TypeId {
        let base = self.get(id);
        if base.is_const {
            return id;
        }

        let mut identifier = base.clone();
        identifier.id = format!("{}{}", CONST_PREFIX, base.id);
        identifier.is_const = true;
        self.intern(identifier)
    }

    pub fn strip_const(&mut self, id: TypeId) -> TypeId {
        let base = self.get(id);
        let Some(stripped) = base.id.strip_prefix(CONST_PREFIX) else {
            return id;
        };

        let mut identifier = base.clone();
        identifier.id = stripped.to_string();
        identifier.is_const = false;
        self.intern(identifier)
    }

    /// Builds the semantic type of a syntactic one. Named types are taken on
    /// trust, the caller checks that they refer to a class or hash type.
    pub fn from_descriptor(&mut self, descriptor: &TypeDescriptor) -> Result<TypeId, TypeError> {
        let unsupported = || TypeError::UnsupportedDescriptor {
            descriptor: descriptor.to_string(),
        };

        let id = match &descriptor.kind {
            TypeKind::Builtin { builtin, sub } => match (builtin, sub.as_slice()) {
                (BuiltinType::List, [item]) => {
                    let item = self.from_descriptor(item)?;
                    self.list_of(item)
                }
                (BuiltinType::Map, [key]) => {
                    let key = self.from_descriptor(key)?;
                    self.map_of(key, key)
                }
                (BuiltinType::Map, [key, value]) => {
                    let key = self.from_descriptor(key)?;
                    let value = self.from_descriptor(value)?;
                    self.map_of(key, value)
                }
                (BuiltinType::Hash, [named]) if matches!(named.kind, TypeKind::Named(_)) => {
                    self.from_descriptor(named)?
                }
                (BuiltinType::List | BuiltinType::Map, _) => return Err(unsupported()),
                (builtin, []) => self.builtin(*builtin),
                _ => return Err(unsupported()),
            },
            TypeKind::Named(name) => self.user_type(name),
            TypeKind::Function {
                returns,
                params,
                required,
                variadic,
            } => {
                let returns = self.from_descriptor(returns)?;
                let params = params
                    .iter()
                    .map(|param| self.from_descriptor(param))
                    .collect::<Result<Vec<_>, _>>()?;
                self.function_of(returns, params, *required, *variadic)
            }
        };

        Ok(if descriptor.is_const {
            self.make_const(id)
        } else {
            id
        })
    }

    /// Type equality. Functions must match exactly, everything else ignores
    /// constness. A missing right hand side never matches.
    pub fn compare(&self, left: TypeId, right: Option<TypeId>) -> bool {
        let Some(right) = right else {
            return false;
        };

        let (left, right) = (self.get(left), self.get(right));
        if left.is_function() || right.is_function() {
            left.id == right.id
        } else {
            left.clean_id == right.clean_id
        }
    }

    /// The builtin of a scalar type, as used by the operator and cast tables.
    pub fn scalar(&self, id: TypeId) -> Option<BuiltinType> {
        let identifier = self.get(id);
        match identifier.builtin {
            Some(BuiltinType::List | BuiltinType::Map) => None,
            builtin => builtin,
        }
    }

    /// Members of builtin types. Computed members derive their type from
    /// the base, e.g. `map[K,V].keys()` returns `list[K]`.
    pub fn member(&mut self, base: TypeId, property: &str) -> Option<TypeId> {
        let identifier = self.get(base);
        let builtin = identifier.builtin?;
        let sub = identifier.sub.clone();

        match (builtin, property) {
            (BuiltinType::String | BuiltinType::List | BuiltinType::Map, "length") => {
                Some(self.builtin(BuiltinType::Int))
            }
            (BuiltinType::String, "upper" | "lower") => {
                let string = self.builtin(BuiltinType::String);
                Some(self.function_of(string, vec![], 0, false))
            }
            (BuiltinType::Map, "keys" | "values") if sub.len() == 2 => {
                let item = if property == "keys" { sub[0] } else { sub[1] };
                let list = self.list_of(item);
                Some(self.function_of(list, vec![], 0, false))
            }
            _ => None,
        }
    }
}
