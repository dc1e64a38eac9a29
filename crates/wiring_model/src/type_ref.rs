// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "Boolean", "Byte", "Char", "Short", "Int", "Long",
    "Float", "Double",
];

/// A resolved type identity: a qualified name plus its generic type arguments.
///
/// The "is interface/abstract" marker is carried along for front ends that know it up front,
/// but it does not participate in identity. Two `TypeRef`s are equal iff their qualified names
/// and generic arguments match structurally.
///
/// # Examples
///
/// ```
/// use wiring_model::TypeRef;
///
/// let list = TypeRef::new("java.util.List").with_args([TypeRef::new("com.example.User")]);
///
/// assert_eq!(list.to_string(), "java.util.List<com.example.User>");
/// assert_eq!(list.package(), "java.util");
/// assert_eq!(list.simple_name(), "List");
/// assert_eq!(list, TypeRef::new("java.util.List").with_args([TypeRef::new("com.example.User")]).with_abstract(true));
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeRef {
    name: String,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    args: Vec<TypeRef>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "std::ops::Not::not"))]
    is_abstract: bool,
}

impl TypeRef {
    /// Creates a non-generic type reference from its qualified name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            is_abstract: false,
        }
    }

    /// Replaces the generic type arguments.
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = Self>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    /// Sets the interface/abstract marker.
    #[must_use]
    pub const fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    /// The fully qualified name, without generic arguments.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The generic type arguments, in declaration order.
    #[must_use]
    pub fn args(&self) -> &[Self] {
        &self.args
    }

    /// Whether the front end marked this reference as an interface or abstract class.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// The package part of the qualified name; empty for the default package.
    #[must_use]
    pub fn package(&self) -> &str {
        self.name.rfind('.').map_or("", |dot| &self.name[..dot])
    }

    /// The last segment of the qualified name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.rfind('.').map_or(self.name.as_str(), |dot| &self.name[dot + 1..])
    }

    /// Whether this is a primitive value type that can never be constructed, only provided.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.args.is_empty() && PRIMITIVES.contains(&self.name.as_str())
    }

    /// The same type without generic arguments.
    #[must_use]
    pub fn erasure(&self) -> Self {
        Self {
            name: self.name.clone(),
            args: Vec::new(),
            is_abstract: self.is_abstract,
        }
    }

    /// Replaces type variables by the types bound to them.
    ///
    /// A type variable is a reference without arguments whose name appears in `bindings`.
    #[must_use]
    pub fn substitute(&self, bindings: &[(String, Self)]) -> Self {
        if self.args.is_empty() {
            if let Some((_, bound)) = bindings.iter().find(|(variable, _)| *variable == self.name) {
                return bound.clone();
            }
        }

        Self {
            name: self.name.clone(),
            args: self.args.iter().map(|arg| arg.substitute(bindings)).collect(),
            is_abstract: self.is_abstract,
        }
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.args == other.args
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.args.hash(state);
    }
}

impl PartialOrd for TypeRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name).then_with(|| self.args.cmp(&other.args))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;

        if let Some((first, rest)) = self.args.split_first() {
            write!(f, "<{first}")?;
            for arg in rest {
                write!(f, ", {arg}")?;
            }
            f.write_str(">")?;
        }

        Ok(())
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
