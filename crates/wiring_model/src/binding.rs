// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use crate::TypeRef;

/// Distinguishes bindings of the same type.
///
/// A qualifier annotation without a value (or with an empty one) means [`Qualifier::Default`].
/// Matching is exact and case-sensitive: `Default` only ever matches `Default`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Qualifier {
    /// No qualifier.
    #[default]
    Default,

    /// A `@Named("…")` style qualifier.
    Named(String),
}

impl Qualifier {
    /// Creates a named qualifier, normalizing an empty name to [`Qualifier::Default`].
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.is_empty() { Self::Default } else { Self::Named(name) }
    }

    /// Whether this is [`Qualifier::Default`].
    #[must_use]
    pub const fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("@Default"),
            Self::Named(name) => write!(f, "@Named(\"{name}\")"),
        }
    }
}

/// Lifetime policy of a binding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scope {
    /// A fresh instance for every injection target.
    #[default]
    None,

    /// One instance per compilation, held by a generated singleton holder.
    Singleton,

    /// One instance per injection target, reused from a field the target holds.
    LocalScope,
}

/// The `(type, qualifier)` pair identifying what is being resolved.
///
/// This is the key for all candidate search and caching.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BindingKey {
    /// The requested type.
    pub ty: TypeRef,

    /// The requested qualifier.
    #[cfg_attr(feature = "serde", serde(default))]
    pub qualifier: Qualifier,
}

impl BindingKey {
    /// Creates a key from a type and a qualifier.
    #[must_use]
    pub fn new(ty: impl Into<TypeRef>, qualifier: Qualifier) -> Self {
        Self {
            ty: ty.into(),
            qualifier,
        }
    }

    /// Creates a key with [`Qualifier::Default`].
    #[must_use]
    pub fn unqualified(ty: impl Into<TypeRef>) -> Self {
        Self::new(ty, Qualifier::Default)
    }

    /// Creates a key with a named qualifier.
    #[must_use]
    pub fn named(ty: impl Into<TypeRef>, name: impl Into<String>) -> Self {
        Self::new(ty, Qualifier::named(name))
    }

    /// The same qualifier applied to a different type.
    #[must_use]
    pub fn with_type(&self, ty: TypeRef) -> Self {
        Self {
            ty,
            qualifier: self.qualifier.clone(),
        }
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Qualifier::Default => write!(f, "{}", self.ty),
            named @ Qualifier::Named(_) => write!(f, "{named} {}", self.ty),
        }
    }
}
