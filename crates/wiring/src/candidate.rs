// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use wiring_model::{BindingKey, ParamDecl, SourceLocation, TypeRef};

use crate::annotations::{indirection_of, qualifier_of};
use crate::{ResolverOptions, Result};

/// How an injection site or parameter wants its value delivered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Indirection {
    /// The value itself.
    #[default]
    None,

    /// A memoizing closure, evaluated on first access.
    Lazy,

    /// A factory closure, evaluated on every access.
    Provider,

    /// A weak reference to an eagerly built value.
    WeakRef,
}

impl Indirection {
    /// Whether the wrapped value is built after its dependent, which is what breaks cycles.
    #[must_use]
    pub const fn is_deferred(self) -> bool {
        matches!(self, Self::Lazy | Self::Provider)
    }

    const fn label(self) -> &'static str {
        match self {
            Self::None => "value",
            Self::Lazy => "lazy",
            Self::Provider => "provider",
            Self::WeakRef => "weak",
        }
    }
}

/// One value a candidate needs before it can be invoked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dependency {
    name: String,
    key: BindingKey,
    inner: BindingKey,
    indirection: Indirection,
    location: SourceLocation,
}

impl Dependency {
    /// A plain dependency on `key`.
    pub(crate) fn direct(name: impl Into<String>, key: BindingKey, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            inner: key.clone(),
            key,
            indirection: Indirection::None,
            location,
        }
    }

    /// Reads the binding key of a parameter from its declared type and annotations.
    pub(crate) fn from_param(
        param: &ParamDecl,
        bindings: &[(String, TypeRef)],
        options: &ResolverOptions,
        element: &str,
        location: &SourceLocation,
    ) -> Result<Self> {
        let qualifier = qualifier_of(&param.annotations, element, location)?;
        Self::of_type(&param.name, &param.ty.substitute(bindings), qualifier, options, element, location)
    }

    pub(crate) fn of_type(
        name: &str,
        ty: &TypeRef,
        qualifier: wiring_model::Qualifier,
        options: &ResolverOptions,
        element: &str,
        location: &SourceLocation,
    ) -> Result<Self> {
        let (indirection, inner) = indirection_of(ty, options, element, location)?;

        Ok(Self {
            name: name.to_owned(),
            key: BindingKey::new(ty.clone(), qualifier.clone()),
            inner: BindingKey::new(inner, qualifier),
            indirection,
            location: location.clone(),
        })
    }

    /// The parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key as requested, including any wrapper type.
    #[must_use]
    pub const fn key(&self) -> &BindingKey {
        &self.key
    }

    /// The key of the wrapped value; the same as [`key`][Self::key] without indirection.
    #[must_use]
    pub const fn inner_key(&self) -> &BindingKey {
        &self.inner
    }

    /// How the value is delivered.
    #[must_use]
    pub const fn indirection(&self) -> Indirection {
        self.indirection
    }

    /// Where the site or parameter is declared.
    #[must_use]
    pub const fn location(&self) -> &SourceLocation {
        &self.location
    }
}

/// How a provider method is invoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FactoryKind {
    /// A static method on the owner.
    Static,

    /// An instance method on the owner's singleton instance, which is the first input.
    Instance,

    /// An abstract method binding its return type to its single implementation parameter.
    Binds,
}

/// How generated code reads a field of the target or one of its ancestors.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldAccess {
    /// The field is visible and read as is.
    Direct,

    /// The field is private and read through the named getter.
    Getter(String),
}

/// One concrete way to produce a value for a binding key.
///
/// Candidates record the keys of their uninstantiated parameters; the graph builder expands
/// them depth-first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Candidate {
    /// Invoke a constructor of `ty`.
    ConstructorCall {
        /// The type constructed, with its arguments.
        ty: TypeRef,
        /// Constructor parameters, in order.
        params: Vec<Dependency>,
    },

    /// Invoke a provider method.
    FactoryMethod {
        /// The type declaring the provider.
        owner: TypeRef,
        /// The provider method name.
        method: String,
        /// How the method is invoked.
        kind: FactoryKind,
        /// Method parameters; an instance provider's receiver comes first.
        params: Vec<Dependency>,
    },

    /// Read the compilation-wide instance kept by the singleton holder of `cache_key`.
    SingletonRef {
        /// The candidate the holder runs.
        underlying: Box<Candidate>,
        /// The key identifying the holder.
        cache_key: BindingKey,
    },

    /// Reuse a `@LocalScope` field the target already holds.
    TargetField {
        /// The field name.
        field: String,
        /// The target or ancestor declaring the field.
        owner: TypeRef,
        /// How generated code reads it.
        access: FieldAccess,
    },

    /// Construct the default implementation of an abstract type.
    ImplementationOf {
        /// The `@Dependency` class constructed.
        concrete: TypeRef,
        /// Its constructor parameters, in order.
        params: Vec<Dependency>,
    },

    /// The injection target itself.
    TargetInstance {
        /// The target type.
        target: TypeRef,
    },

    /// Wrap another binding in a `Lazy`, `Provider` or weak reference.
    Indirect {
        /// The wrapper kind.
        indirection: Indirection,
        /// The wrapped key.
        key: BindingKey,
    },
}

impl Candidate {
    /// The parameters that must be resolved before this candidate can be invoked.
    ///
    /// Singleton references have none: their chain lives in the singleton holder.
    #[must_use]
    pub fn params(&self) -> &[Dependency] {
        match self {
            Self::ConstructorCall { params, .. } | Self::FactoryMethod { params, .. } | Self::ImplementationOf { params, .. } => {
                params
            }
            Self::SingletonRef { .. } | Self::TargetField { .. } | Self::TargetInstance { .. } | Self::Indirect { .. } => &[],
        }
    }

    /// Selection rank; lower wins.
    ///
    /// A type contributes at most one constructor candidate, chosen by `select_constructor`, so
    /// constructors share one rank.
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            Self::TargetField { .. } => 0,
            Self::FactoryMethod { .. } => 1,
            Self::ImplementationOf { .. } => 2,
            Self::ConstructorCall { .. } => 3,
            Self::SingletonRef { underlying, .. } => underlying.precedence(),
            Self::TargetInstance { .. } | Self::Indirect { .. } => 4,
        }
    }

    /// A short name for ambiguity diagnostics.
    #[must_use]
    pub fn competitor_name(&self) -> String {
        match self {
            Self::ConstructorCall { ty, .. } => ty.to_string(),
            Self::FactoryMethod { owner, method, .. } => format!("{owner}.{method}"),
            Self::SingletonRef { underlying, .. } => underlying.competitor_name(),
            Self::TargetField { field, owner, .. } => format!("{owner}.{field}"),
            Self::ImplementationOf { concrete, .. } => concrete.to_string(),
            Self::TargetInstance { target } => target.to_string(),
            Self::Indirect { key, .. } => key.to_string(),
        }
    }

    /// The singleton holder this candidate reads from, if any.
    #[must_use]
    pub fn singleton_key(&self) -> Option<&BindingKey> {
        match self {
            Self::SingletonRef { cache_key, .. } => Some(cache_key),
            _ => None,
        }
    }
}

struct Args<'a>(&'a [Dependency]);

impl fmt::Display for Args<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, dependency) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&dependency.name)?;
        }
        Ok(())
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConstructorCall { ty, params } => write!(f, "{ty}({})", Args(params)),
            Self::FactoryMethod { owner, method, kind, params } => match kind {
                FactoryKind::Instance => write!(f, "{owner}#{method}({})", Args(params.get(1..).unwrap_or_default())),
                FactoryKind::Static | FactoryKind::Binds => write!(f, "{owner}.{method}({})", Args(params)),
            },
            Self::SingletonRef { cache_key, .. } => write!(f, "singleton {cache_key}"),
            Self::TargetField { field, owner, access } => match access {
                FieldAccess::Direct => write!(f, "{owner}.{field}"),
                FieldAccess::Getter(getter) => write!(f, "{owner}.{getter}()"),
            },
            Self::ImplementationOf { concrete, params } => write!(f, "{concrete}({})", Args(params)),
            Self::TargetInstance { target } => write!(f, "this {target}"),
            Self::Indirect { indirection, key } => write!(f, "{} {key}", indirection.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use wiring_model::Annotation;

    use super::*;

    fn dependency(name: &str, ty: &str) -> Dependency {
        Dependency::direct(name, BindingKey::unqualified(ty), SourceLocation::default())
    }

    #[test]
    fn param_with_wrapper_and_qualifier() {
        let param = ParamDecl::new("later", TypeRef::new("Lazy").with_args([TypeRef::new("T")])).annotated(Annotation::named("x"));
        let bindings = [("T".to_owned(), TypeRef::new("a.Api"))];

        let dependency =
            Dependency::from_param(&param, &bindings, &ResolverOptions::default(), "parameter `later`", &SourceLocation::default())
                .unwrap();

        assert_eq!(dependency.indirection(), Indirection::Lazy);
        assert_eq!(dependency.inner_key(), &BindingKey::named("a.Api", "x"));
        assert_eq!(
            dependency.key(),
            &BindingKey::named(TypeRef::new("Lazy").with_args([TypeRef::new("a.Api")]), "x")
        );
    }

    #[test]
    fn precedence_order() {
        let field = Candidate::TargetField {
            field: "cache".to_owned(),
            owner: TypeRef::new("a.Main"),
            access: FieldAccess::Direct,
        };
        let factory = Candidate::FactoryMethod {
            owner: TypeRef::new("a.Module"),
            method: "cache".to_owned(),
            kind: FactoryKind::Static,
            params: Vec::new(),
        };
        let implementation = Candidate::ImplementationOf {
            concrete: TypeRef::new("a.LruCache"),
            params: Vec::new(),
        };
        let with_params = Candidate::ConstructorCall {
            ty: TypeRef::new("a.Cache"),
            params: vec![dependency("size", "a.Size")],
        };
        let no_arg = Candidate::ConstructorCall {
            ty: TypeRef::new("a.Cache"),
            params: Vec::new(),
        };

        let ranks: Vec<_> = [&field, &factory, &implementation, &with_params]
            .iter()
            .map(|candidate| candidate.precedence())
            .collect();

        assert!(ranks.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(with_params.precedence(), no_arg.precedence());
        assert_eq!(
            Candidate::SingletonRef {
                underlying: Box::new(factory.clone()),
                cache_key: BindingKey::unqualified("a.Cache"),
            }
            .precedence(),
            factory.precedence()
        );
    }

    #[test]
    fn rendering() {
        let instance = Candidate::FactoryMethod {
            owner: TypeRef::new("a.Module"),
            method: "api".to_owned(),
            kind: FactoryKind::Instance,
            params: vec![dependency("this", "a.Module"), dependency("client", "a.Client")],
        };
        let getter = Candidate::TargetField {
            field: "cache".to_owned(),
            owner: TypeRef::new("a.Base"),
            access: FieldAccess::Getter("getCache".to_owned()),
        };
        let lazy = Candidate::Indirect {
            indirection: Indirection::Lazy,
            key: BindingKey::unqualified("a.Api"),
        };

        assert_eq!(instance.to_string(), "a.Module#api(client)");
        assert_eq!(instance.competitor_name(), "a.Module.api");
        assert_eq!(getter.to_string(), "a.Base.getCache()");
        assert_eq!(lazy.to_string(), "lazy a.Api");
        assert_eq!(instance.params().len(), 2);
        assert!(lazy.params().is_empty());
    }
}
