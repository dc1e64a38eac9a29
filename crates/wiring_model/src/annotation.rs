// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// An annotation attached to a declaration, as reported by the front end.
///
/// Only the injection markers the resolver understands get their own variant; anything else is
/// carried as [`Annotation::Other`] so that element annotation lists stay complete.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Annotation {
    /// Marks an injection point: a field, setter method or constructor.
    Inject,

    /// `@Named(value)` qualifier.
    Named(Option<String>),

    /// A custom qualifier annotation carrying an optional value.
    Qualifier(Option<String>),

    /// One instance per compilation.
    Singleton,

    /// One instance per injection target, reused from the target's field.
    LocalScope,

    /// Marks a provider (module/factory) method.
    Provides,

    /// Marks an implementation as the default binding of its supertypes.
    Dependency,

    /// Any other annotation, by qualified name.
    Other(String),
}

impl Annotation {
    /// `@Named("value")`.
    #[must_use]
    pub fn named(value: impl Into<String>) -> Self {
        Self::Named(Some(value.into()))
    }

    /// Whether the annotation carries a qualifier.
    #[must_use]
    pub const fn is_qualifier(&self) -> bool {
        matches!(self, Self::Named(_) | Self::Qualifier(_))
    }

    /// The annotation name as it appears in source, used in diagnostics.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Inject => "@Inject",
            Self::Named(_) => "@Named",
            Self::Qualifier(_) => "@Qualifier",
            Self::Singleton => "@Singleton",
            Self::LocalScope => "@LocalScope",
            Self::Provides => "@Provides",
            Self::Dependency => "@Dependency",
            Self::Other(name) => name,
        }
    }
}

/// Helpers over an element's annotation list.
pub trait Annotated {
    /// All annotations on the element, in source order.
    fn annotations(&self) -> &[Annotation];

    /// Whether the element carries the given annotation.
    fn has_annotation(&self, annotation: &Annotation) -> bool {
        self.annotations().contains(annotation)
    }
}

impl Annotated for [Annotation] {
    fn annotations(&self) -> &[Annotation] {
        self
    }
}
