// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Write;

use wiring_model::{BindingKey, SourceLocation, TypeRef};

/// The result for fallible resolution operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A structurally unsatisfiable part of the dependency graph, with the source location to blame.
///
/// Resolution is deterministic: an error always requires a source change, never a retry. Errors
/// of one injection target never prevent the resolution of other targets.
///
/// # Examples
///
/// ```
/// use wiring::{ErrorKind, Resolver};
/// use wiring_model::{FieldDecl, Annotation, SymbolTable, TypeDecl};
///
/// let model = SymbolTable::from_types([
///     TypeDecl::interface("a.DependencyModel"),
///     TypeDecl::class("a.Target").with_field(FieldDecl::new("model", "a.DependencyModel").annotated(Annotation::Inject)),
/// ])?;
///
/// let compilation = Resolver::new(&model).resolve_all();
/// let error = &compilation.failures()[0].errors()[0];
///
/// assert!(matches!(error.kind(), ErrorKind::NoCandidateFound { .. }));
/// assert_eq!(error.to_string(), "no binding found for `a.DependencyModel` required by field `model` of `a.Target`");
/// # Ok::<(), wiring_model::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    kind: ErrorKind,
    location: SourceLocation,
}

/// What went wrong, with the details needed to render a literal diagnostic message.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// No constructible or providable binding exists for a required key.
    #[error("no binding found for `{key}` required by {requester}{}", reason_suffix(.reason.as_deref()))]
    NoCandidateFound {
        /// The key nothing binds.
        key: BindingKey,
        /// The site or parameter that needs it, already described.
        requester: String,
        /// Why the obvious candidate was rejected, if there was one.
        reason: Option<String>,
    },

    /// More than one equally eligible binding exists.
    #[error("ambiguous binding for `{key}`: {}", .competitors.join(", "))]
    AmbiguousBinding {
        /// The key with too many bindings.
        key: BindingKey,
        /// Short names of the tied candidates, in discovery order.
        competitors: Vec<String>,
    },

    /// An injectable constructor has a parameter the resolver cannot bind.
    #[error("constructor of `{ty}` has unsupported parameter `{parameter}` of type `{parameter_type}`")]
    UnsupportedConstructorParameters {
        /// The type whose constructor was selected.
        ty: TypeRef,
        /// The parameter name.
        parameter: String,
        /// The parameter's declared type.
        parameter_type: TypeRef,
    },

    /// An injection site is private and has no accessor the generated injector could use.
    #[error("injection site `{member}` on `{owner}` is private and has no accessible {accessor}")]
    InaccessibleInjectionSite {
        /// The type declaring the member.
        owner: TypeRef,
        /// The field or method name.
        member: String,
        /// `"setter"` for sites the injector writes, `"getter"` for fields it reads.
        accessor: &'static str,
    },

    /// Contradictory scope, qualifier or provider annotations on one element.
    #[error("conflicting annotations on {element}: {detail}")]
    ConflictingAnnotation {
        /// The annotated element, already described.
        element: String,
        /// What conflicts.
        detail: String,
    },

    /// A cycle that neither target substitution nor `Lazy`/`Provider` indirection breaks.
    #[error("circular dependency: {}", render_path(.path))]
    CircularDependency {
        /// The keys on the cycle; the first key is repeated at the end.
        path: Vec<BindingKey>,
    },

    /// A provider method whose shape cannot be bound.
    #[error("invalid provider `{owner}.{method}`: {detail}")]
    InvalidProviderShape {
        /// The type declaring the provider.
        owner: TypeRef,
        /// The provider method name.
        method: String,
        /// What is wrong with its shape.
        detail: String,
    },

    /// The dependency chain below one key is deeper than the configured limit.
    #[error("resolution of `{key}` exceeded the maximum depth of {max_depth}")]
    ResolutionTooDeep {
        /// The key whose construction would exceed the limit.
        key: BindingKey,
        /// The configured limit.
        max_depth: usize,
    },

    /// A declaration the resolver cannot interpret, such as a wrapper type without its argument.
    #[error("invalid declaration of {element}: {detail}")]
    InvalidModel {
        /// The offending element, already described.
        element: String,
        /// What cannot be interpreted.
        detail: String,
    },
}

impl Error {
    pub(crate) const fn new(kind: ErrorKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }

    /// What went wrong.
    #[must_use]
    pub const fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Where in source the problem must be fixed.
    #[must_use]
    pub const fn location(&self) -> &SourceLocation {
        &self.location
    }
}

fn reason_suffix(reason: Option<&str>) -> String {
    reason.map_or_else(String::new, |reason| format!(" ({reason})"))
}

fn render_path(path: &[BindingKey]) -> String {
    let mut rendered = String::new();
    for (index, key) in path.iter().enumerate() {
        if index > 0 {
            rendered.push_str(" -> ");
        }
        let _ = write!(rendered, "{key}");
    }
    rendered
}
