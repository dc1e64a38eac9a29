// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Interpretation of the injection annotations on one element.

use wiring_model::{Annotation, Qualifier, Scope, SourceLocation, TypeRef};

use crate::{Error, ErrorKind, Indirection, ResolverOptions, Result};

/// The qualifier an element carries.
///
/// A qualifier annotation without a value, or with an empty value, is the same as no qualifier.
///
/// # Errors
///
/// Returns [`ErrorKind::ConflictingAnnotation`] when the element carries two qualifier
/// annotations, even if they agree.
pub fn qualifier_of(annotations: &[Annotation], element: &str, location: &SourceLocation) -> Result<Qualifier> {
    let mut qualifiers = annotations.iter().filter(|annotation| annotation.is_qualifier());

    let Some(first) = qualifiers.next() else {
        return Ok(Qualifier::Default);
    };

    if let Some(second) = qualifiers.next() {
        return Err(conflict(
            element,
            format!("{} and {} both qualify the binding", first.display_name(), second.display_name()),
            location,
        ));
    }

    Ok(match first {
        Annotation::Named(Some(value)) | Annotation::Qualifier(Some(value)) => Qualifier::named(value.as_str()),
        _ => Qualifier::Default,
    })
}

/// The scope an element declares.
///
/// # Errors
///
/// Returns [`ErrorKind::ConflictingAnnotation`] when the element is both `@Singleton` and
/// `@LocalScope`.
pub fn scope_of(annotations: &[Annotation], element: &str, location: &SourceLocation) -> Result<Scope> {
    let singleton = annotations.contains(&Annotation::Singleton);
    let local = annotations.contains(&Annotation::LocalScope);

    match (singleton, local) {
        (true, true) => Err(conflict(element, "@Singleton and @LocalScope are mutually exclusive", location)),
        (true, false) => Ok(Scope::Singleton),
        (false, true) => Ok(Scope::LocalScope),
        (false, false) => Ok(Scope::None),
    }
}

/// Splits a requested type into its wrapper kind and the type that is actually resolved.
///
/// Types that are not wrappers come back unchanged with [`Indirection::None`].
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidModel`] when a wrapper does not carry exactly one type argument.
pub fn indirection_of(
    ty: &TypeRef,
    options: &ResolverOptions,
    element: &str,
    location: &SourceLocation,
) -> Result<(Indirection, TypeRef)> {
    let Some(indirection) = options.indirection_for(ty.name()) else {
        return Ok((Indirection::None, ty.clone()));
    };

    match ty.args() {
        [inner] => Ok((indirection, inner.clone())),
        _ => Err(Error::new(
            ErrorKind::InvalidModel {
                element: element.to_owned(),
                detail: format!("`{}` needs exactly one type argument", ty.simple_name()),
            },
            location.clone(),
        )),
    }
}

pub(crate) fn conflict(element: &str, detail: impl Into<String>, location: &SourceLocation) -> Error {
    Error::new(
        ErrorKind::ConflictingAnnotation {
            element: element.to_owned(),
            detail: detail.into(),
        },
        location.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ELEMENT: &str = "field `api` of `a.Main`";

    fn here() -> SourceLocation {
        SourceLocation::new("Main.java", 4, 5)
    }

    #[test]
    fn qualifier_absent_or_empty_is_default() {
        assert_eq!(qualifier_of(&[], ELEMENT, &here()).unwrap(), Qualifier::Default);
        assert_eq!(qualifier_of(&[Annotation::Named(None)], ELEMENT, &here()).unwrap(), Qualifier::Default);
        assert_eq!(qualifier_of(&[Annotation::named("")], ELEMENT, &here()).unwrap(), Qualifier::Default);
        assert_eq!(qualifier_of(&[Annotation::Qualifier(None)], ELEMENT, &here()).unwrap(), Qualifier::Default);
    }

    #[test]
    fn qualifier_value() {
        let annotations = [Annotation::Inject, Annotation::Qualifier(Some("release".to_owned()))];

        assert_eq!(qualifier_of(&annotations, ELEMENT, &here()).unwrap(), Qualifier::named("release"));
    }

    #[test]
    fn two_qualifiers_conflict() {
        let annotations = [Annotation::named("debug"), Annotation::Qualifier(Some("debug".to_owned()))];

        let error = qualifier_of(&annotations, ELEMENT, &here()).unwrap_err();

        assert_eq!(
            error.to_string(),
            "conflicting annotations on field `api` of `a.Main`: @Named and @Qualifier both qualify the binding"
        );
        assert_eq!(error.location(), &here());
    }

    #[test]
    fn scopes() {
        assert_eq!(scope_of(&[], ELEMENT, &here()).unwrap(), Scope::None);
        assert_eq!(scope_of(&[Annotation::Singleton], ELEMENT, &here()).unwrap(), Scope::Singleton);
        assert_eq!(scope_of(&[Annotation::LocalScope], ELEMENT, &here()).unwrap(), Scope::LocalScope);

        let error = scope_of(&[Annotation::Singleton, Annotation::LocalScope], ELEMENT, &here()).unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::ConflictingAnnotation { .. }));
    }

    #[test]
    fn wrappers() {
        let options = ResolverOptions::default();
        let lazy = TypeRef::new("dagger.Lazy").with_args([TypeRef::new("a.Api")]);

        assert_eq!(
            indirection_of(&lazy, &options, ELEMENT, &here()).unwrap(),
            (Indirection::Lazy, TypeRef::new("a.Api"))
        );
        assert_eq!(
            indirection_of(&TypeRef::new("a.Api"), &options, ELEMENT, &here()).unwrap(),
            (Indirection::None, TypeRef::new("a.Api"))
        );

        let error = indirection_of(&TypeRef::new("Provider"), &options, ELEMENT, &here()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid declaration of field `api` of `a.Main`: `Provider` needs exactly one type argument"
        );
    }
}
