// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::{HashMap, HashSet};

use tracing::{Level, event};
use wiring_model::{Annotated, Annotation, BindingKey, DeclarationModel, Qualifier, SourceLocation, TypeDecl, TypeRef, Visibility};

use crate::annotations::{conflict, qualifier_of, scope_of};
use crate::finder::{constructor_params, provider_candidate, select_constructor};
use crate::{Candidate, Diagnostic, Error, ErrorKind, ResolverOptions, Severity};

/// A `@Singleton` binding: the candidate that builds the one instance of a type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingletonEntry {
    key: BindingKey,
    candidate: Candidate,
    declared_in: TypeRef,
    location: SourceLocation,
}

impl SingletonEntry {
    /// The type the holder caches.
    #[must_use]
    pub const fn ty(&self) -> &TypeRef {
        &self.key.ty
    }

    /// The qualifier the singleton is bound under.
    #[must_use]
    pub const fn qualifier(&self) -> &Qualifier {
        &self.key.qualifier
    }

    /// How the instance is built: a constructor call or a provider method.
    #[must_use]
    pub const fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    /// The type carrying the `@Singleton` annotation; its package hosts the holder.
    #[must_use]
    pub const fn declared_in(&self) -> &TypeRef {
        &self.declared_in
    }

    /// Where the `@Singleton` annotation was found.
    #[must_use]
    pub const fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// The key the holder resolves and is identified by.
    #[must_use]
    pub const fn key(&self) -> &BindingKey {
        &self.key
    }
}

/// Every singleton of a compilation, keyed by binding key.
///
/// Generic classes are registered under their erased type, so `Repo<User>` finds the
/// `Repo` registration. The registry is written once by the scan pass and is read-only afterwards; resolution
/// sessions share one snapshot.
#[derive(Clone, Debug, Default)]
pub struct SingletonRegistry {
    entries: Vec<SingletonEntry>,
    by_key: HashMap<BindingKey, usize>,
}

impl SingletonRegistry {
    /// The singleton bound to `key`, falling back to the erased type for parameterized keys.
    #[must_use]
    pub fn get(&self, key: &BindingKey) -> Option<&SingletonEntry> {
        self.by_key
            .get(key)
            .or_else(|| {
                if key.ty.args().is_empty() {
                    None
                } else {
                    self.by_key.get(&key.with_type(key.ty.erasure()))
                }
            })
            .map(|&index| &self.entries[index])
    }

    /// Whether `key` is a singleton.
    #[must_use]
    pub fn contains(&self, key: &BindingKey) -> bool {
        self.get(key).is_some()
    }

    /// All singletons in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[SingletonEntry] {
        &self.entries
    }

    /// Number of registered singletons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no singleton is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What the scan pass learned besides the registry itself.
#[derive(Debug, Default)]
pub(crate) struct Scan {
    pub registry: SingletonRegistry,
    pub errors: Vec<(TypeRef, Error)>,
    pub warnings: Vec<Diagnostic>,
}

/// The single write phase: registers singletons and validates every provider method.
pub(crate) fn scan<M: DeclarationModel + ?Sized>(model: &M, options: &ResolverOptions) -> Scan {
    let mut scan = Scan::default();
    let mut entries: Vec<SingletonEntry> = Vec::new();

    for decl in model.types() {
        if decl.has_annotation(&Annotation::Singleton) {
            match singleton_class(model, decl, options) {
                Ok(entry) => entries.push(entry),
                Err(error) => scan.errors.push((decl.ty.clone(), error)),
            }
        }

        for method in decl.methods.iter().filter(|method| method.has_annotation(&Annotation::Provides)) {
            if method.visibility == Visibility::Private {
                scan.warnings.push(
                    Diagnostic::new(
                        Severity::Warning,
                        method.location.clone(),
                        format!("provider `{}.{}` is private and is ignored", decl.ty, method.name),
                    )
                    .with_subject(decl.ty.clone()),
                );
                continue;
            }

            let element = format!("provider `{}.{}`", decl.ty, method.name);
            let provider = provider_candidate(model, decl, method, options).and_then(|candidate| {
                let qualifier = qualifier_of(&method.annotations, &element, &method.location)?;
                scope_of(&method.annotations, &element, &method.location)?;
                Ok((candidate, qualifier))
            });

            match provider {
                Ok((candidate, qualifier)) if method.has_annotation(&Annotation::Singleton) => {
                    if let Some(ty) = method.return_type.clone() {
                        entries.push(SingletonEntry {
                            key: BindingKey::new(ty, qualifier),
                            candidate,
                            declared_in: decl.ty.clone(),
                            location: method.location.clone(),
                        });
                    }
                }
                Ok(_) => {}
                Err(error) => scan.errors.push((decl.ty.clone(), error)),
            }
        }
    }

    let (registry, duplicates) = index(entries);
    scan.registry = registry;
    scan.errors.extend(duplicates);

    event!(
        Level::DEBUG,
        message = "singleton registry populated",
        singletons = scan.registry.len(),
        errors = scan.errors.len()
    );

    scan
}

fn singleton_class<M: DeclarationModel + ?Sized>(model: &M, decl: &TypeDecl, options: &ResolverOptions) -> Result<SingletonEntry, Error> {
    let element = format!("`{}`", decl.ty);

    if model.is_abstract(&decl.ty) {
        return Err(conflict(&element, "@Singleton requires a concrete class", &decl.location));
    }

    scope_of(&decl.annotations, &element, &decl.location)?;
    let qualifier = qualifier_of(&decl.annotations, &element, &decl.location)?;

    let Some(constructor) = select_constructor(decl, decl.package())? else {
        return Err(Error::new(
            ErrorKind::NoCandidateFound {
                key: BindingKey::new(decl.ty.clone(), qualifier),
                requester: format!("singleton `{}`", decl.ty),
                reason: Some(format!("`{}` has no usable constructor", decl.ty)),
            },
            decl.location.clone(),
        ));
    };

    Ok(SingletonEntry {
        key: BindingKey::new(decl.ty.clone(), qualifier),
        candidate: Candidate::ConstructorCall {
            ty: decl.ty.clone(),
            params: constructor_params(decl, constructor, &decl.ty, options)?,
        },
        declared_in: decl.ty.clone(),
        location: decl.location.clone(),
    })
}

/// Builds the lookup; a key registered twice is ambiguous and neither registration is kept.
fn index(entries: Vec<SingletonEntry>) -> (SingletonRegistry, Vec<(TypeRef, Error)>) {
    let mut first_seen: HashMap<&BindingKey, usize> = HashMap::new();
    let mut poisoned: HashSet<usize> = HashSet::new();
    let mut errors = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        if let Some(&first) = first_seen.get(&entry.key) {
            poisoned.insert(first);
            poisoned.insert(index);
            errors.push((
                entry.declared_in.clone(),
                Error::new(
                    ErrorKind::AmbiguousBinding {
                        key: entry.key.clone(),
                        competitors: vec![entries[first].candidate.competitor_name(), entry.candidate.competitor_name()],
                    },
                    entry.location.clone(),
                ),
            ));
        } else {
            first_seen.insert(&entry.key, index);
        }
    }

    let kept: Vec<SingletonEntry> = entries
        .iter()
        .enumerate()
        .filter(|(index, _)| !poisoned.contains(index))
        .map(|(_, entry)| entry.clone())
        .collect();

    let by_key = kept.iter().enumerate().map(|(index, entry)| (entry.key.clone(), index)).collect();

    (SingletonRegistry { entries: kept, by_key }, errors)
}

#[cfg(test)]
mod tests {
    use wiring_model::{ConstructorDecl, MethodDecl, SymbolTable};

    use super::*;

    #[test]
    fn classes_and_providers_are_registered() {
        let model = SymbolTable::from_types([
            TypeDecl::class("a.Clock").annotated(Annotation::Singleton).with_constructor(ConstructorDecl::new()),
            TypeDecl::class("a.Module").with_method(
                MethodDecl::new("client")
                    .returning("a.Client")
                    .with_static(true)
                    .annotated(Annotation::Provides)
                    .annotated(Annotation::Singleton)
                    .annotated(Annotation::named("http")),
            ),
        ])
        .unwrap();

        let scan = scan(&model, &ResolverOptions::default());

        assert!(scan.errors.is_empty());
        assert_eq!(scan.registry.len(), 2);
        assert!(scan.registry.contains(&BindingKey::unqualified("a.Clock")));
        assert!(!scan.registry.contains(&BindingKey::unqualified("a.Client")));

        let client = scan.registry.get(&BindingKey::named("a.Client", "http")).unwrap();
        assert_eq!(client.qualifier(), &Qualifier::named("http"));
        assert_eq!(client.declared_in(), &TypeRef::new("a.Module"));
        assert_eq!(client.candidate().to_string(), "a.Module.client()");
    }

    #[test]
    fn duplicates_poison_both_registrations() {
        let model = SymbolTable::from_types([
            TypeDecl::class("a.Clock").annotated(Annotation::Singleton).with_constructor(ConstructorDecl::new()),
            TypeDecl::class("a.Module").with_method(
                MethodDecl::new("clock")
                    .returning("a.Clock")
                    .with_static(true)
                    .annotated(Annotation::Provides)
                    .annotated(Annotation::Singleton),
            ),
        ])
        .unwrap();

        let scan = scan(&model, &ResolverOptions::default());

        assert!(scan.registry.is_empty());
        assert_eq!(scan.errors.len(), 1);
        assert_eq!(scan.errors[0].1.to_string(), "ambiguous binding for `a.Clock`: a.Clock, a.Module.clock");
    }

    #[test]
    fn qualified_providers_of_one_type_are_distinct() {
        let provider = |name: &str| {
            MethodDecl::new(name)
                .returning("a.Exec")
                .with_static(true)
                .annotated(Annotation::Provides)
                .annotated(Annotation::Singleton)
                .annotated(Annotation::named(name))
        };
        let model =
            SymbolTable::from_types([TypeDecl::class("a.Module").with_method(provider("io")).with_method(provider("cpu"))]).unwrap();

        let scan = scan(&model, &ResolverOptions::default());

        assert!(scan.errors.is_empty());
        assert_eq!(scan.registry.len(), 2);
        assert_eq!(
            scan.registry.get(&BindingKey::named("a.Exec", "cpu")).unwrap().candidate().to_string(),
            "a.Module.cpu()"
        );
        assert!(scan.registry.get(&BindingKey::unqualified("a.Exec")).is_none());
    }

    #[test]
    fn generic_class_is_found_through_its_erasure() {
        let model = SymbolTable::from_types([TypeDecl::class("a.Repo")
            .with_type_param("T")
            .annotated(Annotation::Singleton)
            .with_constructor(ConstructorDecl::new())])
        .unwrap();

        let scan = scan(&model, &ResolverOptions::default());
        let parameterized = BindingKey::unqualified(TypeRef::new("a.Repo").with_args([TypeRef::new("a.User")]));

        assert_eq!(scan.registry.get(&parameterized).unwrap().ty(), &TypeRef::new("a.Repo"));
        assert!(!scan.registry.contains(&BindingKey::named(TypeRef::new("a.Repo").with_args([TypeRef::new("a.User")]), "x")));
    }

    #[test]
    fn abstract_singleton_conflicts() {
        let model = SymbolTable::from_types([TypeDecl::interface("a.Api").annotated(Annotation::Singleton)]).unwrap();

        let scan = scan(&model, &ResolverOptions::default());

        assert_eq!(
            scan.errors[0].1.to_string(),
            "conflicting annotations on `a.Api`: @Singleton requires a concrete class"
        );
    }

    #[test]
    fn private_providers_only_warn() {
        let model = SymbolTable::from_types([TypeDecl::class("a.Module").with_method(
            MethodDecl::new("api")
                .returning("a.Api")
                .with_visibility(Visibility::Private)
                .annotated(Annotation::Provides),
        )])
        .unwrap();

        let scan = scan(&model, &ResolverOptions::default());

        assert!(scan.errors.is_empty());
        assert_eq!(scan.warnings.len(), 1);
        assert_eq!(scan.warnings[0].severity(), Severity::Warning);
        assert_eq!(scan.warnings[0].message(), "provider `a.Module.api` is private and is ignored");
    }

    #[test]
    fn malformed_providers_are_errors() {
        let model = SymbolTable::from_types([TypeDecl::class("a.Module")
            .with_method(MethodDecl::new("api").returning("a.Api").annotated(Annotation::Provides))])
        .unwrap();

        let scan = scan(&model, &ResolverOptions::default());

        assert_eq!(scan.errors.len(), 1);
        assert_eq!(scan.errors[0].0, TypeRef::new("a.Module"));
        assert!(matches!(scan.errors[0].1.kind(), ErrorKind::InvalidProviderShape { .. }));
    }
}
