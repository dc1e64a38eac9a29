// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use tracing::{Level, event};
use wiring_model::{
    Annotated, Annotation, BindingKey, ConstructorDecl, DeclarationModel, MethodDecl, Qualifier, TypeDecl, TypeRef, Visibility,
};

use crate::annotations::{conflict, qualifier_of};
use crate::target::inaccessible;
use crate::{Candidate, Dependency, Error, ErrorKind, FactoryKind, FieldAccess, ResolverOptions, Result, SingletonRegistry, Target};

/// Everything the finder produced for one key.
#[derive(Debug, Default)]
pub(crate) struct Found {
    pub candidates: Vec<Candidate>,

    /// Set when the key is a declared concrete type without a usable constructor.
    pub unconstructible: Option<TypeRef>,
}

/// Collects every candidate binding for a key, in a fixed search order.
///
/// The finder never picks a winner; that is the selector's job. It only filters what cannot
/// possibly apply: mismatched qualifiers, invisible members, malformed providers.
#[derive(Debug)]
pub(crate) struct Finder<'a, M: ?Sized> {
    model: &'a M,
    registry: &'a SingletonRegistry,
    options: &'a ResolverOptions,

    /// Package the generated code lives in; visibility is judged from here.
    package: &'a str,
    target: Option<&'a Target>,
}

impl<'a, M: DeclarationModel + ?Sized> Finder<'a, M> {
    pub(crate) const fn new(
        model: &'a M,
        registry: &'a SingletonRegistry,
        options: &'a ResolverOptions,
        package: &'a str,
        target: Option<&'a Target>,
    ) -> Self {
        Self {
            model,
            registry,
            options,
            package,
            target,
        }
    }

    pub(crate) fn find(&self, key: &BindingKey) -> Result<Found> {
        let mut found = Found::default();

        if let Some(target) = self.target {
            found.candidates.extend(self.target_fields(target, key)?);
        }

        found.candidates.extend(self.providers(key));

        let singleton = self.registry.get(key);
        if let Some(entry) = singleton {
            if !found.candidates.contains(entry.candidate()) {
                found.candidates.push(entry.candidate().clone());
            }
        }

        if self.model.is_abstract(&key.ty) {
            found.candidates.extend(self.implementations(key)?);
        } else if singleton.is_none() {
            match self.constructor(key)? {
                Some(candidate) => found.candidates.push(candidate),
                None if found.candidates.is_empty() && self.declares_class_for(key) => {
                    found.unconstructible = Some(key.ty.clone());
                }
                None => {}
            }
        }

        event!(
            Level::TRACE,
            message = "candidates found",
            key = %key,
            count = found.candidates.len()
        );

        Ok(found)
    }

    /// Whether `key` names a declared class bound under the key's own qualifier.
    fn declares_class_for(&self, key: &BindingKey) -> bool {
        self.model
            .type_decl(&key.ty)
            .is_some_and(|decl| class_qualifier(decl).is_ok_and(|qualifier| qualifier == key.qualifier))
    }

    /// `@LocalScope` fields of the target or its ancestors; only the nearest level that has any counts.
    ///
    /// A matching field the generated code can neither read nor reach through a getter is an
    /// error rather than a miss.
    fn target_fields(&self, target: &Target, key: &BindingKey) -> Result<Vec<Candidate>> {
        let levels = std::iter::once(target.ty()).chain(target.ancestors().iter().rev());

        for level in levels {
            let Some(decl) = self.model.type_decl(level) else {
                continue;
            };
            let bindings = decl.type_bindings(level);
            let is_target = level == target.ty();

            let matches: Vec<_> = decl
                .fields
                .iter()
                .filter(|field| field.has_annotation(&Annotation::LocalScope))
                .filter(|field| !(is_target && field.has_annotation(&Annotation::Inject)))
                .filter(|field| field.ty.substitute(&bindings) == key.ty)
                .filter(|field| {
                    qualifier_of(&field.annotations, &field.name, &field.location).is_ok_and(|qualifier| qualifier == key.qualifier)
                })
                .map(|field| {
                    let access = if field.visibility.is_visible_from(decl.package(), self.package) {
                        FieldAccess::Direct
                    } else if let Some(getter) = &field.getter {
                        FieldAccess::Getter(getter.clone())
                    } else {
                        return Err(inaccessible(level, &field.name, "getter", &field.location));
                    };
                    Ok(Candidate::TargetField {
                        field: field.name.clone(),
                        owner: level.clone(),
                        access,
                    })
                })
                .collect::<Result<_>>()?;

            if !matches.is_empty() {
                return Ok(matches);
            }
        }

        Ok(Vec::new())
    }

    fn providers(&self, key: &BindingKey) -> Vec<Candidate> {
        self.model
            .providers_returning(&key.ty)
            .into_iter()
            .filter(|(_, method)| method.return_type.as_ref() == Some(&key.ty))
            .filter(|(owner, method)| is_reachable(owner, method.visibility, self.package))
            .filter(|(_, method)| {
                qualifier_of(&method.annotations, &method.name, &method.location).is_ok_and(|qualifier| qualifier == key.qualifier)
            })
            // Malformed providers were reported by the scan pass.
            .filter_map(|(owner, method)| provider_candidate(self.model, owner, method, self.options).ok())
            .collect()
    }

    fn constructor(&self, key: &BindingKey) -> Result<Option<Candidate>> {
        let Some(decl) = self.model.type_decl(&key.ty) else {
            return Ok(None);
        };

        if class_qualifier(decl)? != key.qualifier {
            return Ok(None);
        }

        select_constructor(decl, self.package)?
            .map(|constructor| {
                Ok(Candidate::ConstructorCall {
                    ty: key.ty.clone(),
                    params: constructor_params(decl, constructor, &key.ty, self.options)?,
                })
            })
            .transpose()
    }

    /// `@Dependency` implementations; a linear inheritance chain collapses to its most-derived member.
    fn implementations(&self, key: &BindingKey) -> Result<Vec<Candidate>> {
        let mut implementations = Vec::new();

        for decl in self.model.implementors_annotated_as_default(&key.ty) {
            if class_qualifier(decl)? != key.qualifier || !self.model.is_subtype(&decl.ty, &key.ty) {
                continue;
            }

            if let Some(constructor) = select_constructor(decl, self.package)? {
                implementations.push(Candidate::ImplementationOf {
                    concrete: decl.ty.clone(),
                    params: constructor_params(decl, constructor, &decl.ty, self.options)?,
                });
            }
        }

        let concrete = |candidate: &Candidate| match candidate {
            Candidate::ImplementationOf { concrete, .. } => Some(concrete.clone()),
            _ => None,
        };

        let most_derived = implementations.iter().position(|candidate| {
            implementations.iter().all(|other| match (concrete(candidate), concrete(other)) {
                (Some(sub), Some(sup)) => self.model.is_subtype(&sub, &sup),
                _ => false,
            })
        });

        Ok(match most_derived {
            Some(index) if implementations.len() > 1 => vec![implementations.swap_remove(index)],
            _ => implementations,
        })
    }
}

fn is_reachable(owner: &TypeDecl, visibility: Visibility, from_package: &str) -> bool {
    owner.visibility.is_visible_from(owner.package(), from_package) && visibility.is_visible_from(owner.package(), from_package)
}

fn class_qualifier(decl: &TypeDecl) -> Result<Qualifier> {
    qualifier_of(&decl.annotations, &format!("`{}`", decl.ty), &decl.location)
}

/// The constructor generated code uses to build `decl` from `from_package`.
///
/// That is the `@Inject` constructor if there is one, else the visible no-argument
/// constructor, else the only visible constructor.
pub(crate) fn select_constructor<'d>(decl: &'d TypeDecl, from_package: &str) -> Result<Option<&'d ConstructorDecl>> {
    if !decl.visibility.is_visible_from(decl.package(), from_package) {
        return Ok(None);
    }

    let visible = |constructor: &&ConstructorDecl| constructor.visibility.is_visible_from(decl.package(), from_package);

    let mut injected = decl.constructors.iter().filter(|c| c.has_annotation(&Annotation::Inject));
    if let Some(first) = injected.next() {
        if injected.next().is_some() {
            return Err(conflict(
                &format!("`{}`", decl.ty),
                "more than one constructor is annotated @Inject",
                &decl.location,
            ));
        }
        return Ok(Some(first).filter(visible));
    }

    if let Some(no_arg) = decl.constructors.iter().filter(visible).find(|c| c.params.is_empty()) {
        return Ok(Some(no_arg));
    }

    let mut candidates = decl.constructors.iter().filter(visible);
    Ok(match (candidates.next(), candidates.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    })
}

pub(crate) fn constructor_params(
    decl: &TypeDecl,
    constructor: &ConstructorDecl,
    ty: &TypeRef,
    options: &ResolverOptions,
) -> Result<Vec<Dependency>> {
    let bindings = decl.type_bindings(ty);
    constructor
        .params
        .iter()
        .map(|param| {
            let element = format!("parameter `{}` of the `{ty}` constructor", param.name);
            Dependency::from_param(param, &bindings, options, &element, &constructor.location)
        })
        .collect()
}

/// Validates the shape of a `@Provides` method and turns it into a candidate.
pub(crate) fn provider_candidate<M: DeclarationModel + ?Sized>(
    model: &M,
    owner: &TypeDecl,
    method: &MethodDecl,
    options: &ResolverOptions,
) -> Result<Candidate> {
    let invalid = |detail: &str| {
        Error::new(
            ErrorKind::InvalidProviderShape {
                owner: owner.ty.clone(),
                method: method.name.clone(),
                detail: detail.to_owned(),
            },
            method.location.clone(),
        )
    };

    let Some(return_type) = method.return_type.as_ref() else {
        return Err(invalid("providers must return a value"));
    };

    if method.has_annotation(&Annotation::Singleton) && model.is_abstract(return_type) {
        return Err(invalid("singleton providers must return a concrete type"));
    }

    let mut params = method
        .params
        .iter()
        .map(|param| {
            let element = format!("parameter `{}` of `{}.{}`", param.name, owner.ty, method.name);
            Dependency::from_param(param, &[], options, &element, &method.location)
        })
        .collect::<Result<Vec<_>>>()?;

    let kind = if method.is_abstract {
        match params.as_slice() {
            [implementation] if model.is_subtype(&implementation.key().ty, return_type) => FactoryKind::Binds,
            _ => return Err(invalid("abstract providers need exactly one parameter implementing the return type")),
        }
    } else if method.is_static {
        FactoryKind::Static
    } else {
        if !owner.has_annotation(&Annotation::Singleton) {
            return Err(invalid("instance providers need a @Singleton owner"));
        }
        params.insert(0, Dependency::direct("this", BindingKey::unqualified(owner.ty.clone()), method.location.clone()));
        FactoryKind::Instance
    };

    Ok(Candidate::FactoryMethod {
        owner: owner.ty.clone(),
        method: method.name.clone(),
        kind,
        params,
    })
}
