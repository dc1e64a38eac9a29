// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use wiring_model::{Annotated, Annotation, DeclarationModel, Scope, SourceLocation, TypeDecl, TypeRef, Visibility};

use crate::annotations::{conflict, qualifier_of, scope_of};
use crate::{Dependency, Error, ErrorKind, ResolverOptions};

/// How an injection site receives its value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SiteKind {
    /// A field, assigned directly.
    Field {
        /// The field name.
        name: String,
    },

    /// A private field, assigned through its setter.
    FieldSetter {
        /// The field name.
        name: String,
        /// The setter called with the value.
        setter: String,
    },

    /// A parameter of an `@Inject` method.
    MethodParameter {
        /// The method name.
        method: String,
        /// Zero-based parameter position.
        index: usize,
    },

    /// A parameter of the target's `@Inject` constructor.
    ConstructorParameter {
        /// Zero-based parameter position.
        index: usize,
    },
}

/// One place on an injection target that receives a dependency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InjectionSite {
    kind: SiteKind,
    owner: TypeRef,
    dependency: Dependency,
    local_scope: bool,
    location: SourceLocation,
}

impl InjectionSite {
    /// How the value is delivered to the target.
    #[must_use]
    pub const fn kind(&self) -> &SiteKind {
        &self.kind
    }

    /// What the site requests, including the qualifier and any wrapper.
    #[must_use]
    pub const fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    /// Whether the value is kept on the target for reuse by subclasses.
    #[must_use]
    pub const fn is_local_scope(&self) -> bool {
        self.local_scope
    }

    /// Where the site is declared.
    #[must_use]
    pub const fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Human readable description, used as the requester in diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.kind {
            SiteKind::Field { name } | SiteKind::FieldSetter { name, .. } => format!("field `{name}` of `{}`", self.owner),
            SiteKind::MethodParameter { method, .. } => {
                format!("parameter `{}` of method `{method}` of `{}`", self.dependency.name(), self.owner)
            }
            SiteKind::ConstructorParameter { .. } => {
                format!("parameter `{}` of the `{}` constructor", self.dependency.name(), self.owner)
            }
        }
    }
}

impl fmt::Display for InjectionSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SiteKind::Field { name } => write!(f, "field {name}"),
            SiteKind::FieldSetter { setter, .. } => write!(f, "{setter}()"),
            SiteKind::MethodParameter { method, index } => write!(f, "{method}()#{index}"),
            SiteKind::ConstructorParameter { index } => write!(f, "constructor#{index}"),
        }
    }
}

/// A class with injection sites of its own, plus its place in the class hierarchy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    ty: TypeRef,
    ancestors: Vec<TypeRef>,
    parent_injector: Option<TypeRef>,
    sites: Vec<InjectionSite>,
    location: SourceLocation,
}

impl Target {
    #[must_use]
    pub const fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Superclasses from the root of the hierarchy down to the direct parent.
    #[must_use]
    pub fn ancestors(&self) -> &[TypeRef] {
        &self.ancestors
    }

    /// The nearest ancestor that is an injection target itself; its injector runs first.
    #[must_use]
    pub const fn parent_injector(&self) -> Option<&TypeRef> {
        self.parent_injector.as_ref()
    }

    #[must_use]
    pub fn sites(&self) -> &[InjectionSite] {
        &self.sites
    }

    #[must_use]
    pub const fn location(&self) -> &SourceLocation {
        &self.location
    }
}

/// Whether a declaration has `@Inject` fields or methods of its own.
pub(crate) fn is_target(decl: &TypeDecl) -> bool {
    decl.fields.iter().any(|field| field.has_annotation(&Annotation::Inject))
        || decl.methods.iter().any(|method| method.has_annotation(&Annotation::Inject))
}

/// Reads the injection sites of `decl`.
///
/// Every site is examined; invalid ones are left out of the target and reported together.
pub(crate) fn discover<M: DeclarationModel + ?Sized>(model: &M, decl: &TypeDecl, options: &ResolverOptions) -> (Target, Vec<Error>) {
    let mut sites = Vec::new();
    let mut errors = Vec::new();
    let owner = &decl.ty;
    let package = decl.package();

    for field in decl.fields.iter().filter(|field| field.has_annotation(&Annotation::Inject)) {
        let element = format!("field `{}` of `{owner}`", field.name);
        let site = site_scope(&field.annotations, &element, &field.location).and_then(|local_scope| {
            let kind = if field.visibility.is_visible_from(package, package) {
                SiteKind::Field { name: field.name.clone() }
            } else if let Some(setter) = &field.setter {
                SiteKind::FieldSetter {
                    name: field.name.clone(),
                    setter: setter.clone(),
                }
            } else {
                return Err(inaccessible(owner, &field.name, "setter", &field.location));
            };

            let qualifier = qualifier_of(&field.annotations, &element, &field.location)?;
            let dependency = Dependency::of_type(&field.name, &field.ty, qualifier, options, &element, &field.location)?;
            Ok(InjectionSite {
                kind,
                owner: owner.clone(),
                dependency,
                local_scope,
                location: field.location.clone(),
            })
        });
        collect(site, &mut sites, &mut errors);
    }

    for method in decl.methods.iter().filter(|method| method.has_annotation(&Annotation::Inject)) {
        if method.visibility == Visibility::Private {
            errors.push(inaccessible(owner, &method.name, "setter", &method.location));
            continue;
        }

        let local_scope = match site_scope(&method.annotations, &format!("method `{}` of `{owner}`", method.name), &method.location) {
            Ok(local_scope) => local_scope,
            Err(error) => {
                errors.push(error);
                continue;
            }
        };

        for (index, param) in method.params.iter().enumerate() {
            let element = format!("parameter `{}` of method `{}` of `{owner}`", param.name, method.name);
            let site = Dependency::from_param(param, &[], options, &element, &method.location).map(|dependency| InjectionSite {
                kind: SiteKind::MethodParameter {
                    method: method.name.clone(),
                    index,
                },
                owner: owner.clone(),
                dependency,
                local_scope,
                location: method.location.clone(),
            });
            collect(site, &mut sites, &mut errors);
        }
    }

    let mut injected = decl.constructors.iter().filter(|c| c.has_annotation(&Annotation::Inject));
    match (injected.next(), injected.next()) {
        (Some(constructor), None) => {
            for (index, param) in constructor.params.iter().enumerate() {
                let element = format!("parameter `{}` of the `{owner}` constructor", param.name);
                let site = Dependency::from_param(param, &[], options, &element, &constructor.location).map(|dependency| InjectionSite {
                    kind: SiteKind::ConstructorParameter { index },
                    owner: owner.clone(),
                    dependency,
                    local_scope: false,
                    location: constructor.location.clone(),
                });
                collect(site, &mut sites, &mut errors);
            }
        }
        (Some(_), Some(_)) => errors.push(conflict(
            &format!("`{owner}`"),
            "more than one constructor is annotated @Inject",
            &decl.location,
        )),
        _ => {}
    }

    let mut ancestors = model.superclass_chain(owner);
    let parent_injector = ancestors
        .iter()
        .find(|ancestor| model.type_decl(ancestor).is_some_and(is_target))
        .cloned();
    ancestors.reverse();

    let target = Target {
        ty: owner.clone(),
        ancestors,
        parent_injector,
        sites,
        location: decl.location.clone(),
    };

    (target, errors)
}

/// Whether a site is `@LocalScope`; sites can never be singletons.
fn site_scope(annotations: &[Annotation], element: &str, location: &SourceLocation) -> Result<bool, Error> {
    match scope_of(annotations, element, location)? {
        Scope::Singleton => Err(conflict(element, "@Singleton cannot annotate an injection site", location)),
        Scope::LocalScope => Ok(true),
        Scope::None => Ok(false),
    }
}

pub(crate) fn inaccessible(owner: &TypeRef, member: &str, accessor: &'static str, location: &SourceLocation) -> Error {
    Error::new(
        ErrorKind::InaccessibleInjectionSite {
            owner: owner.clone(),
            member: member.to_owned(),
            accessor,
        },
        location.clone(),
    )
}

fn collect(site: Result<InjectionSite, Error>, sites: &mut Vec<InjectionSite>, errors: &mut Vec<Error>) {
    match site {
        Ok(site) => sites.push(site),
        Err(error) => errors.push(error),
    }
}

#[cfg(test)]
mod tests {
    use wiring_model::{BindingKey, ConstructorDecl, FieldDecl, MethodDecl, ParamDecl, SymbolTable};

    use super::*;

    fn discover_in(types: impl IntoIterator<Item = TypeDecl>, name: &str) -> (Target, Vec<Error>) {
        let model = SymbolTable::from_types(types).unwrap();
        let decl = model.type_decl(&TypeRef::new(name)).unwrap().clone();
        discover(&model, &decl, &ResolverOptions::default())
    }

    #[test]
    fn sites_of_every_kind() {
        let (target, errors) = discover_in(
            [TypeDecl::class("a.Main")
                .with_field(FieldDecl::new("api", "a.Api").annotated(Annotation::Inject))
                .with_field(
                    FieldDecl::new("cache", "a.Cache")
                        .with_visibility(Visibility::Private)
                        .with_setter("setCache")
                        .annotated(Annotation::Inject)
                        .annotated(Annotation::LocalScope),
                )
                .with_method(
                    MethodDecl::new("init")
                        .with_param(ParamDecl::new("clock", "a.Clock").annotated(Annotation::named("utc")))
                        .annotated(Annotation::Inject),
                )
                .with_constructor(ConstructorDecl::new().with_param(ParamDecl::new("db", "a.Db")).annotated(Annotation::Inject))],
            "a.Main",
        );

        assert!(errors.is_empty());
        let rendered: Vec<_> = target.sites().iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["field api", "setCache()", "init()#0", "constructor#0"]);
        assert!(target.sites()[1].is_local_scope());
        assert_eq!(target.sites()[2].dependency().key(), &BindingKey::named("a.Clock", "utc"));
        assert_eq!(target.sites()[2].describe(), "parameter `clock` of method `init` of `a.Main`");
    }

    #[test]
    fn private_field_without_setter() {
        let (target, errors) = discover_in(
            [TypeDecl::class("a.Main")
                .with_field(
                    FieldDecl::new("api", "a.Api")
                        .with_visibility(Visibility::Private)
                        .annotated(Annotation::Inject),
                )
                .with_field(FieldDecl::new("clock", "a.Clock").annotated(Annotation::Inject))],
            "a.Main",
        );

        assert_eq!(target.sites().len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "injection site `api` on `a.Main` is private and has no accessible setter"
        );
    }

    #[test]
    fn singleton_site_conflicts() {
        let (_, errors) = discover_in(
            [TypeDecl::class("a.Main").with_field(
                FieldDecl::new("api", "a.Api")
                    .annotated(Annotation::Inject)
                    .annotated(Annotation::Singleton),
            )],
            "a.Main",
        );

        assert_eq!(
            errors[0].to_string(),
            "conflicting annotations on field `api` of `a.Main`: @Singleton cannot annotate an injection site"
        );
    }

    #[test]
    fn ancestors_are_root_to_leaf() {
        let (target, _) = discover_in(
            [
                TypeDecl::class("a.Root"),
                TypeDecl::class("a.Base")
                    .extends("a.Root")
                    .with_field(FieldDecl::new("log", "a.Log").annotated(Annotation::Inject)),
                TypeDecl::class("a.Middle").extends("a.Base"),
                TypeDecl::class("a.Main")
                    .extends("a.Middle")
                    .with_field(FieldDecl::new("api", "a.Api").annotated(Annotation::Inject)),
            ],
            "a.Main",
        );

        let ancestors: Vec<_> = target.ancestors().iter().map(ToString::to_string).collect();
        assert_eq!(ancestors, ["a.Root", "a.Base", "a.Middle"]);
        assert_eq!(target.parent_injector(), Some(&TypeRef::new("a.Base")));
    }
}
