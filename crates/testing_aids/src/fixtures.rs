// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Declaration fixtures shared by the resolver tests.

use wiring_model::{Annotation, ConstructorDecl, FieldDecl, ParamDecl, SymbolTable, TypeDecl, TypeRef};

/// A public class with a single public no-argument constructor.
#[must_use]
pub fn plain_class(ty: &str) -> TypeDecl {
    TypeDecl::class(ty).with_constructor(ConstructorDecl::new())
}

/// A public class whose only constructor takes `params` as `(name, type)` pairs.
#[must_use]
pub fn class_with_params(ty: &str, params: &[(&str, &str)]) -> TypeDecl {
    let constructor = params
        .iter()
        .fold(ConstructorDecl::new(), |constructor, (name, param_ty)| {
            constructor.with_param(ParamDecl::new(*name, *param_ty))
        });
    TypeDecl::class(ty).with_constructor(constructor)
}

/// A public `@Inject` field.
#[must_use]
pub fn inject_field(name: &str, ty: impl Into<TypeRef>) -> FieldDecl {
    FieldDecl::new(name, ty).annotated(Annotation::Inject)
}

/// An injection target with one public `@Inject` field per `(name, type)` pair.
#[must_use]
pub fn target(ty: &str, fields: &[(&str, &str)]) -> TypeDecl {
    fields
        .iter()
        .fold(plain_class(ty), |decl, (name, field_ty)| decl.with_field(inject_field(name, *field_ty)))
}

/// Builds a symbol table, panicking on duplicate declarations.
///
/// # Panics
///
/// Panics if two declarations share an erased name.
#[must_use]
pub fn symbols(types: impl IntoIterator<Item = TypeDecl>) -> SymbolTable {
    SymbolTable::from_types(types).expect("fixture declarations must be unique")
}

/// An interface nobody implements or provides, injected into `app.Main`.
#[must_use]
pub fn unresolvable_interface() -> SymbolTable {
    symbols([
        TypeDecl::interface("app.DependencyModel"),
        target("app.Main", &[("model", "app.DependencyModel")]),
    ])
}

/// `app.Main` needs `app.ParentDependency`, which is constructed from `app.DependencyModel`.
#[must_use]
pub fn parent_and_dependency() -> SymbolTable {
    symbols([
        class_with_params("app.ParentDependency", &[("dependencyModel", "app.DependencyModel")]),
        plain_class("app.DependencyModel"),
        target("app.Main", &[("dependency", "app.ParentDependency")]),
    ])
}

/// The `@Singleton` `app.A`, with its own dependency `app.Engine`, read by targets `app.X` and `app.Y`.
#[must_use]
pub fn shared_singleton() -> SymbolTable {
    symbols([
        class_with_params("app.A", &[("engine", "app.Engine")]).annotated(Annotation::Singleton),
        plain_class("app.Engine"),
        target("app.X", &[("a", "app.A")]),
        target("app.Y", &[("a", "app.A")]),
    ])
}

/// Release and debug `@Dependency` implementations of `app.Api`; `app.Main` asks for the release one.
#[must_use]
pub fn qualified_implementations() -> SymbolTable {
    symbols([
        TypeDecl::interface("app.Api"),
        plain_class("app.ReleaseApi")
            .implements("app.Api")
            .annotated(Annotation::Dependency)
            .annotated(Annotation::named("release")),
        plain_class("app.DebugApi")
            .implements("app.Api")
            .annotated(Annotation::Dependency)
            .annotated(Annotation::named("debug")),
        plain_class("app.Main").with_field(inject_field("api", "app.Api").annotated(Annotation::named("release"))),
    ])
}
