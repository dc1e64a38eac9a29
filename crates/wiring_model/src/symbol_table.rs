// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;

use crate::{Annotated, Annotation, DeclarationModel, Error, MethodDecl, Result, TypeDecl, TypeRef};

/// The declaration model of one compilation, indexed once up front.
///
/// Building the table is the single visitation pass over the declarations: type lookup,
/// default-implementation lookup and provider lookup are all answered from maps afterwards.
///
/// # Examples
///
/// ```
/// use wiring_model::{Annotation, ConstructorDecl, DeclarationModel, SymbolTable, TypeDecl, TypeRef};
///
/// let table = SymbolTable::builder()
///     .with_type(TypeDecl::interface("a.Api"))
///     .with_type(
///         TypeDecl::class("a.HttpApi")
///             .implements("a.Api")
///             .annotated(Annotation::Dependency)
///             .with_constructor(ConstructorDecl::new()),
///     )
///     .build()?;
///
/// let implementors = table.implementors_annotated_as_default(&TypeRef::new("a.Api"));
/// assert_eq!(implementors.len(), 1);
/// assert_eq!(implementors[0].name(), "a.HttpApi");
/// # Ok::<(), wiring_model::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    types: Vec<TypeDecl>,
    by_name: HashMap<String, usize>,
    implementors: HashMap<String, Vec<usize>>,
    providers: HashMap<String, Vec<(usize, usize)>>,
}

impl SymbolTable {
    /// Starts collecting declarations.
    #[must_use]
    pub fn builder() -> SymbolTableBuilder {
        SymbolTableBuilder::default()
    }

    /// Indexes a complete list of declarations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateType`] if two declarations share a qualified name.
    pub fn from_types(types: impl IntoIterator<Item = TypeDecl>) -> Result<Self> {
        types.into_iter().fold(Self::builder(), SymbolTableBuilder::with_type).build()
    }

    /// Number of declared types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no type is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn index(types: Vec<TypeDecl>) -> Result<Self> {
        let mut by_name: HashMap<String, usize> = HashMap::with_capacity(types.len());
        for (index, decl) in types.iter().enumerate() {
            if let Some(&first) = by_name.get(decl.name()) {
                return Err(Error::DuplicateType {
                    name: decl.name().to_owned(),
                    first: types[first].location.clone(),
                    second: decl.location.clone(),
                });
            }
            by_name.insert(decl.name().to_owned(), index);
        }

        let mut table = Self {
            types,
            by_name,
            implementors: HashMap::new(),
            providers: HashMap::new(),
        };

        let mut implementors: HashMap<String, Vec<usize>> = HashMap::new();
        let mut providers: HashMap<String, Vec<(usize, usize)>> = HashMap::new();

        for (type_index, decl) in table.types.iter().enumerate() {
            if !decl.kind.is_abstract() && decl.has_annotation(&Annotation::Dependency) {
                for supertype in table.all_supertypes(&decl.ty) {
                    implementors.entry(supertype.name().to_owned()).or_default().push(type_index);
                }
            }

            for (method_index, method) in decl.methods.iter().enumerate() {
                if let Some(return_type) = provided_type(method) {
                    providers
                        .entry(return_type.name().to_owned())
                        .or_default()
                        .push((type_index, method_index));
                }
            }
        }

        table.implementors = implementors;
        table.providers = providers;
        Ok(table)
    }
}

fn provided_type(method: &MethodDecl) -> Option<&TypeRef> {
    method
        .return_type
        .as_ref()
        .filter(|_| method.has_annotation(&Annotation::Provides))
}

impl DeclarationModel for SymbolTable {
    fn types(&self) -> &[TypeDecl] {
        &self.types
    }

    fn type_decl(&self, ty: &TypeRef) -> Option<&TypeDecl> {
        self.by_name.get(ty.name()).map(|&index| &self.types[index])
    }

    fn implementors_annotated_as_default(&self, ty: &TypeRef) -> Vec<&TypeDecl> {
        self.implementors
            .get(ty.name())
            .map(|indices| indices.iter().map(|&index| &self.types[index]).collect())
            .unwrap_or_default()
    }

    fn providers_returning(&self, ty: &TypeRef) -> Vec<(&TypeDecl, &MethodDecl)> {
        self.providers
            .get(ty.name())
            .map(|entries| {
                entries
                    .iter()
                    .map(|&(owner, method)| {
                        let owner = &self.types[owner];
                        (owner, &owner.methods[method])
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Collects declarations for a [`SymbolTable`].
#[derive(Debug, Default)]
pub struct SymbolTableBuilder {
    types: Vec<TypeDecl>,
}

impl SymbolTableBuilder {
    /// Adds one declaration. Declaration order is preserved and drives deterministic output.
    #[must_use]
    pub fn with_type(mut self, decl: TypeDecl) -> Self {
        self.types.push(decl);
        self
    }

    /// Indexes the collected declarations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateType`] if two declarations share a qualified name.
    pub fn build(self) -> Result<SymbolTable> {
        SymbolTable::index(self.types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConstructorDecl, ElementId, FieldDecl, Member, ParamDecl, SourceLocation};

    fn table(types: impl IntoIterator<Item = TypeDecl>) -> SymbolTable {
        SymbolTable::from_types(types).unwrap()
    }

    #[test]
    fn duplicate_types_are_rejected() {
        let error = SymbolTable::from_types([
            TypeDecl::class("a.A").at(SourceLocation::new("A.java", 1, 1)),
            TypeDecl::class("a.A").at(SourceLocation::new("B.java", 2, 1)),
        ])
        .unwrap_err();

        assert_eq!(
            error,
            Error::DuplicateType {
                name: "a.A".to_owned(),
                first: SourceLocation::new("A.java", 1, 1),
                second: SourceLocation::new("B.java", 2, 1),
            }
        );
    }

    #[test]
    fn implementors_are_transitive() {
        let table = table([
            TypeDecl::interface("a.Api"),
            TypeDecl::abstract_class("a.BaseApi").implements("a.Api").annotated(Annotation::Dependency),
            TypeDecl::class("a.RealApi").extends("a.BaseApi").annotated(Annotation::Dependency),
            TypeDecl::class("a.Unmarked").implements("a.Api"),
        ]);

        let names: Vec<_> = table
            .implementors_annotated_as_default(&TypeRef::new("a.Api"))
            .iter()
            .map(|decl| decl.name())
            .collect();

        // Abstract and unmarked implementations never count.
        assert_eq!(names, ["a.RealApi"]);
        assert_eq!(table.implementors_annotated_as_default(&TypeRef::new("a.BaseApi")).len(), 1);
    }

    #[test]
    fn providers_are_indexed_by_erased_return_type() {
        let table = table([TypeDecl::class("a.Module")
            .with_method(
                MethodDecl::new("users")
                    .returning(TypeRef::new("a.Repo").with_args([TypeRef::new("a.User")]))
                    .annotated(Annotation::Provides),
            )
            .with_method(MethodDecl::new("helper").returning("a.Repo"))]);

        let providers = table.providers_returning(&TypeRef::new("a.Repo"));

        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].1.name, "users");
    }

    #[test]
    fn supertypes_substitute_arguments() {
        let table = table([
            TypeDecl::interface("a.Source").with_type_param("T"),
            TypeDecl::abstract_class("a.CachedSource")
                .with_type_param("V")
                .implements(TypeRef::new("a.Source").with_args([TypeRef::new("V")])),
            TypeDecl::class("a.UserSource").extends(TypeRef::new("a.CachedSource").with_args([TypeRef::new("a.User")])),
        ]);

        let source_of_users = TypeRef::new("a.Source").with_args([TypeRef::new("a.User")]);

        assert!(table.is_subtype(&TypeRef::new("a.UserSource"), &source_of_users));
        assert!(!table.is_subtype(
            &TypeRef::new("a.UserSource"),
            &TypeRef::new("a.Source").with_args([TypeRef::new("a.Order")])
        ));
    }

    #[test]
    fn superclass_chain_is_nearest_first_and_includes_undeclared_root() {
        let table = table([
            TypeDecl::class("a.Base").extends("android.app.Activity"),
            TypeDecl::class("a.Main").extends("a.Base"),
        ]);

        let chain: Vec<_> = table
            .superclass_chain(&TypeRef::new("a.Main"))
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(chain, ["a.Base", "android.app.Activity"]);
    }

    #[test]
    fn cyclic_inheritance_terminates() {
        let table = table([TypeDecl::class("a.A").extends("a.B"), TypeDecl::class("a.B").extends("a.A")]);

        assert_eq!(table.superclass_chain(&TypeRef::new("a.A")), vec![TypeRef::new("a.B")]);
        assert!(table.is_subtype(&TypeRef::new("a.A"), &TypeRef::new("a.B")));
    }

    #[test]
    fn annotations_on_elements() {
        let table = table([TypeDecl::class("a.A")
            .annotated(Annotation::Singleton)
            .with_constructor(
                ConstructorDecl::new()
                    .annotated(Annotation::Inject)
                    .with_param(ParamDecl::new("api", "a.Api").annotated(Annotation::named("debug"))),
            )
            .with_field(FieldDecl::new("cache", "a.Cache").annotated(Annotation::LocalScope))]);
        let owner = TypeRef::new("a.A");

        assert_eq!(table.annotations_on(&ElementId::Type(owner.clone())), [Annotation::Singleton]);
        assert_eq!(
            table.annotations_on(&ElementId::Constructor {
                owner: owner.clone(),
                index: 0
            }),
            [Annotation::Inject]
        );
        assert_eq!(
            table.annotations_on(&ElementId::Parameter {
                owner: owner.clone(),
                member: Member::Constructor(0),
                index: 0
            }),
            [Annotation::named("debug")]
        );
        assert_eq!(
            table.annotations_on(&ElementId::Field {
                owner: owner.clone(),
                name: "cache".to_owned()
            }),
            [Annotation::LocalScope]
        );
        assert!(table.annotations_on(&ElementId::Method { owner, index: 3 }).is_empty());
    }
}
