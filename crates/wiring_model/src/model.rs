// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashSet;

use crate::{Annotation, ConstructorDecl, ElementId, FieldDecl, Member, MethodDecl, TypeDecl, TypeRef};

/// Read-only queries over the declarations of one compilation.
///
/// The resolver never mutates the model and never walks source itself; everything it learns
/// about types flows through this trait. Lookups are by erased name: a generic declaration
/// answers for every parameterization of its type, and the provided methods substitute type
/// arguments where a signature mentions the declaration's type variables.
///
/// Implementations only need to answer the four required lookups; [`SymbolTable`][crate::SymbolTable]
/// answers them from an index built once per compilation.
pub trait DeclarationModel {
    /// Every declared type, in declaration order.
    fn types(&self) -> &[TypeDecl];

    /// The declaration of a type, ignoring generic arguments.
    fn type_decl(&self, ty: &TypeRef) -> Option<&TypeDecl>;

    /// Concrete, `@Dependency`-annotated types that directly or transitively extend or implement
    /// `ty`'s declaration, in declaration order.
    fn implementors_annotated_as_default(&self, ty: &TypeRef) -> Vec<&TypeDecl>;

    /// `@Provides` methods whose erased return type is `ty`'s erased type, with their owners.
    fn providers_returning(&self, ty: &TypeRef) -> Vec<(&TypeDecl, &MethodDecl)>;

    /// Constructors declared by `ty`; empty for unknown types.
    fn constructors_of(&self, ty: &TypeRef) -> &[ConstructorDecl] {
        self.type_decl(ty).map(|decl| decl.constructors.as_slice()).unwrap_or_default()
    }

    /// Fields declared by `ty` itself, not inherited ones.
    fn fields_of(&self, ty: &TypeRef) -> &[FieldDecl] {
        self.type_decl(ty).map(|decl| decl.fields.as_slice()).unwrap_or_default()
    }

    /// Methods declared by `ty` itself, not inherited ones.
    fn methods_of(&self, ty: &TypeRef) -> &[MethodDecl] {
        self.type_decl(ty).map(|decl| decl.methods.as_slice()).unwrap_or_default()
    }

    /// The direct superclass of `ty`, with `ty`'s type arguments substituted.
    fn supertype_of(&self, ty: &TypeRef) -> Option<TypeRef> {
        let decl = self.type_decl(ty)?;
        let bindings = decl.type_bindings(ty);
        decl.superclass.as_ref().map(|superclass| superclass.substitute(&bindings))
    }

    /// The directly implemented interfaces of `ty`, with `ty`'s type arguments substituted.
    fn interfaces_of(&self, ty: &TypeRef) -> Vec<TypeRef> {
        self.type_decl(ty).map_or_else(Vec::new, |decl| {
            let bindings = decl.type_bindings(ty);
            decl.interfaces.iter().map(|interface| interface.substitute(&bindings)).collect()
        })
    }

    /// Annotations on any element; empty when the element does not exist.
    fn annotations_on(&self, element: &ElementId) -> &[Annotation] {
        let annotations = match element {
            ElementId::Type(ty) => self.type_decl(ty).map(|decl| decl.annotations.as_slice()),
            ElementId::Constructor { owner, index } => self.constructors_of(owner).get(*index).map(|c| c.annotations.as_slice()),
            ElementId::Field { owner, name } => self
                .fields_of(owner)
                .iter()
                .find(|field| field.name == *name)
                .map(|field| field.annotations.as_slice()),
            ElementId::Method { owner, index } => self.methods_of(owner).get(*index).map(|m| m.annotations.as_slice()),
            ElementId::Parameter { owner, member, index } => {
                let params = match member {
                    Member::Constructor(member) => self.constructors_of(owner).get(*member).map(|c| c.params.as_slice()),
                    Member::Method(member) => self.methods_of(owner).get(*member).map(|m| m.params.as_slice()),
                };
                params.and_then(|params| params.get(*index)).map(|p| p.annotations.as_slice())
            }
        };

        annotations.unwrap_or(&[])
    }

    /// Superclasses of `ty` from the nearest to the root, excluding `ty` itself.
    ///
    /// The walk stops at the first superclass the model does not declare (that one is still
    /// included) and at any repetition, so malformed inheritance cannot loop.
    fn superclass_chain(&self, ty: &TypeRef) -> Vec<TypeRef> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([ty.name().to_owned()]);
        let mut current = self.supertype_of(ty);

        while let Some(superclass) = current {
            if !seen.insert(superclass.name().to_owned()) {
                break;
            }
            current = self.supertype_of(&superclass);
            chain.push(superclass);
        }

        chain
    }

    /// Every supertype of `ty` (classes and interfaces, transitively), excluding `ty` itself.
    fn all_supertypes(&self, ty: &TypeRef) -> Vec<TypeRef> {
        let mut result: Vec<TypeRef> = Vec::new();
        let mut pending = vec![ty.clone()];

        while let Some(current) = pending.pop() {
            let direct = self.supertype_of(&current).into_iter().chain(self.interfaces_of(&current));
            for supertype in direct {
                if supertype != *ty && !result.contains(&supertype) {
                    result.push(supertype.clone());
                    pending.push(supertype);
                }
            }
        }

        result
    }

    /// Whether a value of `sub` can be used where `sup` is expected.
    fn is_subtype(&self, sub: &TypeRef, sup: &TypeRef) -> bool {
        sub == sup || self.all_supertypes(sub).contains(sup)
    }

    /// Whether `ty` is an interface or abstract class, preferring the declaration over the marker.
    fn is_abstract(&self, ty: &TypeRef) -> bool {
        self.type_decl(ty).map_or_else(|| ty.is_abstract(), |decl| decl.kind.is_abstract())
    }
}
