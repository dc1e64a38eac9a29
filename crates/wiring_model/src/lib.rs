// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The declaration model consumed by the `wiring` dependency graph resolver.
//!
//! A front end (an annotation processor, a compiler plugin, a test) describes the types of one
//! compilation as [`TypeDecl`]s: their constructors, fields, methods, supertypes and the
//! injection annotations present on each of them. The resolver only ever reads this model,
//! through the [`DeclarationModel`] trait.
//!
//! [`SymbolTable`] is the standard implementation. It is built once per compilation and
//! answers every lookup from a precomputed index.
//!
//! # Identity
//!
//! [`TypeRef`] identifies a type by qualified name and generic arguments; [`BindingKey`] pairs a
//! type with a [`Qualifier`] and is the key of every resolution lookup.
//!
//! # Serialization
//!
//! With the `serde` feature, every model type can be (de)serialized, which lets a front end
//! written in another language hand its declarations over as JSON.

mod annotation;
mod binding;
mod decl;
mod error;
mod model;
mod symbol_table;
mod type_ref;

pub use annotation::{Annotated, Annotation};
pub use binding::{BindingKey, Qualifier, Scope};
pub use decl::{
    ConstructorDecl, ElementId, FieldDecl, Member, MethodDecl, ParamDecl, SourceLocation, TypeDecl, TypeKind, Visibility,
};
pub use error::{Error, Result};
pub use model::DeclarationModel;
pub use symbol_table::{SymbolTable, SymbolTableBuilder};
pub use type_ref::TypeRef;
