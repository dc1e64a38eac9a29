// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use crate::{Annotated, Annotation, TypeRef};

/// Declared accessibility of a type or member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Visibility {
    /// Reachable from every package.
    #[default]
    Public,

    /// Reachable from the declaring package and subclasses.
    Protected,

    /// Reachable from the declaring package only.
    PackagePrivate,

    /// Reachable from the declaring type only.
    Private,
}

impl Visibility {
    /// Whether code generated into `from_package` can reach a member declared in `owner_package`.
    ///
    /// Generated code never subclasses the owner, so `protected` only helps within the package.
    #[must_use]
    pub fn is_visible_from(self, owner_package: &str, from_package: &str) -> bool {
        match self {
            Self::Public => true,
            Self::Protected | Self::PackagePrivate => owner_package == from_package,
            Self::Private => false,
        }
    }
}

/// Where a declaration lives in source, for diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceLocation {
    /// Source file path, empty when unknown.
    pub file: String,

    /// One-based line.
    pub line: u32,

    /// One-based column.
    pub column: u32,
}

impl SourceLocation {
    /// Creates a location.
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Whether the front end supplied no location.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.file.is_empty()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            f.write_str("<unknown>")
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

/// What kind of type a declaration introduces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeKind {
    /// A concrete class.
    #[default]
    Class,

    /// An abstract class.
    AbstractClass,

    /// An interface.
    Interface,
}

impl TypeKind {
    /// Interfaces and abstract classes cannot be instantiated directly.
    #[must_use]
    pub const fn is_abstract(self) -> bool {
        matches!(self, Self::AbstractClass | Self::Interface)
    }
}

/// A constructor or method parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParamDecl {
    /// Parameter name.
    pub name: String,

    /// Declared type, possibly mentioning type variables of the owner.
    pub ty: TypeRef,

    /// Annotations, in source order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub annotations: Vec<Annotation>,
}

impl ParamDecl {
    /// An unannotated parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            annotations: Vec::new(),
        }
    }

    /// Adds an annotation.
    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// A constructor of a declared type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstructorDecl {
    /// Declared visibility.
    #[cfg_attr(feature = "serde", serde(default))]
    pub visibility: Visibility,

    /// Parameters, in order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: Vec<ParamDecl>,

    /// Annotations, in source order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub annotations: Vec<Annotation>,

    /// Where the constructor is declared.
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: SourceLocation,
}

impl ConstructorDecl {
    /// A public constructor without parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    #[must_use]
    pub fn with_param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    /// Sets the visibility.
    #[must_use]
    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Adds an annotation.
    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Sets the source location.
    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }
}

/// A field of a declared type.
///
/// Private fields may still be reachable by generated code through an accessor pair.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDecl {
    /// Field name.
    pub name: String,

    /// Declared type, possibly mentioning type variables of the owner.
    pub ty: TypeRef,

    /// Declared visibility.
    #[cfg_attr(feature = "serde", serde(default))]
    pub visibility: Visibility,

    /// Annotations, in source order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub annotations: Vec<Annotation>,

    /// Name of a getter generated code may call instead of reading the field.
    #[cfg_attr(feature = "serde", serde(default))]
    pub getter: Option<String>,

    /// Name of a setter generated code may call instead of writing the field.
    #[cfg_attr(feature = "serde", serde(default))]
    pub setter: Option<String>,

    /// Where the field is declared.
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: SourceLocation,
}

impl FieldDecl {
    /// A public, unannotated field without accessors.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            visibility: Visibility::default(),
            annotations: Vec::new(),
            getter: None,
            setter: None,
            location: SourceLocation::default(),
        }
    }

    /// Sets the visibility.
    #[must_use]
    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Adds an annotation.
    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Names the getter of a private field.
    #[must_use]
    pub fn with_getter(mut self, getter: impl Into<String>) -> Self {
        self.getter = Some(getter.into());
        self
    }

    /// Names the setter of a private field.
    #[must_use]
    pub fn with_setter(mut self, setter: impl Into<String>) -> Self {
        self.setter = Some(setter.into());
        self
    }

    /// Sets the source location.
    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }
}

/// A method of a declared type.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodDecl {
    /// Method name.
    pub name: String,

    /// Declared visibility.
    #[cfg_attr(feature = "serde", serde(default))]
    pub visibility: Visibility,

    /// Whether the method is static.
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_static: bool,

    /// Whether the method has no body.
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_abstract: bool,

    /// Declared return type; `None` for `void`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub return_type: Option<TypeRef>,

    /// Parameters, in order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: Vec<ParamDecl>,

    /// Annotations, in source order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub annotations: Vec<Annotation>,

    /// Where the method is declared.
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: SourceLocation,
}

impl MethodDecl {
    /// A public instance method returning nothing.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::default(),
            is_static: false,
            is_abstract: false,
            return_type: None,
            params: Vec::new(),
            annotations: Vec::new(),
            location: SourceLocation::default(),
        }
    }

    /// Sets the return type.
    #[must_use]
    pub fn returning(mut self, ty: impl Into<TypeRef>) -> Self {
        self.return_type = Some(ty.into());
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn with_param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    /// Sets the visibility.
    #[must_use]
    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Marks the method static.
    #[must_use]
    pub const fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Marks the method abstract.
    #[must_use]
    pub const fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    /// Adds an annotation.
    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Sets the source location.
    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }
}

/// A class, abstract class or interface, with everything the resolver may ask about it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeDecl {
    /// The declared type, without type arguments.
    pub ty: TypeRef,

    /// Class, abstract class or interface.
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: TypeKind,

    /// Declared visibility.
    #[cfg_attr(feature = "serde", serde(default))]
    pub visibility: Visibility,

    /// Names of the declared type variables, matched positionally against a reference's arguments.
    #[cfg_attr(feature = "serde", serde(default))]
    pub type_params: Vec<String>,

    /// Direct superclass, with the arguments it is extended with.
    #[cfg_attr(feature = "serde", serde(default))]
    pub superclass: Option<TypeRef>,

    /// Directly implemented interfaces.
    #[cfg_attr(feature = "serde", serde(default))]
    pub interfaces: Vec<TypeRef>,

    /// Type-level annotations.
    #[cfg_attr(feature = "serde", serde(default))]
    pub annotations: Vec<Annotation>,

    /// Declared constructors.
    #[cfg_attr(feature = "serde", serde(default))]
    pub constructors: Vec<ConstructorDecl>,

    /// Declared fields, excluding inherited ones.
    #[cfg_attr(feature = "serde", serde(default))]
    pub fields: Vec<FieldDecl>,

    /// Declared methods, excluding inherited ones.
    #[cfg_attr(feature = "serde", serde(default))]
    pub methods: Vec<MethodDecl>,

    /// Where the type is declared.
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: SourceLocation,
}

impl TypeDecl {
    /// A concrete class with no declared constructor; callers add the ones the source declares.
    #[must_use]
    pub fn class(ty: impl Into<TypeRef>) -> Self {
        Self::with_kind(ty.into(), TypeKind::Class)
    }

    /// An abstract class.
    #[must_use]
    pub fn abstract_class(ty: impl Into<TypeRef>) -> Self {
        Self::with_kind(ty.into(), TypeKind::AbstractClass)
    }

    /// An interface.
    #[must_use]
    pub fn interface(ty: impl Into<TypeRef>) -> Self {
        Self::with_kind(ty.into(), TypeKind::Interface)
    }

    fn with_kind(ty: TypeRef, kind: TypeKind) -> Self {
        Self {
            ty: ty.with_abstract(kind.is_abstract()),
            kind,
            visibility: Visibility::default(),
            type_params: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            constructors: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            location: SourceLocation::default(),
        }
    }

    /// Sets the visibility.
    #[must_use]
    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Declares the next type variable.
    #[must_use]
    pub fn with_type_param(mut self, name: impl Into<String>) -> Self {
        self.type_params.push(name.into());
        self
    }

    /// Sets the superclass.
    #[must_use]
    pub fn extends(mut self, superclass: impl Into<TypeRef>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Adds an implemented interface.
    #[must_use]
    pub fn implements(mut self, interface: impl Into<TypeRef>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Adds an annotation.
    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Adds a constructor.
    #[must_use]
    pub fn with_constructor(mut self, constructor: ConstructorDecl) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a method.
    #[must_use]
    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Sets the source location.
    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    /// The qualified name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.ty.name()
    }

    /// The package the type is declared in.
    #[must_use]
    pub fn package(&self) -> &str {
        self.ty.package()
    }

    /// Binds this declaration's type variables to the arguments of `reference`.
    ///
    /// Missing arguments (raw references) leave the variables unbound.
    #[must_use]
    pub fn type_bindings(&self, reference: &TypeRef) -> Vec<(String, TypeRef)> {
        self.type_params
            .iter()
            .cloned()
            .zip(reference.args().iter().cloned())
            .collect()
    }
}

macro_rules! impl_annotated {
    ($($decl:ty),*) => {
        $(
            impl Annotated for $decl {
                fn annotations(&self) -> &[Annotation] {
                    &self.annotations
                }
            }
        )*
    };
}

impl_annotated!(TypeDecl, ConstructorDecl, FieldDecl, MethodDecl, ParamDecl);

/// Which member a parameter belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Member {
    /// The constructor at this index.
    Constructor(usize),

    /// The method at this index.
    Method(usize),
}

/// Identifies one annotated element of the declaration model.
///
/// Members are addressed by their index in the owner's declaration lists, which is stable for
/// the lifetime of a model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementId {
    /// A type declaration.
    Type(TypeRef),

    /// A constructor of `owner`.
    Constructor {
        /// The declaring type.
        owner: TypeRef,
        /// Position in [`TypeDecl::constructors`].
        index: usize,
    },

    /// A field of `owner`.
    Field {
        /// The declaring type.
        owner: TypeRef,
        /// The field name.
        name: String,
    },

    /// A method of `owner`.
    Method {
        /// The declaring type.
        owner: TypeRef,
        /// Position in [`TypeDecl::methods`].
        index: usize,
    },

    /// A parameter of a constructor or method of `owner`.
    Parameter {
        /// The declaring type.
        owner: TypeRef,
        /// The constructor or method the parameter belongs to.
        member: Member,
        /// Position in the member's parameter list.
        index: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_rules() {
        assert!(Visibility::Public.is_visible_from("a", "b"));
        assert!(Visibility::PackagePrivate.is_visible_from("a", "a"));
        assert!(!Visibility::PackagePrivate.is_visible_from("a", "b"));
        assert!(!Visibility::Protected.is_visible_from("a", "b"));
        assert!(!Visibility::Private.is_visible_from("a", "a"));
    }

    #[test]
    fn unknown_location_display() {
        assert_eq!(SourceLocation::default().to_string(), "<unknown>");
        assert_eq!(SourceLocation::new("Main.java", 3, 7).to_string(), "Main.java:3:7");
    }

    #[test]
    fn kind_sets_abstract_marker() {
        assert!(TypeDecl::interface("a.Api").ty.is_abstract());
        assert!(TypeDecl::abstract_class("a.Base").ty.is_abstract());
        assert!(!TypeDecl::class("a.Impl").ty.is_abstract());
    }

    #[test]
    fn type_bindings_are_positional() {
        let decl = TypeDecl::class("a.Pair").with_type_param("L").with_type_param("R");
        let reference = TypeRef::new("a.Pair").with_args([TypeRef::new("a.X"), TypeRef::new("a.Y")]);

        assert_eq!(
            decl.type_bindings(&reference),
            vec![("L".to_owned(), TypeRef::new("a.X")), ("R".to_owned(), TypeRef::new("a.Y"))]
        );
        assert!(decl.type_bindings(&TypeRef::new("a.Pair")).is_empty());
    }
}
