// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for declaration models handed over as JSON.

use wiring_model::{Annotation, DeclarationModel, Qualifier, SourceLocation, SymbolTable, TypeDecl, TypeKind, TypeRef};

const DECLARATIONS: &str = r#"[
    { "ty": { "name": "a.Api", "is_abstract": true }, "kind": "Interface" },
    {
        "ty": { "name": "a.HttpApi" },
        "interfaces": [ { "name": "a.Api" } ],
        "annotations": [ "Dependency", { "Named": "release" } ],
        "constructors": [
            {
                "annotations": [ "Inject" ],
                "params": [ { "name": "client", "ty": { "name": "a.Client" } } ],
                "location": { "file": "HttpApi.java", "line": 4, "column": 5 }
            }
        ]
    },
    { "ty": { "name": "a.Client" }, "constructors": [ {} ] }
]"#;

#[test]
fn declarations_from_json() {
    let types: Vec<TypeDecl> = serde_json::from_str(DECLARATIONS).unwrap();
    let table = SymbolTable::from_types(types).unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(table.type_decl(&TypeRef::new("a.Api")).unwrap().kind, TypeKind::Interface);

    let implementors = table.implementors_annotated_as_default(&TypeRef::new("a.Api"));
    assert_eq!(implementors.len(), 1);

    let http = implementors[0];
    assert_eq!(http.annotations, [Annotation::Dependency, Annotation::named("release")]);
    assert_eq!(http.constructors[0].location, SourceLocation::new("HttpApi.java", 4, 5));
    assert_eq!(http.constructors[0].params[0].ty, TypeRef::new("a.Client"));
}

#[test]
fn qualifier_round_trips_through_json() {
    let json = serde_json::to_string(&Qualifier::named("debug")).unwrap();

    assert_eq!(json, r#"{"Named":"debug"}"#);
    assert_eq!(serde_json::from_str::<Qualifier>(r#""Default""#).unwrap(), Qualifier::Default);
}
