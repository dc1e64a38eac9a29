// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for end-to-end resolution of whole compilations.

use pretty_assertions::assert_eq;
use testing_aids::{
    class_with_params, parent_and_dependency, plain_class, qualified_implementations, shared_singleton, symbols, target,
    unresolvable_interface,
};
use wiring::{Candidate, CompilationPlan, ErrorKind, Resolver, TargetPlan};
use wiring_model::{Annotation, BindingKey, TypeDecl, TypeRef};

fn steps(plan: &TargetPlan) -> Vec<String> {
    plan.steps().iter().map(ToString::to_string).collect()
}

fn rendered(compilation: &CompilationPlan) -> Vec<String> {
    compilation
        .holders()
        .iter()
        .map(ToString::to_string)
        .chain(compilation.targets().iter().map(ToString::to_string))
        .collect()
}

#[test]
fn interface_without_binding_fails() {
    let model = unresolvable_interface();

    let compilation = Resolver::new(&model).resolve_all();

    assert!(!compilation.is_success());
    assert!(compilation.targets().is_empty());

    let failure = compilation.failure(&TypeRef::new("app.Main")).unwrap();
    assert_eq!(failure.errors().len(), 1);
    assert_eq!(
        failure.errors()[0].kind(),
        &ErrorKind::NoCandidateFound {
            key: BindingKey::unqualified("app.DependencyModel"),
            requester: "field `model` of `app.Main`".to_owned(),
            reason: None,
        }
    );
}

#[test]
fn dependencies_come_before_dependents() {
    let model = parent_and_dependency();

    let compilation = Resolver::new(&model).resolve_all();

    assert!(compilation.is_success());
    let plan = compilation.target(&TypeRef::new("app.Main")).unwrap();
    assert_eq!(
        steps(plan),
        [
            "app.DependencyModel = app.DependencyModel()",
            "app.ParentDependency = app.ParentDependency(dependencyModel)",
        ]
    );
    assert!(plan.is_topologically_ordered());

    let assignments: Vec<_> = plan
        .assignments()
        .iter()
        .map(|assignment| format!("{} <- {}", assignment.site(), assignment.value()))
        .collect();
    assert_eq!(assignments, ["field dependency <- app.ParentDependency"]);
}

#[test]
fn singleton_is_built_once_for_all_targets() {
    let model = shared_singleton();

    let compilation = Resolver::new(&model).resolve_all();

    assert!(compilation.is_success());
    assert_eq!(compilation.holders().len(), 1);

    let holder = compilation.holder(&BindingKey::unqualified("app.A")).unwrap();
    let holder_steps: Vec<_> = holder.steps().iter().map(ToString::to_string).collect();
    assert_eq!(holder_steps, ["app.Engine = app.Engine()", "app.A = app.A(engine)"]);

    for name in ["app.X", "app.Y"] {
        let plan = compilation.target(&TypeRef::new(name)).unwrap();
        assert_eq!(steps(plan), ["app.A = singleton app.A"]);
        assert_eq!(plan.singletons().collect::<Vec<_>>(), [&BindingKey::unqualified("app.A")]);
    }

    let constructions_of_a = compilation
        .holders()
        .iter()
        .flat_map(|holder| holder.steps())
        .chain(compilation.targets().iter().flat_map(TargetPlan::steps))
        .filter(|step| matches!(step.candidate(), Candidate::ConstructorCall { ty, .. } if ty == &TypeRef::new("app.A")))
        .count();
    assert_eq!(constructions_of_a, 1);
}

#[test]
fn qualifier_selects_matching_implementation() {
    let model = qualified_implementations();

    let compilation = Resolver::new(&model).resolve_all();

    assert!(compilation.is_success());
    let plan = compilation.target(&TypeRef::new("app.Main")).unwrap();
    assert_eq!(steps(plan), ["@Named(\"release\") app.Api = app.ReleaseApi()"]);
    assert!(matches!(
        plan.steps()[0].candidate(),
        Candidate::ImplementationOf { concrete, .. } if concrete == &TypeRef::new("app.ReleaseApi")
    ));
}

#[test]
fn unqualified_site_ignores_qualified_implementations() {
    let model = symbols([
        TypeDecl::interface("app.Api"),
        plain_class("app.ReleaseApi")
            .implements("app.Api")
            .annotated(Annotation::Dependency)
            .annotated(Annotation::named("release")),
        target("app.Main", &[("api", "app.Api")]),
    ]);

    let compilation = Resolver::new(&model).resolve_all();

    let error = &compilation.failure(&TypeRef::new("app.Main")).unwrap().errors()[0];
    assert!(matches!(error.kind(), ErrorKind::NoCandidateFound { .. }));
}

#[test]
fn every_error_of_a_target_is_reported() {
    let model = symbols([
        TypeDecl::interface("app.Clock"),
        TypeDecl::interface("app.Store"),
        target("app.Main", &[("clock", "app.Clock"), ("store", "app.Store")]),
    ]);

    let compilation = Resolver::new(&model).resolve_all();

    let messages: Vec<_> = compilation
        .failure(&TypeRef::new("app.Main"))
        .unwrap()
        .errors()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        messages,
        [
            "no binding found for `app.Clock` required by field `clock` of `app.Main`",
            "no binding found for `app.Store` required by field `store` of `app.Main`",
        ]
    );
}

#[test]
fn failing_target_does_not_affect_siblings() {
    let model = symbols([
        TypeDecl::interface("app.Clock"),
        plain_class("app.Store"),
        target("app.Broken", &[("clock", "app.Clock")]),
        target("app.Working", &[("store", "app.Store")]),
    ]);

    let compilation = Resolver::new(&model).resolve_all();

    assert_eq!(compilation.failures().len(), 1);
    assert_eq!(compilation.failures()[0].subject(), &TypeRef::new("app.Broken"));
    let plan = compilation.target(&TypeRef::new("app.Working")).unwrap();
    assert_eq!(steps(plan), ["app.Store = app.Store()"]);
}

#[test]
fn shared_keys_are_built_once_per_target() {
    let model = symbols([
        plain_class("app.Clock"),
        class_with_params("app.Scheduler", &[("clock", "app.Clock")]),
        class_with_params("app.Auditor", &[("clock", "app.Clock")]),
        target("app.Main", &[("scheduler", "app.Scheduler"), ("auditor", "app.Auditor"), ("clock", "app.Clock")]),
    ]);

    let compilation = Resolver::new(&model).resolve_all();

    let plan = compilation.target(&TypeRef::new("app.Main")).unwrap();
    assert_eq!(
        steps(plan),
        [
            "app.Clock = app.Clock()",
            "app.Scheduler = app.Scheduler(clock)",
            "app.Auditor = app.Auditor(clock)",
        ]
    );
    assert_eq!(plan.assignments().len(), 3);
    assert!(plan.is_topologically_ordered());
}

#[test]
fn resolution_is_deterministic() {
    let model = symbols([
        plain_class("app.Engine"),
        class_with_params("app.A", &[("engine", "app.Engine")]).annotated(Annotation::Singleton),
        class_with_params("app.Service", &[("a", "app.A"), ("engine", "app.Engine")]),
        target("app.X", &[("service", "app.Service")]),
        target("app.Y", &[("a", "app.A"), ("engine", "app.Engine")]),
        TypeDecl::interface("app.Missing"),
        target("app.Z", &[("missing", "app.Missing")]),
    ]);

    let first = Resolver::new(&model).resolve_all();
    let second = Resolver::new(&model).resolve_all();

    assert_eq!(rendered(&first), rendered(&second));
    assert_eq!(first.failures(), second.failures());
}

#[cfg(feature = "rayon")]
#[test]
fn parallel_resolution_keeps_declaration_order() {
    use wiring::ResolverOptions;

    let mut types = vec![plain_class("app.Engine")];
    for index in 0..32 {
        types.push(target(&format!("app.Target{index}"), &[("engine", "app.Engine")]));
    }
    let model = symbols(types);

    let sequential = Resolver::new(&model).resolve_all();
    let parallel = Resolver::new(&model)
        .with_options(ResolverOptions::default().with_parallel(true))
        .resolve_all();

    assert_eq!(rendered(&sequential), rendered(&parallel));
}
