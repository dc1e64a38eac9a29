// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Compile-time dependency graph resolution for generated dependency injection.
//!
//! Given the declarations of one compilation (see [`wiring_model`]), the [`Resolver`] finds every
//! injection target, a class with `@Inject` fields, methods or constructor parameters, and
//! decides exactly one construction strategy for everything those sites need:
//!
//! * a constructor call,
//! * a provider (`@Provides`) method call,
//! * a reference to a compilation-wide singleton holder,
//! * a `Lazy`/`Provider`/weak wrapper around another binding,
//! * a `@LocalScope` field the target or one of its ancestors already holds.
//!
//! The strategies are flattened into a [`TargetPlan`] whose steps are in dependency order, so a
//! code generator can emit them top to bottom. Singletons are built by [`SingletonHolder`]
//! plans that appear once per compilation, however many targets read them.
//!
//! # Choosing a binding
//!
//! For each [`BindingKey`][wiring_model::BindingKey], the type plus its qualifier, every
//! candidate is collected and then exactly one is selected. Precedence is: target field, then
//! provider method, then default implementation (`@Dependency`), then constructor. Two
//! candidates tied at the winning level are an [`ErrorKind::AmbiguousBinding`]; the resolver
//! never picks the first one found.
//!
//! # Cycles
//!
//! A dependency cycle is legal only when it passes through the injection target itself, which is
//! then passed in as an existing instance, or through a `Lazy`/`Provider` wrapper, which builds
//! its value after the chain that requested it. Any other cycle is an
//! [`ErrorKind::CircularDependency`] naming the full path.
//!
//! # Diagnostics
//!
//! Errors are collected per target. All sites of a target are attempted, and a failing target
//! never prevents its siblings from resolving. [`CompilationPlan::report_to`] hands everything
//! to a [`DiagnosticSink`]; [`TracingSink`] forwards it to `tracing`.
//!
//! # Features
//!
//! * `rayon`: resolve targets in parallel when [`ResolverOptions::with_parallel`] is set.
//! * `serde`: (de)serialize [`ResolverOptions`] and the declaration model.

mod annotations;
mod candidate;
mod compilation;
mod diagnostics;
mod error;
mod finder;
mod graph;
mod options;
mod plan;
mod registry;
mod selector;
mod session;
mod target;

pub use annotations::{indirection_of, qualifier_of, scope_of};
pub use candidate::{Candidate, Dependency, FactoryKind, FieldAccess, Indirection};
pub use compilation::{CompilationPlan, Failure, PlanEmitter, Resolver};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, Severity, TracingSink};
pub use error::{Error, ErrorKind, Result};
pub use options::ResolverOptions;
pub use plan::{ConstructionStep, SingletonHolder, SiteAssignment, TargetPlan};
pub use registry::{SingletonEntry, SingletonRegistry};
pub(crate) use target::Target;
pub use target::{InjectionSite, SiteKind};
