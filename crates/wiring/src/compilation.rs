// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing::{Level, event};
use wiring_model::{BindingKey, DeclarationModel, TypeDecl, TypeRef};

use crate::graph::GraphBuilder;
use crate::registry::{Scan, scan};
use crate::selector::Requester;
use crate::session::ResolutionSession;
use crate::target::{discover, is_target};
use crate::{
    Diagnostic, DiagnosticSink, Error, ErrorKind, ResolverOptions, SiteAssignment, SingletonHolder, SingletonRegistry, TargetPlan,
};

/// Resolves the dependency graph of every injection target in a declaration model.
///
/// Resolution runs in two phases. A single scan pass registers every singleton and validates
/// every provider method; the resulting [`SingletonRegistry`] is frozen and shared. Then each
/// singleton holder and each injection target is resolved in its own session. A failing
/// target never affects its siblings.
///
/// # Examples
///
/// ```
/// use wiring::Resolver;
/// use wiring_model::{Annotation, ConstructorDecl, FieldDecl, ParamDecl, SymbolTable, TypeDecl};
///
/// let model = SymbolTable::from_types([
///     TypeDecl::class("a.DependencyModel").with_constructor(ConstructorDecl::new()),
///     TypeDecl::class("a.ParentDependency")
///         .with_constructor(ConstructorDecl::new().with_param(ParamDecl::new("dependencyModel", "a.DependencyModel"))),
///     TypeDecl::class("a.Target").with_field(FieldDecl::new("dependency", "a.ParentDependency").annotated(Annotation::Inject)),
/// ])?;
///
/// let compilation = Resolver::new(&model).resolve_all();
/// let plan = &compilation.targets()[0];
///
/// let steps: Vec<_> = plan.steps().iter().map(ToString::to_string).collect();
/// assert_eq!(
///     steps,
///     [
///         "a.DependencyModel = a.DependencyModel()",
///         "a.ParentDependency = a.ParentDependency(dependencyModel)",
///     ]
/// );
/// # Ok::<(), wiring_model::Error>(())
/// ```
#[derive(Debug)]
pub struct Resolver<'a, M: ?Sized> {
    model: &'a M,
    options: ResolverOptions,
}

/// What resolving one target produced.
type Outcome = Result<TargetPlan, Failure>;

/// The result of the scan pass and of the holder sessions, before targets are resolved.
struct Prepared<'m> {
    registry: Arc<SingletonRegistry>,
    holders: Vec<SingletonHolder>,
    failures: Vec<Failure>,
    warnings: Vec<Diagnostic>,
    targets: Vec<&'m TypeDecl>,
}

impl<'a, M: DeclarationModel + ?Sized> Resolver<'a, M> {
    /// Creates a resolver with default options.
    #[must_use]
    pub fn new(model: &'a M) -> Self {
        Self {
            model,
            options: ResolverOptions::default(),
        }
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// The options every session runs with.
    #[must_use]
    pub const fn options(&self) -> &ResolverOptions {
        &self.options
    }

    fn prepare(&self) -> Prepared<'a> {
        let Scan {
            registry,
            errors,
            warnings,
        } = scan(self.model, &self.options);

        let mut failures = Vec::new();
        for (subject, error) in errors {
            record(&mut failures, subject, error);
        }

        let (holders, holder_errors) = self.resolve_holders(&registry);
        for (subject, error) in holder_errors {
            record(&mut failures, subject, error);
        }

        Prepared {
            registry: Arc::new(registry),
            holders,
            failures,
            warnings,
            targets: self.model.types().iter().filter(|decl| is_target(decl)).collect(),
        }
    }

    /// Builds one holder per singleton, then orders the holders so each comes after the holders it reads.
    fn resolve_holders(&self, registry: &SingletonRegistry) -> (Vec<SingletonHolder>, Vec<(TypeRef, Error)>) {
        let mut built = Vec::new();
        let mut errors = Vec::new();

        for entry in registry.entries() {
            let builder = GraphBuilder::for_holder(self.model, registry, &self.options, entry.declared_in().package(), entry.key());
            let mut session = ResolutionSession::default();
            builder.resolve_root(&mut session, entry.key().clone(), entry.candidate().clone());

            let (steps, depends_on, session_errors) = session.finish();
            event!(
                Level::DEBUG,
                message = "singleton holder resolved",
                singleton = %entry.key(),
                steps = steps.len(),
                errors = session_errors.len()
            );

            if session_errors.is_empty() {
                built.push(SingletonHolder::new(entry.clone(), steps, depends_on));
            } else {
                errors.extend(session_errors.into_iter().map(|error| (entry.declared_in().clone(), error)));
            }
        }

        let (holders, cycle_errors) = order_holders(built);
        errors.extend(cycle_errors);
        (holders, errors)
    }

    fn resolve_target(&self, registry: &SingletonRegistry, decl: &TypeDecl) -> Outcome {
        event!(Level::DEBUG, message = "resolving injection target", target = %decl.ty);

        let (target, mut errors) = discover(self.model, decl, &self.options);
        let builder = GraphBuilder::for_target(self.model, registry, &self.options, &target);
        let mut session = ResolutionSession::rooted_at(BindingKey::unqualified(target.ty().clone()));
        let mut assignments = Vec::with_capacity(target.sites().len());

        for site in target.sites() {
            let requester = Requester::Site(site.describe());
            if builder.resolve_dependency(&mut session, site.dependency(), &requester) {
                assignments.push(SiteAssignment::new(site.clone(), site.dependency().key().clone()));
            }
            builder.drain(&mut session);
        }

        let (steps, _, session_errors) = session.finish();
        errors.extend(session_errors);

        if errors.is_empty() {
            Ok(TargetPlan::new(
                target.ty().clone(),
                target.ancestors().to_vec(),
                target.parent_injector().cloned(),
                steps,
                assignments,
                target.location().clone(),
            ))
        } else {
            event!(
                Level::DEBUG,
                message = "injection target failed",
                target = %decl.ty,
                errors = errors.len()
            );
            Err(Failure {
                subject: decl.ty.clone(),
                errors,
            })
        }
    }
}

#[cfg(not(feature = "rayon"))]
impl<M: DeclarationModel + ?Sized> Resolver<'_, M> {
    /// Resolves every singleton holder and every injection target of the model.
    #[must_use]
    pub fn resolve_all(&self) -> CompilationPlan {
        let prepared = self.prepare();
        let outcomes: Vec<Outcome> = prepared
            .targets
            .iter()
            .map(|decl| self.resolve_target(&prepared.registry, decl))
            .collect();
        finish(prepared, outcomes)
    }
}

#[cfg(feature = "rayon")]
impl<M: DeclarationModel + Sync + ?Sized> Resolver<'_, M> {
    /// Resolves every singleton holder and every injection target of the model.
    ///
    /// With [`ResolverOptions::with_parallel`], targets are resolved on the rayon thread pool.
    /// Results keep declaration order either way.
    #[must_use]
    pub fn resolve_all(&self) -> CompilationPlan {
        let prepared = self.prepare();
        let outcomes: Vec<Outcome> = if self.options.parallel() {
            prepared
                .targets
                .par_iter()
                .map(|decl| self.resolve_target(&prepared.registry, decl))
                .collect()
        } else {
            prepared
                .targets
                .iter()
                .map(|decl| self.resolve_target(&prepared.registry, decl))
                .collect()
        };
        finish(prepared, outcomes)
    }
}

fn finish(prepared: Prepared<'_>, outcomes: Vec<Outcome>) -> CompilationPlan {
    let Prepared {
        registry,
        holders,
        mut failures,
        warnings,
        ..
    } = prepared;

    let mut targets = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(plan) => targets.push(plan),
            Err(failure) => failures.push(failure),
        }
    }

    event!(
        Level::DEBUG,
        message = "compilation resolved",
        targets = targets.len(),
        holders = holders.len(),
        failures = failures.len()
    );

    CompilationPlan {
        registry,
        holders,
        targets,
        failures,
        warnings,
    }
}

fn record(failures: &mut Vec<Failure>, subject: TypeRef, error: Error) {
    match failures.iter_mut().find(|failure| failure.subject == subject) {
        Some(failure) => failure.errors.push(error),
        None => failures.push(Failure {
            subject,
            errors: vec![error],
        }),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Orders holders depth-first in registry order; holders on an eager cycle are reported and dropped.
fn order_holders(holders: Vec<SingletonHolder>) -> (Vec<SingletonHolder>, Vec<(TypeRef, Error)>) {
    let index: HashMap<&BindingKey, usize> = holders.iter().enumerate().map(|(i, holder)| (holder.key(), i)).collect();
    let edges: Vec<Vec<usize>> = holders
        .iter()
        .map(|holder| holder.depends_on().iter().filter_map(|key| index.get(key).copied()).collect())
        .collect();

    let mut marks = vec![Mark::Unvisited; holders.len()];
    let mut on_cycle = vec![false; holders.len()];
    let mut order = Vec::with_capacity(holders.len());
    let mut errors = Vec::new();

    for root in 0..holders.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }

        // Iterative depth-first walk; each frame is (holder, index of the next edge to follow).
        let mut stack = vec![(root, 0)];
        marks[root] = Mark::Visiting;

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            frame.1 += 1;

            match edges[node].get(next).copied() {
                Some(dependency) if marks[dependency] == Mark::Unvisited => {
                    marks[dependency] = Mark::Visiting;
                    stack.push((dependency, 0));
                }
                Some(dependency) if marks[dependency] == Mark::Visiting => {
                    let start = stack.iter().position(|&(n, _)| n == dependency).unwrap_or_default();
                    let members: Vec<usize> = stack[start..].iter().map(|&(n, _)| n).collect();
                    let mut path: Vec<_> = members.iter().map(|&n| holders[n].key().clone()).collect();
                    path.push(holders[dependency].key().clone());
                    for &member in &members {
                        on_cycle[member] = true;
                    }

                    let entry = holders[dependency].entry();
                    errors.push((
                        entry.declared_in().clone(),
                        Error::new(ErrorKind::CircularDependency { path }, entry.location().clone()),
                    ));
                }
                Some(_) => {}
                None => {
                    marks[node] = Mark::Done;
                    order.push(node);
                    stack.pop();
                }
            }
        }
    }

    let mut slots: Vec<Option<SingletonHolder>> = holders.into_iter().map(Some).collect();
    let ordered = order
        .into_iter()
        .filter(|&i| !on_cycle[i])
        .filter_map(|i| slots[i].take())
        .collect();

    (ordered, errors)
}

/// Errors that stopped one injection target, singleton or provider owner from resolving.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    subject: TypeRef,
    errors: Vec<Error>,
}

impl Failure {
    /// The type whose declarations must change.
    #[must_use]
    pub const fn subject(&self) -> &TypeRef {
        &self.subject
    }

    /// Every problem found, in discovery order.
    #[must_use]
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }
}

/// Receives the resolved plans of a compilation for code generation.
///
/// Only a successful compilation is handed to an emitter; see [`CompilationPlan::emit`].
pub trait PlanEmitter {
    /// What the emitter fails with.
    type Error;

    /// Called once, before any target, with the holders in initialization order.
    ///
    /// # Errors
    ///
    /// Whatever the emitter fails with; emission stops at the first error.
    fn emit_singletons(&mut self, registry: &SingletonRegistry, holders: &[SingletonHolder]) -> Result<(), Self::Error>;

    /// Called once per resolved target, in declaration order.
    ///
    /// # Errors
    ///
    /// Whatever the emitter fails with; emission stops at the first error.
    fn emit_target(&mut self, plan: &TargetPlan) -> Result<(), Self::Error>;
}

/// Everything one resolution run produced.
#[derive(Clone, Debug)]
pub struct CompilationPlan {
    registry: Arc<SingletonRegistry>,
    holders: Vec<SingletonHolder>,
    targets: Vec<TargetPlan>,
    failures: Vec<Failure>,
    warnings: Vec<Diagnostic>,
}

impl CompilationPlan {
    /// The frozen singleton registry shared by every session.
    #[must_use]
    pub fn registry(&self) -> &Arc<SingletonRegistry> {
        &self.registry
    }

    /// Singleton holders, each listed after the holders it reads eagerly.
    #[must_use]
    pub fn holders(&self) -> &[SingletonHolder] {
        &self.holders
    }

    /// The holder of the singleton bound to `key`, if it resolved.
    #[must_use]
    pub fn holder(&self, key: &BindingKey) -> Option<&SingletonHolder> {
        self.holders.iter().find(|holder| holder.key() == key)
    }

    /// Plans of the targets that resolved, in declaration order.
    #[must_use]
    pub fn targets(&self) -> &[TargetPlan] {
        &self.targets
    }

    /// The plan of `ty`, if it resolved.
    #[must_use]
    pub fn target(&self, ty: &TypeRef) -> Option<&TargetPlan> {
        self.targets.iter().find(|plan| plan.target() == ty)
    }

    /// Everything that failed: scan-pass problems first, then holders, then targets.
    #[must_use]
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// The failure recorded for `ty`, if any.
    #[must_use]
    pub fn failure(&self, ty: &TypeRef) -> Option<&Failure> {
        self.failures.iter().find(|failure| failure.subject() == ty)
    }

    /// Non-fatal findings, such as ignored private providers.
    #[must_use]
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Whether code can be generated: nothing failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Reports every error and warning to `sink`.
    pub fn report_to(&self, mut sink: impl DiagnosticSink) {
        for failure in &self.failures {
            for error in &failure.errors {
                sink.report(Diagnostic::from(error.clone()).with_subject(failure.subject.clone()));
            }
        }
        for warning in &self.warnings {
            sink.report(warning.clone());
        }
    }

    /// Hands the holders, then each target plan, to `emitter`, and returns whether anything was emitted.
    ///
    /// A failed compilation emits nothing: a target plan may read a holder that was dropped.
    ///
    /// # Errors
    ///
    /// Returns the first error of the emitter.
    pub fn emit<E: PlanEmitter + ?Sized>(&self, emitter: &mut E) -> Result<bool, E::Error> {
        if !self.is_success() {
            event!(
                Level::DEBUG,
                message = "emission skipped",
                failures = self.failures.len()
            );
            return Ok(false);
        }

        emitter.emit_singletons(&self.registry, &self.holders)?;
        for plan in &self.targets {
            emitter.emit_target(plan)?;
        }
        Ok(true)
    }
}
