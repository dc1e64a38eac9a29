// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashSet;
use std::fmt;

use wiring_model::{BindingKey, SourceLocation, TypeRef};

use crate::{Candidate, InjectionSite, SingletonEntry};

/// One construction in a plan: how to produce the value of `key`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructionStep {
    key: BindingKey,
    candidate: Candidate,
    inputs: Vec<BindingKey>,
    deferred: Option<BindingKey>,
}

impl ConstructionStep {
    pub(crate) const fn new(key: BindingKey, candidate: Candidate, inputs: Vec<BindingKey>, deferred: Option<BindingKey>) -> Self {
        Self {
            key,
            candidate,
            inputs,
            deferred,
        }
    }

    /// The key this step produces.
    #[must_use]
    pub const fn key(&self) -> &BindingKey {
        &self.key
    }

    /// How the value is produced.
    #[must_use]
    pub const fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    /// Keys whose values must exist before this step runs, in parameter order.
    #[must_use]
    pub fn inputs(&self) -> &[BindingKey] {
        &self.inputs
    }

    /// The key a `Lazy`/`Provider` closure builds on first use.
    ///
    /// This is not an ordering edge: the closure may capture a value that is built later.
    #[must_use]
    pub const fn deferred(&self) -> Option<&BindingKey> {
        self.deferred.as_ref()
    }
}

impl fmt::Display for ConstructionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.key, self.candidate)
    }
}

/// An injection site and the step whose value it receives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteAssignment {
    site: InjectionSite,
    value: BindingKey,
}

impl SiteAssignment {
    pub(crate) const fn new(site: InjectionSite, value: BindingKey) -> Self {
        Self { site, value }
    }

    /// The receiving site.
    #[must_use]
    pub const fn site(&self) -> &InjectionSite {
        &self.site
    }

    /// The key of the step whose value the site receives.
    #[must_use]
    pub const fn value(&self) -> &BindingKey {
        &self.value
    }
}

fn is_ordered(steps: &[ConstructionStep]) -> bool {
    let mut built: HashSet<&BindingKey> = HashSet::new();
    steps
        .iter()
        .all(|step| step.inputs.iter().all(|input| built.contains(input)) && built.insert(&step.key))
}

/// The resolved injector of one target.
///
/// Steps are in dependency order: every input of a step is the key of an earlier step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetPlan {
    target: TypeRef,
    ancestors: Vec<TypeRef>,
    parent_injector: Option<TypeRef>,
    steps: Vec<ConstructionStep>,
    assignments: Vec<SiteAssignment>,
    location: SourceLocation,
}

impl TargetPlan {
    pub(crate) const fn new(
        target: TypeRef,
        ancestors: Vec<TypeRef>,
        parent_injector: Option<TypeRef>,
        steps: Vec<ConstructionStep>,
        assignments: Vec<SiteAssignment>,
        location: SourceLocation,
    ) -> Self {
        Self {
            target,
            ancestors,
            parent_injector,
            steps,
            assignments,
            location,
        }
    }

    /// The injection target.
    #[must_use]
    pub const fn target(&self) -> &TypeRef {
        &self.target
    }

    /// Superclasses from the root down to the direct parent.
    #[must_use]
    pub fn ancestors(&self) -> &[TypeRef] {
        &self.ancestors
    }

    /// The ancestor injector to call before assigning this target's own sites.
    #[must_use]
    pub const fn parent_injector(&self) -> Option<&TypeRef> {
        self.parent_injector.as_ref()
    }

    /// Steps in construction order.
    #[must_use]
    pub fn steps(&self) -> &[ConstructionStep] {
        &self.steps
    }

    /// The step producing `key`, if the plan has one.
    #[must_use]
    pub fn step(&self, key: &BindingKey) -> Option<&ConstructionStep> {
        self.steps.iter().find(|step| &step.key == key)
    }

    /// One assignment per injection site, in site order.
    #[must_use]
    pub fn assignments(&self) -> &[SiteAssignment] {
        &self.assignments
    }

    /// Where the target is declared.
    #[must_use]
    pub const fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Singletons this target reads, in first-use order.
    pub fn singletons(&self) -> impl Iterator<Item = &BindingKey> {
        self.steps.iter().filter_map(|step| step.candidate.singleton_key())
    }

    /// Whether every step's inputs are produced by earlier steps and no key is built twice.
    #[must_use]
    pub fn is_topologically_ordered(&self) -> bool {
        is_ordered(&self.steps)
    }
}

impl fmt::Display for TargetPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inject {}", self.target)?;
        if let Some(parent) = &self.parent_injector {
            write!(f, " after {parent}")?;
        }
        writeln!(f)?;

        for step in &self.steps {
            writeln!(f, "  {step}")?;
        }
        for assignment in &self.assignments {
            writeln!(f, "  {} <- {}", assignment.site, assignment.value)?;
        }
        Ok(())
    }
}

/// The generated holder of one singleton: the chain that builds it, emitted once per compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingletonHolder {
    entry: SingletonEntry,
    steps: Vec<ConstructionStep>,
    depends_on: Vec<BindingKey>,
}

impl SingletonHolder {
    pub(crate) const fn new(entry: SingletonEntry, steps: Vec<ConstructionStep>, depends_on: Vec<BindingKey>) -> Self {
        Self { entry, steps, depends_on }
    }

    /// The registration this holder was generated for.
    #[must_use]
    pub const fn entry(&self) -> &SingletonEntry {
        &self.entry
    }

    /// The key identifying this holder.
    #[must_use]
    pub const fn key(&self) -> &BindingKey {
        self.entry.key()
    }

    /// The type the holder caches.
    #[must_use]
    pub const fn ty(&self) -> &TypeRef {
        self.entry.ty()
    }

    /// Steps building the instance; the last one produces the singleton itself.
    #[must_use]
    pub fn steps(&self) -> &[ConstructionStep] {
        &self.steps
    }

    /// Holders that must be initialized first, because this chain reads them eagerly.
    #[must_use]
    pub fn depends_on(&self) -> &[BindingKey] {
        &self.depends_on
    }

    /// Whether every step comes after the steps producing its inputs.
    #[must_use]
    pub fn is_topologically_ordered(&self) -> bool {
        is_ordered(&self.steps)
    }
}

impl fmt::Display for SingletonHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "singleton {}", self.entry.key())?;
        for step in &self.steps {
            writeln!(f, "  {step}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(key: &str, inputs: &[&str]) -> ConstructionStep {
        ConstructionStep::new(
            BindingKey::unqualified(key),
            Candidate::ConstructorCall {
                ty: TypeRef::new(key),
                params: Vec::new(),
            },
            inputs.iter().map(|&input| BindingKey::unqualified(input)).collect(),
            None,
        )
    }

    fn plan(steps: Vec<ConstructionStep>) -> TargetPlan {
        TargetPlan::new(TypeRef::new("a.Main"), Vec::new(), None, steps, Vec::new(), SourceLocation::default())
    }

    #[test]
    fn ordering_check() {
        assert!(plan(vec![step("a.A", &[]), step("a.B", &["a.A"])]).is_topologically_ordered());
        assert!(!plan(vec![step("a.B", &["a.A"]), step("a.A", &[])]).is_topologically_ordered());
        assert!(!plan(vec![step("a.A", &[]), step("a.A", &[])]).is_topologically_ordered());
    }

    #[test]
    fn deferred_keys_are_not_inputs() {
        let lazy = ConstructionStep::new(
            BindingKey::unqualified("Lazy"),
            Candidate::Indirect {
                indirection: crate::Indirection::Lazy,
                key: BindingKey::unqualified("a.B"),
            },
            Vec::new(),
            Some(BindingKey::unqualified("a.B")),
        );

        let plan = plan(vec![lazy, step("a.B", &[])]);

        assert!(plan.is_topologically_ordered());
        assert_eq!(plan.steps()[0].deferred(), Some(&BindingKey::unqualified("a.B")));
    }

    #[test]
    fn lookup_and_rendering() {
        let plan = plan(vec![step("a.A", &[])]);

        assert!(plan.step(&BindingKey::unqualified("a.A")).is_some());
        assert!(plan.step(&BindingKey::unqualified("a.B")).is_none());
        assert_eq!(plan.to_string(), "inject a.Main\n  a.A = a.A()\n");
    }
}
