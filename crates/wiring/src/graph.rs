// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use tracing::{Level, event};
use wiring_model::{BindingKey, DeclarationModel, SourceLocation, TypeRef};

use crate::finder::Finder;
use crate::selector::{Requester, select};
use crate::session::{Memo, Pending, ResolutionSession};
use crate::{Candidate, ConstructionStep, Dependency, Error, ErrorKind, Indirection, ResolverOptions, SingletonRegistry, Target};

/// Expands binding keys into construction steps, depth-first and memoized.
///
/// Steps are appended in post-order, so every input precedes its dependent. A key that shows up
/// again while it is still being built is a cycle unless it is the injection target (the target
/// instance is passed in) or the edge goes through `Lazy`/`Provider` (the wrapped key is built
/// after the chain that requested it is complete).
#[derive(Debug)]
pub(crate) struct GraphBuilder<'a, M: ?Sized> {
    finder: Finder<'a, M>,
    registry: &'a SingletonRegistry,
    options: &'a ResolverOptions,
    target: Option<&'a TypeRef>,
    holder: Option<&'a BindingKey>,
}

impl<'a, M: DeclarationModel + ?Sized> GraphBuilder<'a, M> {
    /// A builder for the injector of `target`.
    pub(crate) fn for_target(model: &'a M, registry: &'a SingletonRegistry, options: &'a ResolverOptions, target: &'a Target) -> Self {
        Self {
            finder: Finder::new(model, registry, options, target.ty().package(), Some(target)),
            registry,
            options,
            target: Some(target.ty()),
            holder: None,
        }
    }

    /// A builder for the holder of the singleton `holder`, generated into `package`.
    pub(crate) fn for_holder(
        model: &'a M,
        registry: &'a SingletonRegistry,
        options: &'a ResolverOptions,
        package: &'a str,
        holder: &'a BindingKey,
    ) -> Self {
        Self {
            finder: Finder::new(model, registry, options, package, None),
            registry,
            options,
            target: None,
            holder: Some(holder),
        }
    }

    /// Resolves what one dependency needs; returns whether the dependency can be satisfied.
    pub(crate) fn resolve_dependency(&self, session: &mut ResolutionSession, dependency: &Dependency, requester: &Requester) -> bool {
        let key = dependency.key();
        if let Some(memo) = session.memo(key) {
            return memo == Memo::Built;
        }

        let inner = dependency.inner_key();
        match dependency.indirection() {
            Indirection::None => self.resolve(session, key, requester, dependency.location()),
            indirection @ (Indirection::Lazy | Indirection::Provider) => {
                if !session.is_known(inner) {
                    session.defer(Pending {
                        key: inner.clone(),
                        requester: requester.clone(),
                        location: dependency.location().clone(),
                    });
                }
                self.push(
                    session,
                    ConstructionStep::new(
                        key.clone(),
                        Candidate::Indirect {
                            indirection,
                            key: inner.clone(),
                        },
                        Vec::new(),
                        Some(inner.clone()),
                    ),
                );
                true
            }
            Indirection::WeakRef => {
                if !self.resolve(session, inner, requester, dependency.location()) {
                    session.failed(key.clone());
                    return false;
                }
                self.push(
                    session,
                    ConstructionStep::new(
                        key.clone(),
                        Candidate::Indirect {
                            indirection: Indirection::WeakRef,
                            key: inner.clone(),
                        },
                        vec![inner.clone()],
                        None,
                    ),
                );
                true
            }
        }
    }

    /// Resolves `key` and everything it eagerly needs; returns whether it can be built.
    pub(crate) fn resolve(&self, session: &mut ResolutionSession, key: &BindingKey, requester: &Requester, location: &SourceLocation) -> bool {
        if let Some(memo) = session.memo(key) {
            return memo == Memo::Built;
        }

        if let Some(target) = self.target.filter(|&target| *target == key.ty && key.qualifier.is_default()) {
            self.push(
                session,
                ConstructionStep::new(key.clone(), Candidate::TargetInstance { target: target.clone() }, Vec::new(), None),
            );
            return true;
        }

        if let Some(path) = session.cycle_to(key) {
            session.error(Error::new(ErrorKind::CircularDependency { path }, location.clone()));
            return false;
        }

        if session.depth() >= self.options.max_depth() {
            session.error(Error::new(
                ErrorKind::ResolutionTooDeep {
                    key: key.clone(),
                    max_depth: self.options.max_depth(),
                },
                location.clone(),
            ));
            session.failed(key.clone());
            return false;
        }

        let candidate = self
            .finder
            .find(key)
            .and_then(|found| select(key, found, self.registry, requester, location));

        match candidate {
            Ok(Candidate::SingletonRef { underlying, cache_key }) => self.singleton(session, key, *underlying, cache_key, location),
            Ok(candidate) => self.expand(session, key.clone(), candidate),
            Err(error) => {
                session.error(error);
                session.failed(key.clone());
                false
            }
        }
    }

    /// Builds the candidate of a singleton holder itself, then anything deferred below it.
    pub(crate) fn resolve_root(&self, session: &mut ResolutionSession, key: BindingKey, candidate: Candidate) -> bool {
        let built = self.expand(session, key, candidate);
        self.drain(session);
        built
    }

    /// Builds every key deferred behind `Lazy`/`Provider` so far.
    ///
    /// The chains that requested them are complete at this point, so a deferred key may depend
    /// on any of them without forming a cycle.
    pub(crate) fn drain(&self, session: &mut ResolutionSession) {
        session.set_draining(true);
        while let Some(pending) = session.next_pending() {
            self.resolve(session, &pending.key, &pending.requester, &pending.location);
        }
        session.set_draining(false);
    }

    fn singleton(
        &self,
        session: &mut ResolutionSession,
        key: &BindingKey,
        underlying: Candidate,
        cache_key: BindingKey,
        location: &SourceLocation,
    ) -> bool {
        if !session.is_draining() {
            if self.holder == Some(&cache_key) {
                let path = session.path_to(key);
                session.error(Error::new(ErrorKind::CircularDependency { path }, location.clone()));
                session.failed(key.clone());
                return false;
            }
            session.reads_singleton(&cache_key);
        }

        self.push(
            session,
            ConstructionStep::new(
                key.clone(),
                Candidate::SingletonRef {
                    underlying: Box::new(underlying),
                    cache_key,
                },
                Vec::new(),
                None,
            ),
        );
        true
    }

    fn expand(&self, session: &mut ResolutionSession, key: BindingKey, candidate: Candidate) -> bool {
        session.enter(key.clone());

        let mut inputs = Vec::with_capacity(candidate.params().len());
        let mut satisfied = true;
        for dependency in candidate.params() {
            let requester = Requester::of_param(&candidate, dependency.name());
            if self.resolve_dependency(session, dependency, &requester) {
                inputs.push(dependency.key().clone());
            } else {
                satisfied = false;
            }
        }

        session.leave();

        if satisfied {
            self.push(session, ConstructionStep::new(key, candidate, inputs, None));
        } else {
            session.failed(key);
        }
        satisfied
    }

    fn push(&self, session: &mut ResolutionSession, step: ConstructionStep) {
        event!(
            Level::TRACE,
            message = "construction step",
            key = %step.key(),
            candidate = %step.candidate(),
            holder = ?self.holder.map(ToString::to_string)
        );
        session.built(step);
    }
}
