// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::{HashMap, VecDeque};

use wiring_model::{BindingKey, SourceLocation};

use crate::selector::Requester;
use crate::{ConstructionStep, Error};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Memo {
    Built,
    Failed,
}

/// A deferred key waiting to be built once the chain that requested it is complete.
#[derive(Debug)]
pub(crate) struct Pending {
    pub key: BindingKey,
    pub requester: Requester,
    pub location: SourceLocation,
}

/// Mutable state of resolving one target or one singleton holder.
///
/// Sessions are never shared: each one owns its memo table, its stack and the plan it is
/// flattening.
#[derive(Debug, Default)]
pub(crate) struct ResolutionSession {
    memo: HashMap<BindingKey, Memo>,
    stack: Vec<BindingKey>,
    base: usize,
    steps: Vec<ConstructionStep>,
    pending: VecDeque<Pending>,
    errors: Vec<Error>,
    singletons: Vec<BindingKey>,
    draining: bool,
}

impl ResolutionSession {
    /// A session whose stack is rooted at the injection target.
    pub(crate) fn rooted_at(root: BindingKey) -> Self {
        Self {
            stack: vec![root],
            base: 1,
            ..Self::default()
        }
    }

    pub(crate) fn memo(&self, key: &BindingKey) -> Option<Memo> {
        self.memo.get(key).copied()
    }

    pub(crate) fn is_known(&self, key: &BindingKey) -> bool {
        self.memo.contains_key(key) || self.stack.contains(key)
    }

    /// The path from the first occurrence of `key` on the stack back to `key`, if it is in progress.
    pub(crate) fn cycle_to(&self, key: &BindingKey) -> Option<Vec<BindingKey>> {
        let start = self.stack.iter().position(|entry| entry == key)?;
        let mut path = self.stack[start..].to_vec();
        path.push(key.clone());
        Some(path)
    }

    /// The whole stack followed by `key`.
    pub(crate) fn path_to(&self, key: &BindingKey) -> Vec<BindingKey> {
        let mut path = self.stack.clone();
        path.push(key.clone());
        path
    }

    /// Number of constructions in progress, not counting the target root.
    pub(crate) fn depth(&self) -> usize {
        self.stack.len() - self.base
    }

    pub(crate) fn enter(&mut self, key: BindingKey) {
        self.stack.push(key);
    }

    pub(crate) fn leave(&mut self) {
        self.stack.pop();
    }

    pub(crate) fn built(&mut self, step: ConstructionStep) {
        self.memo.insert(step.key().clone(), Memo::Built);
        self.steps.push(step);
    }

    pub(crate) fn failed(&mut self, key: BindingKey) {
        self.memo.insert(key, Memo::Failed);
    }

    pub(crate) fn error(&mut self, error: Error) {
        self.errors.push(error);
    }

    pub(crate) fn defer(&mut self, pending: Pending) {
        self.pending.push_back(pending);
    }

    pub(crate) fn next_pending(&mut self) -> Option<Pending> {
        self.pending.pop_front()
    }

    pub(crate) const fn is_draining(&self) -> bool {
        self.draining
    }

    pub(crate) fn set_draining(&mut self, draining: bool) {
        self.draining = draining;
    }

    /// Records an eager read of another singleton holder.
    pub(crate) fn reads_singleton(&mut self, holder: &BindingKey) {
        if !self.singletons.contains(holder) {
            self.singletons.push(holder.clone());
        }
    }

    pub(crate) fn finish(self) -> (Vec<ConstructionStep>, Vec<BindingKey>, Vec<Error>) {
        (self.steps, self.singletons, self.errors)
    }
}
