// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::Indirection;

const DEFAULT_MAX_DEPTH: usize = 64;

/// Processor options controlling one resolution run.
///
/// Options are built with consuming `with_*` setters. With the `serde` feature they can also be
/// deserialized, which is how a front end passes processor arguments through; absent fields
/// keep their defaults.
///
/// # Examples
///
/// ```
/// use wiring::{Indirection, ResolverOptions};
///
/// let options = ResolverOptions::default()
///     .with_max_depth(16)
///     .with_lazy_type("com.example.Deferred");
///
/// assert_eq!(options.max_depth(), 16);
/// assert_eq!(options.indirection_for("com.example.Deferred"), Some(Indirection::Lazy));
/// assert_eq!(options.indirection_for("javax.inject.Provider"), Some(Indirection::Provider));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResolverOptions {
    max_depth: usize,
    parallel: bool,
    lazy_types: Vec<String>,
    provider_types: Vec<String>,
    weak_types: Vec<String>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            parallel: false,
            lazy_types: to_strings(&["Lazy", "dagger.Lazy", "kotlin.Lazy"]),
            provider_types: to_strings(&["Provider", "javax.inject.Provider", "jakarta.inject.Provider"]),
            weak_types: to_strings(&["WeakRef", "java.lang.ref.WeakReference"]),
        }
    }
}

fn to_strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|&name| name.to_owned()).collect()
}

impl ResolverOptions {
    /// Sets how many nested construction steps one dependency chain may have.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolves independent injection targets in parallel.
    ///
    /// Only takes effect when the `rayon` feature is enabled. Output order does not depend on
    /// this setting.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Recognizes another qualified name as a `Lazy<T>` wrapper.
    #[must_use]
    pub fn with_lazy_type(mut self, name: impl Into<String>) -> Self {
        self.lazy_types.push(name.into());
        self
    }

    /// Recognizes another qualified name as a `Provider<T>` wrapper.
    #[must_use]
    pub fn with_provider_type(mut self, name: impl Into<String>) -> Self {
        self.provider_types.push(name.into());
        self
    }

    /// Recognizes another qualified name as a weak reference wrapper.
    #[must_use]
    pub fn with_weak_type(mut self, name: impl Into<String>) -> Self {
        self.weak_types.push(name.into());
        self
    }

    /// Most constructions that may be in progress below a target root.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether targets are resolved on the rayon pool.
    #[must_use]
    pub const fn parallel(&self) -> bool {
        self.parallel
    }

    /// The wrapper kind a qualified type name stands for, if any.
    #[must_use]
    pub fn indirection_for(&self, name: &str) -> Option<Indirection> {
        let is = |names: &[String]| names.iter().any(|candidate| candidate == name);

        if is(&self.lazy_types) {
            Some(Indirection::Lazy)
        } else if is(&self.provider_types) {
            Some(Indirection::Provider)
        } else if is(&self.weak_types) {
            Some(Indirection::WeakRef)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ResolverOptions::default();

        assert_eq!(options.max_depth(), 64);
        assert!(!options.parallel());
        assert_eq!(options.indirection_for("dagger.Lazy"), Some(Indirection::Lazy));
        assert_eq!(options.indirection_for("java.lang.ref.WeakReference"), Some(Indirection::WeakRef));
        assert_eq!(options.indirection_for("java.util.List"), None);
    }

    #[test]
    fn setters() {
        let options = ResolverOptions::default()
            .with_parallel(true)
            .with_provider_type("a.Factory")
            .with_weak_type("a.Weak");

        assert!(options.parallel());
        assert_eq!(options.indirection_for("a.Factory"), Some(Indirection::Provider));
        assert_eq!(options.indirection_for("a.Weak"), Some(Indirection::WeakRef));
    }
}
