// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use wiring_model::{BindingKey, SourceLocation, TypeRef};

use crate::finder::Found;
use crate::{Candidate, Error, ErrorKind, Result, SingletonRegistry};

/// Who asked for a key, for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Requester {
    /// An injection site, already described.
    Site(String),
    Constructor { ty: TypeRef, parameter: String },
    Method { owner: TypeRef, method: String, parameter: String },
}

impl Requester {
    /// The requester of the parameters of `candidate`.
    pub(crate) fn of_param(candidate: &Candidate, parameter: &str) -> Self {
        match candidate {
            Candidate::ConstructorCall { ty, .. } | Candidate::ImplementationOf { concrete: ty, .. } => Self::Constructor {
                ty: ty.clone(),
                parameter: parameter.to_owned(),
            },
            Candidate::FactoryMethod { owner, method, .. } => Self::Method {
                owner: owner.clone(),
                method: method.clone(),
                parameter: parameter.to_owned(),
            },
            Candidate::SingletonRef { underlying, .. } => Self::of_param(underlying, parameter),
            Candidate::TargetField { owner, .. } => Self::Site(format!("field of `{owner}`")),
            Candidate::TargetInstance { target } => Self::Site(format!("`{target}`")),
            Candidate::Indirect { key, .. } => Self::Site(format!("`{key}`")),
        }
    }
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Site(description) => f.write_str(description),
            Self::Constructor { ty, parameter } => write!(f, "parameter `{parameter}` of the `{ty}` constructor"),
            Self::Method { owner, method, parameter } => write!(f, "parameter `{parameter}` of `{owner}.{method}`"),
        }
    }
}

/// Picks exactly one candidate for `key`, or explains why there is none.
///
/// Target fields beat provider methods, which beat implementation scans, which beat
/// constructors. Among constructors, an `@Inject` constructor with parameters wins over the
/// no-argument one when the finder picks the constructor of a type. Candidates that tie at the
/// winning level are ambiguous. A winner that is registered as a singleton is read through
/// its holder.
pub(crate) fn select(
    key: &BindingKey,
    found: Found,
    registry: &SingletonRegistry,
    requester: &Requester,
    location: &SourceLocation,
) -> Result<Candidate> {
    let Found {
        mut candidates,
        unconstructible,
    } = found;

    let Some(best) = candidates.iter().map(Candidate::precedence).min() else {
        return Err(Error::new(no_candidate(key, unconstructible, requester), location.clone()));
    };

    candidates.retain(|candidate| candidate.precedence() == best);

    if candidates.len() > 1 {
        return Err(Error::new(
            ErrorKind::AmbiguousBinding {
                key: key.clone(),
                competitors: candidates.iter().map(Candidate::competitor_name).collect(),
            },
            location.clone(),
        ));
    }

    let Some(winner) = candidates.pop() else {
        return Err(Error::new(no_candidate(key, unconstructible, requester), location.clone()));
    };

    Ok(through_registry(key, winner, registry))
}

fn no_candidate(key: &BindingKey, unconstructible: Option<TypeRef>, requester: &Requester) -> ErrorKind {
    match requester {
        Requester::Constructor { ty, parameter } if key.ty.is_primitive() => ErrorKind::UnsupportedConstructorParameters {
            ty: ty.clone(),
            parameter: parameter.clone(),
            parameter_type: key.ty.clone(),
        },
        _ => ErrorKind::NoCandidateFound {
            key: key.clone(),
            requester: requester.to_string(),
            reason: unconstructible.map(|ty| format!("`{ty}` has no usable constructor")),
        },
    }
}

fn through_registry(key: &BindingKey, winner: Candidate, registry: &SingletonRegistry) -> Candidate {
    let cache_key = match &winner {
        Candidate::ImplementationOf { concrete, .. } => registry.get(&key.with_type(concrete.clone())),
        _ => registry.get(key).filter(|entry| entry.candidate() == &winner),
    }
    .map(|entry| entry.key().clone());

    match cache_key {
        Some(cache_key) => Candidate::SingletonRef {
            underlying: Box::new(winner),
            cache_key,
        },
        None => winner,
    }
}
