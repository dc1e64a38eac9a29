// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::SourceLocation;

/// The result for fallible operations that use the [`Error`] type in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error raised while assembling a declaration model.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The same qualified name was declared twice.
    #[error("type `{name}` is declared twice: at {first} and at {second}")]
    DuplicateType {
        /// The qualified name.
        name: String,
        /// Where it was declared first.
        first: SourceLocation,
        /// Where it was declared again.
        second: SourceLocation,
    },
}
