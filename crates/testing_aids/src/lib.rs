// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! An unpublished crate containing testing utilities for use within this repo.

mod fixtures;
mod log;

pub use fixtures::*;
pub use log::*;
