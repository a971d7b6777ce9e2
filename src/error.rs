// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use chrono::{DateTime, Utc};
use std::error::Error as StdError;
use thiserror::Error;

/// Convenience type alias for errors returned by caller-supplied closures.
pub type BoxDynError = Box<dyn StdError + 'static + Send + Sync>;

/// The error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid uuid string representation: `{0}`")]
    InvalidFormat(String),
    #[error("invalid hexadecimal string: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("instant `{0}` cannot be expressed as a 60-bit gregorian timestamp")]
    TimestampOutOfRange(DateTime<Utc>),
    #[error("node id must be 6 bytes long, got {0}")]
    InvalidNodeId(usize),
    #[error("node_id returned an error: {0}")]
    NodeIdFailed(#[source] BoxDynError),
    #[error("comb interval must be at least one millisecond")]
    InvalidCombInterval,
    #[error("mutex is poisoned (i.e. a panic happened while it was locked)")]
    MutexPoisoned,
}
