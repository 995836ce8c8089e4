// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Global cell identifiers

use core::fmt;

use serde::{Deserialize, Serialize};

/// Global identifier addressing a cell across process boundaries.
///
/// Unsigned by construction: the parallel context never hands out negative ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Gid(pub u32);

impl Gid {
    #[inline(always)]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Gid as a table value (recorder output stores ids alongside times).
    #[inline(always)]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }
}

impl From<u32> for Gid {
    fn from(value: u32) -> Self {
        Gid(value)
    }
}

impl fmt::Display for Gid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
