// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Synapse type definitions

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Weight used by the wiring primitives when the caller does not give one.
pub const DEFAULT_WEIGHT: f64 = 0.0;

/// Synapse namespace on a target cell.
///
/// The conventional pair is excitatory/inhibitory; cell types generated from
/// 9ML models may declare arbitrary namespaces, which are carried as `Named`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SynapseType {
    Excitatory,
    Inhibitory,
    Named(String),
}

impl SynapseType {
    /// Default synapse type for a weight: non-negative weights excite.
    pub fn for_weight(weight: f64) -> Self {
        if weight >= 0.0 {
            SynapseType::Excitatory
        } else {
            SynapseType::Inhibitory
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SynapseType::Excitatory => "excitatory",
            SynapseType::Inhibitory => "inhibitory",
            SynapseType::Named(name) => name.as_str(),
        }
    }

    pub fn is_inhibitory(&self) -> bool {
        matches!(self, SynapseType::Inhibitory)
    }
}

impl fmt::Display for SynapseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("synapse type name must not be empty")]
pub struct SynapseTypeParseError;

impl FromStr for SynapseType {
    type Err = SynapseTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(SynapseTypeParseError),
            "excitatory" => Ok(SynapseType::Excitatory),
            "inhibitory" => Ok(SynapseType::Inhibitory),
            other => Ok(SynapseType::Named(other.to_string())),
        }
    }
}

impl From<SynapseType> for String {
    fn from(value: SynapseType) -> Self {
        value.as_str().to_string()
    }
}

impl TryFrom<String> for SynapseType {
    type Error = SynapseTypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
