// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use neurobridge_core::{Gid, SynapseType};

use crate::engine::NetConHandle;

/// A wired connection; never modified after creation
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub pre: Gid,
    pub post: Gid,
    pub netcon: NetConHandle,
    pub synapse_type: SynapseType,
    /// Weight as applied to the netcon, after sign adjustment
    pub weight: f64,
    pub delay: f64,
}
