// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Draws from the engine's native random number generator

use ndarray::Array1;

use crate::engine::Engine;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distribution {
    Uniform { low: f64, high: f64 },
    Normal { mean: f64, variance: f64 },
}

impl Default for Distribution {
    fn default() -> Self {
        Distribution::Uniform {
            low: 0.0,
            high: 1.0,
        }
    }
}

/// Pick `n` values from a freshly seeded native generator.
pub fn native_rng_pick<E: Engine + ?Sized>(
    engine: &mut E,
    n: usize,
    seed: u64,
    distribution: Distribution,
) -> Result<Array1<f64>> {
    if n == 0 {
        return Ok(Array1::zeros(0));
    }
    let draws = engine.random_draws(seed, distribution, n)?;
    Ok(Array1::from(draws))
}
