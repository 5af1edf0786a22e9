// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for contact gate abuse simulation.
//!
//! This module provides utilities for simulating flooding, forgery, replay
//! and injection patterns against the submission pipeline.

pub mod attacks;
pub mod generators;
pub mod metrics;
