// Copyright 2026 JobScout Contributors
// SPDX-License-Identifier: Apache-2.0

//! JobScout runtime library — the browser-facing half of JobScout.
//!
//! This library crate exposes the runtime modules for the `jobscout` binary
//! and for integration testing.

pub mod cli;
pub mod config;
pub mod readiness;
pub mod renderer;
pub mod rest;
pub mod session;
