// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! FRAMEMARK - frame-by-frame rectangle annotation engine.
//!
//! Rectangles are drawn per frame, carry a review status (Hold, Attack,
//! Reject) and are reconciled across independently indexed screens,
//! imported CVAT files and detector output.

pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod reconcile;
pub mod render;
pub mod store;
pub mod tool;
pub mod util;
pub mod workspace;
