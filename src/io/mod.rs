// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for frames, imports and project files.

pub mod cvat;
pub mod loader;
pub mod media;
pub mod serialization;
pub mod store;
