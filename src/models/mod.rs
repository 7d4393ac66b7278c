// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for annotations, layouts and projects.

pub mod annotation;
pub mod layout;
pub mod project;
