// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for collaborator failures.
//!
//! Geometry rejections and missing frame data are not errors; they are
//! reported as "nothing committed" or an empty rectangle list. Everything
//! here is a failure the user should see.

use thiserror::Error;

/// Errors raised while importing external annotation files.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The document is not well-formed XML.
    #[error("XML parsing error at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// An attribute could not be decoded.
    #[error("Malformed attribute in <{element}>: {message}")]
    Attribute { element: String, message: String },

    /// The import file could not be read.
    #[error("Failed to read import file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by project persistence.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid project YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// No project stored under this id.
    #[error("Project not found: {0}")]
    NotFound(String),

    #[error("Unsupported file extension: {0}")]
    UnsupportedFormat(String),
}

/// Errors raised while loading frame images.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to decode image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No frames found")]
    Empty,

    /// The single readiness timeout elapsed.
    #[error("Timed out after {0:?} waiting for media")]
    TimedOut(std::time::Duration),

    /// The loader thread went away without answering.
    #[error("Media loader stopped before finishing")]
    Disconnected,

    /// A saved session could not be read.
    #[error("Session load failed: {0}")]
    Storage(#[from] StorageError),
}

/// Errors reported by an external detector.
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Detector unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Result type alias for detection requests.
pub type DetectionResult<T> = Result<T, DetectionError>;
