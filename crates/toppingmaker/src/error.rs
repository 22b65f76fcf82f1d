// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for toppingmaker operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience Result type with toppingmaker Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while making or writing a project topping.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Operation exists in the API but is not implemented yet
    #[error("Not implemented: {0}")]
    #[diagnostic(
        code(toppingmaker::not_implemented),
        help("Only the project to topping direction is supported")
    )]
    NotImplemented(&'static str),

    /// Invalid YAML in a settings or project snapshot file
    #[error("Invalid YAML document: {error}")]
    #[diagnostic(
        code(toppingmaker::invalid_yaml),
        help("Check YAML syntax and ensure the 'api' field names a supported version")
    )]
    InvalidYaml {
        #[source]
        error: serde_yaml::Error,
        yaml_content: String,
    },

    /// Failed to read file
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(toppingmaker::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to write file
    #[error("Failed to write file: {path:?}")]
    #[diagnostic(
        code(toppingmaker::write_failed),
        help("Check that the target directory is writable")
    )]
    WriteFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to place a topping file into the target
    #[error("Failed to copy {from:?} to {to:?}")]
    #[diagnostic(code(toppingmaker::copy_failed))]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to serialize a document
    #[error("Failed to serialize YAML: {0}")]
    #[diagnostic(code(toppingmaker::serialize_failed))]
    Serialize(#[source] serde_yaml::Error),

    /// Unknown layer reference in a project snapshot
    #[error("Unknown layer reference: {reference}")]
    #[diagnostic(
        code(toppingmaker::unknown_layer),
        help("{}", suggestion_message(similar))
    )]
    UnknownLayer {
        reference: String,
        similar: Vec<String>,
    },

    /// Validation error
    #[error("Validation failed: {0}")]
    #[diagnostic(code(toppingmaker::validation_failed))]
    ValidationFailed(String),

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(toppingmaker::io_error))]
    Io(#[from] std::io::Error),
}

fn suggestion_message(similar: &[String]) -> String {
    if similar.is_empty() {
        "Check that the layer is listed under 'layers'".to_string()
    } else {
        format!("Did you mean one of: {}?", similar.join(", "))
    }
}
