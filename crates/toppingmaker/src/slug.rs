// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Filesystem friendly names for nodes, styles and projects.

use once_cell::sync::Lazy;
use regex::Regex;

#[cfg(test)]
#[path = "./slug_test.rs"]
mod slug_test;

static NON_WORD_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("slug pattern is valid"));

/// Lowercase `text` and collapse every run of characters that are not
/// letters or digits into a single underscore.
///
/// Leading and trailing separators are dropped, so `" Layer One! "` becomes
/// `"layer_one"`.
pub fn slugify(text: &str) -> String {
    NON_WORD_RUN
        .replace_all(text, "_")
        .trim_matches('_')
        .to_lowercase()
}
