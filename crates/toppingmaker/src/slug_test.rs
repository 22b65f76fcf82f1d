// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

#[rstest]
#[case("Layer One", "layer_one")]
#[case("Big Group", "big_group")]
#[case("freddys", "freddys")]
#[case("  spaced -- out  ", "spaced_out")]
#[case("Straßen/Wege (2024)", "straßen_wege_2024")]
#[case("already_slugged", "already_slugged")]
#[case("", "")]
fn test_slugify(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(slugify(input), expected);
}

#[rstest]
fn test_slugify_is_idempotent() {
    let once = slugify("Robot Style: Night");
    assert_eq!(slugify(&once), once);
}
