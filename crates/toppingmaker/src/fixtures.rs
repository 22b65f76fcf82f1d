// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Shared test projects.

use rstest::fixture;

use crate::memory::{MemoryLayer, MemoryProject};
use crate::settings::{ExportSettings, ToppingType};

pub(crate) const MEMORY_SOURCE: &str = "point?crs=epsg:4326&field=id:integer";

/// Five layers, each linked twice:
///
/// ```text
/// Big Group
///   Layer One
///   Medium Group
///     Layer Two
///     Small Group
///       Layer Three
///       Layer Four
///     Layer Five
/// All of em
///   Layer One (unchecked)
///   Layer Two
///   Layer Three (unchecked)
///   Layer Four
///   Layer Five
/// ```
#[fixture]
pub(crate) fn freddys_project() -> MemoryProject {
    let mut project = MemoryProject::new();
    let l1 = project.add_map_layer(MemoryLayer::new("Layer One", "memory", MEMORY_SOURCE));
    let l2 = project.add_map_layer(MemoryLayer::new("Layer Two", "memory", MEMORY_SOURCE));
    let l3 = project.add_map_layer(MemoryLayer::new("Layer Three", "memory", MEMORY_SOURCE));
    let l4 = project.add_map_layer(MemoryLayer::new("Layer Four", "memory", MEMORY_SOURCE));
    let l5 = project.add_map_layer(MemoryLayer::new("Layer Five", "memory", MEMORY_SOURCE));

    let root = project.layer_tree_root_mut();
    let big = root.add_group("Big Group");
    big.add_layer(&l1);
    let medium = big.add_group("Medium Group");
    medium.add_layer(&l2);
    let small = medium.add_group("Small Group");
    small.add_layer(&l3);
    small.add_layer(&l4);
    medium.add_layer(&l5);

    let all = root.add_group("All of em");
    all.add_layer(&l1).set_item_visibility_checked(false);
    all.add_layer(&l2);
    all.add_layer(&l3).set_item_visibility_checked(false);
    all.add_layer(&l4);
    all.add_layer(&l5);

    project
}

/// Styles for Layer One, Three and Five, definitions for Layer Three, Four
/// and Five, sources for Layer One, Two and Three.
#[fixture]
pub(crate) fn freddys_settings() -> ExportSettings {
    let mut settings = ExportSettings::new();
    for name in ["Layer One", "Layer Three", "Layer Five"] {
        settings.set_setting_values(ToppingType::QmlStyle, name, true, None, None);
    }
    for name in ["Layer Three", "Layer Four", "Layer Five"] {
        settings.set_setting_values(ToppingType::Definition, name, true, None, None);
    }
    for name in ["Layer One", "Layer Two", "Layer Three"] {
        settings.set_setting_values(ToppingType::Source, name, true, None, None);
    }
    settings
}
