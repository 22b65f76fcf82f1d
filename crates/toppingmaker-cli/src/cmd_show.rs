// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `toppingmaker show` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use toppingmaker::{ItemKind, LayerSource, ProjectTopping, Target, TreeItem};

/// Display the parsed layer tree and its export decisions
#[derive(Debug, Args)]
pub struct CmdShow {
    #[clap(flatten)]
    project: crate::ProjectFlags,

    /// Directory for temporary topping files
    #[clap(long, env = "TOPPINGMAKER_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Output format: tree, yaml
    #[clap(long, default_value = "tree")]
    format: String,
}

impl CmdShow {
    pub fn run(&mut self) -> Result<i32> {
        let (project, settings) = self.project.load()?;

        let mut topping = match &self.scratch_dir {
            Some(dir) => ProjectTopping::with_scratch_dir(dir),
            None => ProjectTopping::new(),
        };
        if !topping.parse(&project, &settings)? {
            eprintln!("{}", "Project has no layer tree".red());
            return Ok(1);
        }

        if self.format == "yaml" {
            self.show_yaml(&topping)?;
        } else {
            self.show_tree(&topping);
        }

        Ok(0)
    }

    fn show_tree(&self, topping: &ProjectTopping) {
        println!("{}", "Layer Tree:".bold());
        println!();

        if topping.layertree.children().is_empty() {
            println!("  {}", "(empty)".dimmed());
        }
        for item in topping.layertree.children() {
            print_item(item, 1);
        }

        let (groups, layers) = topping.layertree.count_descendants();
        println!();
        println!("Total: {groups} group(s), {layers} layer(s)");

        if !topping.mapthemes.is_empty() {
            println!();
            println!("{}", "Map Themes:".bold());
            println!();
            for (name, theme) in topping.mapthemes.iter() {
                println!("  {} ({} item(s))", name.cyan(), theme.len());
            }
        }

        if !topping.layerorder.is_empty() {
            println!();
            println!("{}", "Layer Order:".bold());
            println!();
            for (i, name) in topping.layerorder.iter().enumerate() {
                println!("  {}. {}", i + 1, name.green());
            }
        }
    }

    /// Print the document as it would be written into a target without
    /// sub directory. Topping files are placed next to the scratch files.
    fn show_yaml(&self, topping: &ProjectTopping) -> Result<()> {
        let preview_dir = topping.scratch_dir().join("preview");
        let mut target = Target::new("preview", preview_dir, "");
        let document = topping.to_document(&mut target)?;
        let yaml = serde_yaml::to_string(&document).into_diagnostic()?;
        print!("{yaml}");
        Ok(())
    }
}

fn print_item(item: &TreeItem, depth: usize) {
    let indent = "  ".repeat(depth);
    let checked = if item.checked { "[x]" } else { "[ ]" };

    let mut markers = Vec::new();
    if item.definitionfile.is_some() {
        markers.push("definition".to_string());
    }

    let name = match &item.kind {
        ItemKind::Group(group) => {
            if group.mutually_exclusive {
                markers.push(format!(
                    "mutually exclusive: {}",
                    item.mutually_exclusive_child_index()
                ));
            }
            item.name.bold()
        }
        ItemKind::Layer(layer) => {
            if layer.qmlstylefile.is_some() {
                markers.push("style".to_string());
            }
            for style_name in layer.styles.keys() {
                markers.push(format!("style '{style_name}'"));
            }
            match &layer.source {
                Some(LayerSource::Provider { provider, .. }) => {
                    markers.push(format!("source: {provider}"));
                }
                Some(LayerSource::Table {
                    tablename,
                    geometrycolumn: Some(column),
                }) => markers.push(format!("table: {tablename} ({column})")),
                Some(LayerSource::Table { tablename, .. }) => {
                    markers.push(format!("table: {tablename}"));
                }
                None => {}
            }
            if layer.featurecount {
                markers.push("featurecount".to_string());
            }
            item.name.green()
        }
    };

    if markers.is_empty() {
        println!("{indent}{checked} {name}");
    } else {
        println!(
            "{indent}{checked} {name} {}",
            format!("[{}]", markers.join(", ")).yellow()
        );
    }

    for child in item.children() {
        print_item(child, depth + 1);
    }
}
