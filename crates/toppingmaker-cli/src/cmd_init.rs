// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `toppingmaker init` command.

use std::path::PathBuf;

use clap::Args;
use miette::{IntoDiagnostic, Result};
use toppingmaker::{ExportSettings, ToppingType};

#[cfg(test)]
#[path = "./cmd_init_test.rs"]
mod cmd_init_test;

/// Create a new toppingmaker.yaml file
#[derive(Debug, Args)]
pub struct CmdInit {
    /// Directory to create file in
    #[clap(default_value = ".")]
    path: PathBuf,

    /// Export the default style of a layer
    #[clap(long = "style")]
    styles: Vec<String>,

    /// Export a layer or group as layer definition
    #[clap(long = "definition")]
    definitions: Vec<String>,

    /// Write the source of a layer into the topping
    #[clap(long = "source")]
    sources: Vec<String>,

    /// Add a map theme
    #[clap(long = "maptheme")]
    mapthemes: Vec<String>,

    /// Template to use: minimal, standard
    #[clap(long, default_value = "standard")]
    template: String,
}

impl CmdInit {
    pub fn run(&mut self) -> Result<i32> {
        let settings_path = self.path.join(toppingmaker::SETTINGS_FILENAME);

        if settings_path.exists() {
            return Err(miette::miette!(
                "{} already exists at {:?}",
                toppingmaker::SETTINGS_FILENAME,
                settings_path
            ));
        }

        let content = match self.template.as_str() {
            "minimal" => self.generate_minimal_template()?,
            _ => self.generate_standard_template()?,
        };

        std::fs::create_dir_all(&self.path).into_diagnostic()?;
        std::fs::write(&settings_path, content).map_err(|e| {
            miette::miette!(
                "Failed to write {}: {}",
                toppingmaker::SETTINGS_FILENAME,
                e
            )
        })?;

        println!("Created {} at {:?}", toppingmaker::SETTINGS_FILENAME, settings_path);
        println!();
        println!("Next steps:");
        println!("  1. Edit the file to choose what gets exported");
        println!("  2. Run 'toppingmaker show' to preview the layer tree");
        println!("  3. Run 'toppingmaker generate --main-dir <repo>' to write the topping");

        Ok(0)
    }

    fn settings(&self) -> ExportSettings {
        let mut settings = ExportSettings::new();
        for name in &self.styles {
            settings.set_setting_values(ToppingType::QmlStyle, name, true, None, None);
        }
        for name in &self.definitions {
            settings.set_setting_values(ToppingType::Definition, name, true, None, None);
        }
        for name in &self.sources {
            settings.set_setting_values(ToppingType::Source, name, true, None, None);
        }
        settings.mapthemes = self.mapthemes.clone();
        settings
    }

    fn generate_minimal_template(&self) -> Result<String> {
        serde_yaml::to_string(&self.settings()).into_diagnostic()
    }

    fn generate_standard_template(&self) -> Result<String> {
        let settings = self.settings();
        let registered = serde_yaml::to_string(&settings).into_diagnostic()?;

        let mut content = String::from(
            "# toppingmaker export settings\n\
            #\n\
            # Settings are keyed by layer tree node name. Nodes without a\n\
            # setting get nothing exported.\n\
            \n",
        );
        content.push_str(&registered);

        if settings.qmlstyle.is_empty() {
            content.push_str(
                "\n\
                # Style files per layer and style name. 'default' is the\n\
                # current style, other names export the named style.\n\
                # qmlstyle:\n\
                #   Layer One:\n\
                #     default: { export: true, categories: [Symbology, Labeling] }\n\
                #     night: { export: true }\n",
            );
        }
        if settings.definition.is_empty() {
            content.push_str(
                "\n\
                # Layer definition files. A group exported this way is\n\
                # written without its children.\n\
                # definition:\n\
                #   Layer Three: { export: true }\n",
            );
        }
        if settings.source.is_empty() {
            content.push_str(
                "\n\
                # Provider and source written into the topping.\n\
                # source:\n\
                #   Layer One: { export: true }\n",
            );
        }
        if settings.mapthemes.is_empty() {
            content.push_str(
                "\n\
                # Map themes to include.\n\
                # mapthemes:\n\
                #   - Robot Theme\n",
            );
        }

        Ok(content)
    }
}
