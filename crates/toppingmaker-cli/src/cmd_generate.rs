// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `toppingmaker generate` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use toppingmaker::{ProjectTopping, Target, VersionedPathResolver};

/// Write the project topping and its topping files
#[derive(Debug, Args)]
pub struct CmdGenerate {
    #[clap(flatten)]
    project: crate::ProjectFlags,

    /// Project name, prefix of every topping file [default: project file name]
    #[clap(short, long, env = "TOPPINGMAKER_NAME")]
    name: Option<String>,

    /// Repository directory receiving the toppings
    #[clap(short, long, env = "TOPPINGMAKER_MAIN_DIR", default_value = ".")]
    main_dir: PathBuf,

    /// Project directory within the repository
    #[clap(long, env = "TOPPINGMAKER_SUB_DIR", default_value = "")]
    sub_dir: String,

    /// Give every topping file an id and version in the manifest
    #[clap(long, env = "TOPPINGMAKER_VERSIONED")]
    versioned: bool,

    /// Also write the manifest to FILE
    #[clap(long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Directory for temporary topping files
    #[clap(long, env = "TOPPINGMAKER_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,
}

impl CmdGenerate {
    pub fn run(&mut self) -> Result<i32> {
        let (project, settings) = self.project.load()?;

        let mut topping = match &self.scratch_dir {
            Some(dir) => ProjectTopping::with_scratch_dir(dir),
            None => ProjectTopping::new(),
        };
        if !topping.parse(&project, &settings)? {
            eprintln!("{}", "Project has no layer tree, nothing generated".red());
            return Ok(1);
        }

        let name = match &self.name {
            Some(name) => name.clone(),
            None => self.project.project_stem()?,
        };

        std::fs::create_dir_all(&self.main_dir)
            .map_err(|e| miette::miette!("Failed to create {:?}: {}", self.main_dir, e))?;
        let main_dir = dunce::canonicalize(&self.main_dir).into_diagnostic()?;

        let mut target = Target::new(name, main_dir, &self.sub_dir);
        if self.versioned {
            target = target.with_path_resolver(VersionedPathResolver);
        }

        let link = topping.generate_files(&mut target)?;

        println!("Project topping: {}", link.green());
        println!(
            "Written to {} ({} file(s))",
            target.main_dir.display().to_string().cyan(),
            target.manifest.len()
        );

        if let Some(path) = &self.manifest {
            std::fs::write(path, target.manifest_yaml()?)
                .map_err(|e| miette::miette!("Failed to write manifest {:?}: {}", path, e))?;
            println!("Manifest: {}", path.display().to_string().cyan());
        }

        Ok(0)
    }
}
