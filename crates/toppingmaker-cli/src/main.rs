// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! toppingmaker - project topping generator CLI

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use toppingmaker::{ExportSettings, MemoryProject};

mod cmd_generate;
mod cmd_init;
mod cmd_show;

use cmd_generate::CmdGenerate;
use cmd_init::CmdInit;
use cmd_show::CmdShow;

#[derive(Parser)]
#[clap(
    name = "toppingmaker",
    about = "Project topping generator",
    version,
    long_about = "Turn the layer tree of a GIS project into a project topping and its style and layer definition files"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long)]
    quiet: bool,
}

/// Where the project and its export settings are read from.
#[derive(Parser, Clone, Debug)]
pub struct ProjectFlags {
    /// Project snapshot file
    #[clap(
        short = 'p',
        long = "project",
        env = "TOPPINGMAKER_PROJECT",
        default_value = toppingmaker::PROJECT_FILENAME
    )]
    pub project: PathBuf,

    /// Export settings file [default: toppingmaker.yaml next to the project, if any]
    #[clap(short = 's', long = "settings", env = "TOPPINGMAKER_SETTINGS")]
    pub settings: Option<PathBuf>,
}

impl ProjectFlags {
    /// Load the project and its export settings.
    ///
    /// Without an explicit settings file, `toppingmaker.yaml` next to the
    /// project is used when present and an empty registry otherwise.
    pub fn load(&self) -> Result<(MemoryProject, ExportSettings)> {
        let project = MemoryProject::load(&self.project)?;

        let settings = match &self.settings {
            Some(path) => ExportSettings::load(path)?,
            None => {
                let candidate = self
                    .project
                    .parent()
                    .unwrap_or_else(|| Path::new("."))
                    .join(toppingmaker::SETTINGS_FILENAME);
                if candidate.is_file() {
                    ExportSettings::load(&candidate)?
                } else {
                    tracing::info!(
                        path = %candidate.display(),
                        "no export settings found, nothing will be exported"
                    );
                    ExportSettings::new()
                }
            }
        };
        if let Some(path) = &settings.source_path {
            tracing::debug!(path = %path.display(), "loaded export settings");
        }

        Ok((project, settings))
    }

    /// The project file name without extension.
    pub fn project_stem(&self) -> Result<String> {
        let absolute = dunce::canonicalize(&self.project).into_diagnostic()?;
        absolute
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| miette::miette!("Project path has no file name: {:?}", self.project))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create a new toppingmaker.yaml file
    Init(CmdInit),

    /// Display the parsed layer tree and its export decisions
    Show(CmdShow),

    /// Write the project topping and its topping files
    Generate(CmdGenerate),
}

impl Opt {
    fn run(self) -> Result<i32> {
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        match self.cmd {
            Command::Init(mut cmd) => cmd.run(),
            Command::Show(mut cmd) => cmd.run(),
            Command::Generate(mut cmd) => cmd.run(),
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run()?;
    std::process::exit(code);
}
