//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::{fmt, path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand, ValueEnum};
use images3_core::domain::{ResizingConfig, ResizingUnit};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name    = "images3",
    bin_name = "images3",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Image plants: resizing templates and versioned images",
    long_about = "images3 runs an image plant in-process: every input is stored \
                  through the plant's bootstrap template and then rendered \
                  through each requested template.",
    after_help = "EXAMPLES:\n\
        \x20 images3 process photo.jpg --template Thumb=128x128 --out renditions\n\
        \x20 images3 inspect photo.jpg banner.png\n\
        \x20 images3 init\n\
        \x20 images3 completions bash > /usr/share/bash-completion/completions/images3",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload images into a plant and render them through templates.
    #[command(
        visible_alias = "p",
        about = "Render images through resizing templates",
        after_help = "EXAMPLES:\n\
            \x20 images3 process a.jpg b.png --template Thumb=64x64\n\
            \x20 images3 process a.jpg --template Half=50x50%:keep --manifest\n\
            \x20 images3 process shots/*.jpg --plant Shots --out ./out --output-format json"
    )]
    Process(ProcessArgs),

    /// Print format, dimensions and size of image files.
    #[command(visible_alias = "i", about = "Inspect image files")]
    Inspect(InspectArgs),

    /// Write a default configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 images3 init           # user config directory\n\
            \x20 images3 init --local   # ./images3.toml"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 images3 completions bash > ~/.local/share/bash-completion/completions/images3\n\
            \x20 images3 completions zsh  > ~/.zfunc/_images3\n\
            \x20 images3 completions fish > ~/.config/fish/completions/images3.fish"
    )]
    Completions(CompletionsArgs),
}

// ── process ───────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProcessArgs {
    #[arg(value_name = "INPUT", required = true, help = "Image files to upload")]
    pub inputs: Vec<PathBuf>,

    #[arg(
        long = "plant",
        value_name = "NAME",
        default_value = "images3",
        help = "Name of the image plant"
    )]
    pub plant: String,

    /// Repeatable. `NAME=WxH[px|%][:keep]`, e.g. `Thumb=64x64` or `Half=50x50%:keep`.
    #[arg(
        short = 't',
        long = "template",
        value_name = "SPEC",
        help = "Template to render through (NAME=WxH[px|%][:keep])"
    )]
    pub templates: Vec<TemplateSpec>,

    #[arg(
        short = 'o',
        long = "out",
        value_name = "DIR",
        help = "Output directory (default: output.directory from config)"
    )]
    pub out: Option<PathBuf>,

    #[arg(long = "manifest", help = "Write manifest.json next to the renditions")]
    pub manifest: bool,
}

/// A template given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSpec {
    pub name: String,
    pub config: ResizingConfig,
}

impl FromStr for TemplateSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, size) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=WxH, got '{s}'"))?;
        let (size, keep) = match size.strip_suffix(":keep") {
            Some(size) => (size, true),
            None => (size, false),
        };
        let (size, unit) = if let Some(size) = size.strip_suffix('%') {
            (size, ResizingUnit::Percent)
        } else {
            (size.strip_suffix("px").unwrap_or(size), ResizingUnit::Pixel)
        };
        let (width, height) = size
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WxH, got '{size}'"))?;
        let width = width
            .trim()
            .parse()
            .map_err(|_| format!("invalid width '{width}'"))?;
        let height = height
            .trim()
            .parse()
            .map_err(|_| format!("invalid height '{height}'"))?;
        let config =
            ResizingConfig::new(unit, width, height, keep).map_err(|e| e.to_string())?;

        Ok(Self {
            name: name.to_string(),
            config,
        })
    }
}

impl fmt::Display for TemplateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.config)
    }
}

// ── inspect ───────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InspectArgs {
    #[arg(value_name = "FILE", required = true, help = "Image files to inspect")]
    pub files: Vec<PathBuf>,
}

// ── init ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InitArgs {
    #[arg(
        long = "local",
        help = "Create images3.toml in the current directory"
    )]
    pub local: bool,

    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
