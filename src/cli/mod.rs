//! CLI command definitions for remote-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::config::{BackendKind, Config};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Pull remote-config templates into a directory tree and push them back
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root holding configs/ and serviceAccountKey.json (overrides config)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Template store: firebase or file (overrides config)
    #[arg(short, long, global = true)]
    pub backend: Option<BackendKind>,

    /// Template file for the file backend (overrides config)
    #[arg(long, global = true)]
    pub template_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Fetch the remote template and write it to configs/
    Pull,

    /// Validate and publish configs/, then pull the result back
    Push,

    /// Assemble configs/ and have the backend validate it without publishing
    Validate,

    /// Print the remote template as JSON
    PrintConfig,

    /// Write the remote template, embedded JSON expanded, to one file
    PullMeta(PullMetaArgs),

    /// Bump the local remoteConfigInfo.versionNumber by one
    IncreaseVersion,

    /// Show local and remote version numbers
    GetCurrentVersionInfo,

    /// Check that the backend is reachable
    Check,
}

/// Arguments for the pull-meta command
#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct PullMetaArgs {
    /// Output file (default: <root>/config.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Apply flag overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(root) = &self.root {
            config.project.root = root.clone();
        }
        if let Some(kind) = self.backend {
            config.backend.kind = kind;
        }
        if let Some(file) = &self.template_file {
            config.backend.template_file = file.clone();
        }
    }
}
