//! remote-config
//!
//! Pulls a remote-config template into a diffable `configs/` tree and
//! publishes edits to that tree back to the backend.

use anyhow::Result;
use clap::Parser;
use remote_config_sync::assembler::{Assembler, increase_local_version};
use remote_config_sync::cli::{Cli, Command};
use remote_config_sync::config::{Config, ConfigLoader};
use remote_config_sync::error::SyncResult;
use remote_config_sync::logging::{LogTarget, init_logging};
use remote_config_sync::store::open_store;
use remote_config_sync::tree::ConfigLayout;
use tracing::{debug, error};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut loader = match &cli.config {
        Some(path) => ConfigLoader::load_explicit(path)?,
        None => ConfigLoader::load()?,
    };
    if let Some(path) = loader.config_path() {
        debug!(path = %path.display(), "Loaded configuration");
    }
    cli.apply_overrides(loader.config_mut());
    let config = loader.into_config();

    if let Err(e) = run(&cli.command, &config).await {
        error!(code = ?e.code(), phase = e.phase_label(), error = %e, "Command failed");
        eprintln!("remote-config [{}]: {}", e.phase_label(), e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: &Command, config: &Config) -> SyncResult<()> {
    let layout = ConfigLayout::new(config.project.configs_path());
    match command {
        // local only, no credentials needed
        Command::IncreaseVersion => increase_version(&layout),
        remote => {
            let store = open_store(
                &config.backend,
                &config.project.root,
                &config.project.service_account,
            )?;
            let assembler = Assembler::new(store.as_ref(), layout);
            run_with_store(remote, config, &assembler).await
        }
    }
}

async fn run_with_store(
    command: &Command,
    config: &Config,
    assembler: &Assembler<'_>,
) -> SyncResult<()> {
    match command {
        Command::Pull => {
            let summary = assembler.pull().await?;
            println!(
                "pulled template {} ({} parameters, {} groups) into {}",
                summary.etag,
                summary.parameters,
                summary.groups,
                assembler.layout().root().display()
            );
        }
        Command::Push => {
            let summary = assembler.publish().await?;
            println!("published template {}", summary.etag);
            if let Some(version) = summary.template_version {
                println!("template version: {}", version);
            }
            match summary.remote_config_version {
                Some(version) => println!("remoteConfigInfo.versionNumber: {}", version),
                None => println!("remoteConfigInfo.versionNumber was not bumped"),
            }
        }
        Command::Validate => {
            assembler.assemble_and_validate().await?;
            println!("template is valid");
        }
        Command::PrintConfig => {
            println!("{}", assembler.render_remote().await?);
        }
        Command::PullMeta(args) => {
            let path = args
                .output
                .clone()
                .unwrap_or_else(|| config.project.meta_path());
            let etag = assembler.pull_meta(&path).await?;
            println!("wrote template {} to {}", etag, path.display());
        }
        Command::GetCurrentVersionInfo => {
            let info = assembler.version_info().await?;
            println!("local remoteConfigInfo.versionNumber: {}", show(info.local));
            println!("remote remoteConfigInfo.versionNumber: {}", show(info.remote));
            println!("remote template version: {}", show(info.template_version));
            println!("remote etag: {}", info.etag);
        }
        Command::Check => {
            let latest = assembler.check().await?;
            match latest.as_ref().and_then(|v| v.number()) {
                Some(version) => println!("backend is reachable, latest version {}", version),
                None => println!("backend is reachable, no published versions"),
            }
        }
        Command::IncreaseVersion => increase_version(assembler.layout())?,
    }
    Ok(())
}

fn increase_version(layout: &ConfigLayout) -> SyncResult<()> {
    let next = increase_local_version(layout)?;
    println!("remoteConfigInfo.versionNumber is now {}", next);
    Ok(())
}

fn show(value: Option<i64>) -> String {
    value.map_or_else(|| "none".to_string(), |v| v.to_string())
}
