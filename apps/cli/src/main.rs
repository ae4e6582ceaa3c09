use anyhow::Context;
use clap::Parser;
use modpack_installer::{ConsoleProgressReporter, DownloadConfig, InstallReport, Installer, PackError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Download a modpack and everything it needs from its project URL
#[derive(Debug, Parser)]
#[command(name = "modpack-dl", version)]
struct Cli {
    /// Project page of the modpack, e.g. https://minecraft.curseforge.com/projects/some-pack
    url: String,

    /// Also write a MultiMC instance.cfg next to the installation
    #[arg(short = 'l', long = "launcher-config")]
    launcher_config: bool,

    /// Directory to install into (defaults to the executable's directory)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Be verbose.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .init();

    match run(&cli).await {
        Ok(report) => {
            println!();
            println!("Installed {} to {}", report.manifest.display_name(), report.output_dir.display());
            println!(
                "  mods: {} downloaded ({} bytes), {} already present, {} missing",
                report.downloads.downloaded(),
                report.downloads.total_bytes(),
                report.downloads.already_present(),
                report.downloads.missing()
            );
            println!(
                "  overrides: {} copied, {} kept, {} failed",
                report.merge.copied(),
                report.merge.skipped(),
                report.merge.failures().count()
            );
            if let Some(path) = &report.launcher_config {
                println!("  launcher config: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<PackError>() {
                Some(pack_error) => {
                    eprintln!("error [{}, {:?}]: {:#}", pack_error.category(), pack_error.severity(), e);
                    if let Some(hint) = pack_error.suggestion() {
                        eprintln!("hint: {}", hint);
                    }
                }
                None => eprintln!("error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<InstallReport> {
    let mut config = DownloadConfig::from_env().context("Failed to load configuration")?;
    if let Some(output) = &cli.output {
        config.output_root = Some(output.clone());
    }

    let installer = Installer::new(config)?.with_progress(ConsoleProgressReporter::new(cli.verbose));
    // Extracted archives go away when the process is done with them
    let _cleanup = installer.scratch().cleanup_guard();

    let report = installer.run(&cli.url, cli.launcher_config).await?;
    Ok(report)
}
