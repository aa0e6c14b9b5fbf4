//! CLI tool for patching app package version metadata.

mod exit_codes;

use std::path::PathBuf;

use clap::Parser;

use apkbump::{PatchRequest, patch_path};
use exit_codes::{ExitCode, error_to_exit_code};

/// Patch version and package metadata inside an APK, AAB, or bare
/// compiled manifest
#[derive(Parser)]
#[command(name = "apkbump")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Package, bundle, or bare manifest file to patch in place
    path: PathBuf,

    /// The versionCode to set (0 leaves it unchanged)
    #[arg(long, value_parser = clap::value_parser!(u32).range(..=i32::MAX as i64), default_value_t = 0)]
    version_code: u32,

    /// The versionName to set (empty leaves it unchanged)
    #[arg(long, default_value = "")]
    version_name: String,

    /// The package name to set (empty leaves it unchanged)
    #[arg(long, default_value = "")]
    package: String,

    /// Suppress the per-change output lines
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let request = PatchRequest::new()
        .version_code(cli.version_code)
        .version_name(cli.version_name.clone())
        .package(cli.package.clone());

    let exit_code = run(&cli, &request);
    std::process::exit(exit_code.code());
}

fn run(cli: &Cli, request: &PatchRequest) -> ExitCode {
    match patch_path(&cli.path, request) {
        Ok(outcome) => {
            if !cli.quiet {
                for change in &outcome.changes {
                    println!("{change}");
                }
            }
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error: {e}");
            error_to_exit_code(&e)
        }
    }
}
