//! `gsx_info`: import Gaussian-splat PLY files and print a summary of each.
//!
//! Run with: cargo run --release -- scene.ply [more.ply ...] [--json]

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use gsx_core::import::{import_ply_with, ImportOptions};
use gsx_core::progress::LogProgress;
use gsx_core::{ErrorKind, GaussianScene, PackedScene, RestOrder};

const USAGE: &str = "\
Usage: gsx_info <file.ply>... [options]

Options:
  --json                    Print one JSON document instead of text
  --channel-major           Read f_rest columns as r.. g.. b.. runs
  --progress-interval <N>   Records between progress reports (default 4096)
  -h, --help                Show this message";

struct Args {
    files: Vec<PathBuf>,
    json: bool,
    options: ImportOptions,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Option<Args>> {
    let mut parsed = Args {
        files: Vec::new(),
        json: false,
        options: ImportOptions::default(),
    };

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--json" => parsed.json = true,
            "--channel-major" => parsed.options.rest_order = RestOrder::ChannelMajor,
            "--progress-interval" => {
                let value = args
                    .next()
                    .context("--progress-interval needs a value")?;
                parsed.options.progress_interval = value
                    .parse()
                    .with_context(|| format!("Invalid progress interval: {}", value))?;
            }
            flag if flag.starts_with("--") => bail!("Unknown option: {}\n\n{}", flag, USAGE),
            _ => parsed.files.push(PathBuf::from(&arg)),
        }
    }

    if parsed.files.is_empty() {
        return Ok(None);
    }
    Ok(Some(parsed))
}

#[derive(Serialize)]
struct SceneSummary {
    path: PathBuf,
    name: String,
    gaussians: usize,
    sh_dim: u32,
    sh_dim_exact: bool,
    sh_coefficients_count: usize,
    bounds_min: Option<[f32; 3]>,
    bounds_max: Option<[f32; 3]>,
    /// `None` when the scene is too large for 32-bit shader constants
    packed_bytes: Option<usize>,
}

impl SceneSummary {
    fn new(path: &Path, scene: &GaussianScene) -> Self {
        let bounds = scene.bounds();
        let (bounds_min, bounds_max) = if bounds.is_empty() {
            (None, None)
        } else {
            (Some(bounds.min().to_array()), Some(bounds.max().to_array()))
        };
        Self {
            path: path.to_path_buf(),
            name: scene.name().to_string(),
            gaussians: scene.len(),
            sh_dim: scene.sh_dim(),
            sh_dim_exact: scene.layout().is_exact_degree(),
            sh_coefficients_count: scene.sh_coefficients_count(),
            bounds_min,
            bounds_max,
            packed_bytes: PackedScene::pack(scene).ok().map(|p| p.total_bytes()),
        }
    }

    fn print(&self) {
        println!("=== {} ===", self.path.display());
        println!("  Gaussians: {}", self.gaussians);
        println!(
            "  SH degree: {}{}",
            self.sh_dim,
            if self.sh_dim_exact { "" } else { " (approximate)" }
        );
        println!("  Coefficients per channel: {}", self.sh_coefficients_count);
        if let (Some(min), Some(max)) = (self.bounds_min, self.bounds_max) {
            println!("  Min: ({:.2}, {:.2}, {:.2})", min[0], min[1], min[2]);
            println!("  Max: ({:.2}, {:.2}, {:.2})", max[0], max[1], max[2]);
        }
        match self.packed_bytes {
            Some(bytes) => println!(
                "  Packed GPU buffers: {:.2} MiB",
                bytes as f64 / (1024.0 * 1024.0)
            ),
            None => println!("  Packed GPU buffers: too large to pack"),
        }
    }
}

#[derive(Serialize)]
struct FailureSummary {
    path: PathBuf,
    kind: ErrorKind,
    message: String,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum FileReport {
    Imported(SceneSummary),
    Failed(FailureSummary),
}

fn inspect(path: &Path, options: &ImportOptions) -> FileReport {
    let mut progress = LogProgress::new(path.display().to_string());
    match import_ply_with(path, options, &mut progress) {
        Ok(scene) => FileReport::Imported(SceneSummary::new(path, &scene)),
        Err(e) => FileReport::Failed(FailureSummary {
            path: e.path.clone(),
            kind: e.kind(),
            message: e.source.to_string(),
        }),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let Some(args) = parse_args(env::args().skip(1))? else {
        println!("{}", USAGE);
        return Ok(());
    };

    let reports: Vec<FileReport> = args
        .files
        .iter()
        .map(|path| inspect(path, &args.options))
        .collect();

    if args.json {
        let json = serde_json::to_string_pretty(&reports).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        for report in &reports {
            match report {
                FileReport::Imported(summary) => summary.print(),
                FileReport::Failed(failure) => eprintln!(
                    "=== {} ===\n  Failed ({}): {}",
                    failure.path.display(),
                    failure.kind,
                    failure.message
                ),
            }
        }
    }

    let failed = reports
        .iter()
        .filter(|r| matches!(r, FileReport::Failed(_)))
        .count();
    if failed > 0 {
        bail!("{} of {} files failed to import", failed, reports.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_flags() {
        let parsed = parse_args(args(&[
            "a.ply",
            "--json",
            "--channel-major",
            "--progress-interval",
            "16",
            "b.ply",
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(parsed.files, vec![PathBuf::from("a.ply"), PathBuf::from("b.ply")]);
        assert!(parsed.json);
        assert_eq!(parsed.options.rest_order, RestOrder::ChannelMajor);
        assert_eq!(parsed.options.progress_interval, 16);
    }

    #[test]
    fn test_parse_defaults_and_help() {
        let parsed = parse_args(args(&["scene.ply"])).unwrap().unwrap();
        assert!(!parsed.json);
        assert_eq!(parsed.options, ImportOptions::default());

        assert!(parse_args(args(&[])).unwrap().is_none());
        assert!(parse_args(args(&["scene.ply", "--help"])).unwrap().is_none());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(args(&["--bogus"])).is_err());
        assert!(parse_args(args(&["a.ply", "--progress-interval"])).is_err());
        assert!(parse_args(args(&["a.ply", "--progress-interval", "ten"])).is_err());
    }

    #[test]
    fn test_failure_report_json() {
        let report = inspect(Path::new("/nonexistent/gsx/missing.ply"), &ImportOptions::default());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "io");
        assert_eq!(json["path"], "/nonexistent/gsx/missing.ply");
    }
}
