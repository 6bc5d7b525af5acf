use clap::Args;
use levelfix::batch::{process_batch, BatchInput, FileStatus};
use levelfix::config::AppConfig;
use levelfix::error::AppError;
use levelfix::repair::Repairer;
use levelfix::report::render_csv;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct LocalBatchArgs {
    /// XML files to repair
    #[arg(required = true)]
    pub(crate) paths: Vec<PathBuf>,
    /// Write repaired documents into this directory
    #[arg(long)]
    pub(crate) out_dir: Option<PathBuf>,
    /// Write the per-file report as CSV to this path
    #[arg(long)]
    pub(crate) report: Option<PathBuf>,
}

/// Runs the repair engine over local files and prints the report table
/// the HTTP surface would have returned as JSON.
pub(crate) fn run_local_batch(args: LocalBatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let repairer = Repairer::new(config.repair);

    let mut inputs = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        let content = fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        inputs.push(BatchInput { filename, content });
    }

    let result = process_batch(&repairer, inputs);

    println!(
        "{:<40} {:>8} {:>14} {:>10}",
        "File", "Status", "Modifications", "Time (s)"
    );
    for report in &result.reports {
        let status = match report.status {
            FileStatus::Success => "ok",
            FileStatus::Error => "error",
        };
        println!(
            "{:<40} {:>8} {:>14} {:>10.3}",
            report.filename, status, report.modifications, report.elapsed_seconds
        );
        if let Some(error) = &report.error {
            println!("  -> {error}");
        }
    }

    let summary = result.summary();
    println!(
        "\n{} file(s): {} repaired, {} failed, {} modification(s)",
        summary.files, summary.succeeded, summary.failed, summary.modifications
    );

    if let Some(out_dir) = &args.out_dir {
        fs::create_dir_all(out_dir)?;
        for file in &result.files {
            fs::write(out_dir.join(&file.filename), &file.content)?;
        }
        println!("Outputs written to {}", out_dir.display());
    }

    if let Some(report_path) = &args.report {
        let csv = render_csv(&result.reports)?;
        fs::write(report_path, csv)?;
        println!("Report written to {}", report_path.display());
    }

    Ok(())
}
