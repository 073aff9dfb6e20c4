//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Enhance
//!
//! ```text
//! 001 cat.jpg → enhanced_cat_1700000000123.jpg
//!     Source: photos/cat.jpg
//! 002 broken.png
//!     Failed: Processing failed: Decode failed: ...
//!
//! Enhanced 1 of 2 images → public/results
//! ```
//!
//! ## Bundle
//!
//! ```text
//! Bundled 3 files (1.2 MB) → enhanced_images.zip
//! ```
//!
//! ## Serve
//!
//! ```text
//! retouch listening on http://0.0.0.0:3000
//!     Uploads: public/uploads
//!     Results: public/results
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::config::ServerConfig;
use crate::types::ProcessedFile;
use std::path::{Path, PathBuf};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn human_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Outcome of enhancing one input file from the CLI.
#[derive(Debug)]
pub struct EnhanceReport {
    pub source: PathBuf,
    pub result: Result<ProcessedFile, String>,
}

pub fn format_enhance_report(reports: &[EnhanceReport], results_dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, report) in reports.iter().enumerate() {
        let name = report
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| report.source.display().to_string());
        match &report.result {
            Ok(processed) => {
                lines.push(format!(
                    "{} {} → {}",
                    format_index(i + 1),
                    name,
                    processed.enhanced
                ));
                lines.push(format!("{}Source: {}", indent(1), report.source.display()));
            }
            Err(message) => {
                lines.push(format!("{} {}", format_index(i + 1), name));
                lines.push(format!("{}Failed: {}", indent(1), message));
            }
        }
    }

    let ok = reports.iter().filter(|r| r.result.is_ok()).count();
    lines.push(String::new());
    lines.push(format!(
        "Enhanced {} of {} images → {}",
        ok,
        reports.len(),
        results_dir.display()
    ));
    lines
}

pub fn print_enhance_report(reports: &[EnhanceReport], results_dir: &Path) {
    for line in format_enhance_report(reports, results_dir) {
        println!("{}", line);
    }
}

pub fn format_bundle_summary(files: usize, bytes: usize, destination: &Path) -> Vec<String> {
    vec![format!(
        "Bundled {} {} ({}) → {}",
        files,
        if files == 1 { "file" } else { "files" },
        human_bytes(bytes),
        destination.display()
    )]
}

pub fn print_bundle_summary(files: usize, bytes: usize, destination: &Path) {
    for line in format_bundle_summary(files, bytes, destination) {
        println!("{}", line);
    }
}

pub fn format_serve_banner(config: &ServerConfig) -> Vec<String> {
    vec![
        format!("retouch listening on http://{}", config.server.address()),
        format!("{}Uploads: {}", indent(1), config.storage.uploads_dir.display()),
        format!("{}Results: {}", indent(1), config.storage.results_dir.display()),
    ]
}

pub fn print_serve_banner(config: &ServerConfig) {
    for line in format_serve_banner(config) {
        println!("{}", line);
    }
}
