// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Kilpi CLI - HTML Security Scanner
//!
//! Scans one HTML file, prints the report and writes the remediated document
//! back in place.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use kilpi::{Document, HttpSriHasher, RemediationConfig, Remediator, Scanner};

const DEFAULT_TARGET: &str = "../index.html";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kilpi=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    let target = match args.get(1).map(String::as_str) {
        Some("--help" | "-h") => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Some("--version" | "-V") => {
            println!("kilpi {}", kilpi::VERSION);
            return ExitCode::SUCCESS;
        }
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(DEFAULT_TARGET),
    };

    run(target).await
}

fn print_usage() {
    println!(
        r#"Kilpi - HTML Security Scanner and Remediator

USAGE:
    kilpi [PATH]

ARGS:
    PATH            HTML file to scan and fix in place (default: {})

OPTIONS:
    -h, --help      Show this help message
    -V, --version   Show version information

ENVIRONMENT:
    RUST_LOG        Log filter, e.g. kilpi=debug to include the JSON report

EXAMPLES:
    kilpi
    kilpi public/index.html
"#,
        DEFAULT_TARGET
    );
}

async fn run(target: PathBuf) -> ExitCode {
    info!("Scanning {}", target.display());

    let document = match Document::load(&target) {
        Ok(d) => d,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(1);
        }
    };

    let report = Scanner::default().scan(&document);
    println!("{}", report);

    match report.to_json() {
        Ok(json) => debug!("Report JSON:\n{}", json),
        Err(e) => debug!("Report not serializable: {}", e),
    }

    let hasher = match HttpSriHasher::new() {
        Ok(h) => Arc::new(h),
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return ExitCode::from(1);
        }
    };

    let mut remediator = Remediator::new(RemediationConfig::default(), hasher);
    let remediation = remediator.remediate(document.content(), &report).await;

    if let Err(e) = document.save(&remediation.content) {
        error!("{}", e);
        return ExitCode::from(1);
    }

    println!("{}", remediation.outcome);
    info!("Remediated {}", target.display());

    ExitCode::SUCCESS
}
