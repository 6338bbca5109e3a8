//! Local Filter CLI
//!
//! Offline tools for checking how the filter treats a saved listing page.

mod audit;
mod generate;
mod page;

use std::fs;
use std::time::Instant;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lf-cli")]
#[command(about = "Local Filter page audit tools")]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scanner over a saved HTML page
    Audit {
        /// HTML file to audit
        #[arg(short, long)]
        input: String,

        /// Highlight badged cards instead of removing them
        #[arg(long)]
        highlight: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a synthetic listing page
    Generate {
        /// Number of product cards
        #[arg(long, default_value_t = 24)]
        groups: usize,

        /// How many of the leading cards carry a badge
        #[arg(long, default_value_t = 6)]
        local: usize,

        /// Output HTML file
        #[arg(short, long, default_value = "listing.html")]
        output: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Audit {
            input,
            highlight,
            json,
        } => cmd_audit(&input, highlight, json),
        Commands::Generate {
            groups,
            local,
            output,
        } => cmd_generate(groups, local, &output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_audit(input: &str, highlight: bool, json: bool) -> Result<(), String> {
    let html = fs::read_to_string(input).map_err(|e| format!("Failed to read {input}: {e}"))?;

    let start = Instant::now();
    let report = audit::audit_html(&html, highlight);
    log::info!("Audited {input} in {:?} ({} jobs)", start.elapsed(), report.jobs_run);

    if json {
        let out = serde_json::to_string_pretty(&report).map_err(|e| format!("Failed to encode report: {e}"))?;
        println!("{out}");
    } else {
        println!("Page: {input}");
        audit::print_report(&report);
    }
    Ok(())
}

fn cmd_generate(groups: usize, local: usize, output: &str) -> Result<(), String> {
    if local > groups {
        return Err(format!("--local ({local}) exceeds --groups ({groups})"));
    }
    let html = generate::synthetic_page(groups, local);
    fs::write(output, &html).map_err(|e| format!("Failed to write {output}: {e}"))?;
    println!("Wrote {groups} cards ({local} local) to {output}");
    Ok(())
}
