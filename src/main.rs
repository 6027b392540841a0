use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use odsmerge::assemble::DEFAULT_SHEET;
use odsmerge::render::{self, DEFAULT_CONVERTER};
use odsmerge::{AssemblyConfig, assemble};

/// Build one ODS document from a block template and a CSV of orders.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Directory holding the default in/ and out/ folders
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// Input CSV [default: <base-dir>/in/input.csv]
    #[arg(long)]
    input: Option<PathBuf>,

    /// Template ODS [default: <base-dir>/in/templates.ods]
    #[arg(long)]
    template: Option<PathBuf>,

    /// Output ODS [default: <base-dir>/out/output.ods]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Audit log, appended to [default: <base-dir>/out/log.txt]
    #[arg(long)]
    log: Option<PathBuf>,

    /// Sheet holding the master block
    #[arg(long, default_value = DEFAULT_SHEET)]
    sheet: String,

    /// Convert the output to PDF next to it once it is written
    #[arg(long)]
    render: bool,

    /// Converter executable used by --render
    #[arg(long, default_value = DEFAULT_CONVERTER)]
    converter: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let defaults = AssemblyConfig::from_base_dir(&cli.base_dir);
    let config = AssemblyConfig {
        input: cli.input.unwrap_or(defaults.input),
        template: cli.template.unwrap_or(defaults.template),
        output: cli.output.unwrap_or(defaults.output),
        log: cli.log.unwrap_or(defaults.log),
        sheet: cli.sheet,
    };

    if !config.input.exists() {
        eprintln!("Input CSV not found: {}", config.input.display());
        return ExitCode::FAILURE;
    }

    let report = match assemble(&config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    println!(
        "Wrote {} ({} records, {} anomalies) in {:.2}s",
        report.output.display(),
        report.records,
        report.anomalies,
        report.elapsed.as_secs_f64()
    );

    if cli.render {
        let out_dir = config
            .output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        match render::convert(&cli.converter, &config.output, &out_dir) {
            Ok(pdf) => println!("Rendered {}", pdf.display()),
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
