use std::{path::PathBuf, process::ExitCode, time::Instant};

use clap::Parser;
use fontsniff::{FontDetectorBuilder, FontMetrics, TsvTokens};
use serde_json::json;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[derive(Parser)]
#[command(name = "fontsniff")]
#[command(about = "Guess whether an image's text is set in a rounded, irregular-baseline font")]
struct Args {
    #[arg(help = "Image to classify")]
    image: PathBuf,

    #[arg(short, long, help = "Tesseract TSV (image_to_data) output for the image")]
    tokens: PathBuf,

    #[arg(short, long, help = "Reference font file to report metrics for")]
    font: Option<PathBuf>,

    #[arg(short, long, help = "TOML file overriding the detection thresholds")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Include per-token diagnostics in the report")]
    diagnostics: bool,
}

fn run(args: &Args) -> fontsniff::Result<serde_json::Value> {
    let font_metrics = args.font.as_deref().map(FontMetrics::load).transpose()?;

    let mut builder = FontDetectorBuilder::new();
    if let Some(config) = &args.config {
        builder = builder.config_file(config)?;
    }
    let detector = builder.build();

    let image = image::open(&args.image)?;
    let tokens = TsvTokens::from_path(&args.tokens)?;

    let start = Instant::now();
    let analysis = detector.classify_with(&tokens, &image)?;
    log::debug!("{:?}", start.elapsed());

    let mut report = json!({
        "status": "success",
        "result": analysis.result,
        "font_metrics": font_metrics,
    });
    if args.diagnostics {
        report["diagnostics"] = json!(analysis.diagnostics);
    }
    Ok(report)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let (report, code) = match run(&args) {
        Ok(report) => (report, ExitCode::SUCCESS),
        Err(err) => {
            tracing::error!("{err}");
            let report = json!({
                "status": "error",
                "error": err.to_string(),
                "result": { "is_target_font": false, "confidence": 0.0 },
            });
            (report, ExitCode::FAILURE)
        }
    };
    println!("{report:#}");
    code
}
