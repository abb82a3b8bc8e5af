use anyhow::{bail, Context, Result};
use congestion_trace::instrument::{FanoutRecorder, LineRecorder, Recorder, TracingRecorder};
use congestion_trace::metrics::{install_recorder, render_metrics};
use congestion_trace::scenario::{run_scenario, ScenarioConfig};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

const USAGE: &str = "usage: congestion-trace [config.json] [--trace <path>] [--metrics]";

struct Args {
    config: Option<PathBuf>,
    trace: Option<PathBuf>,
    metrics: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: None,
        trace: None,
        metrics: false,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--trace" => {
                let path = iter.next().context("--trace needs a path")?;
                args.trace = Some(PathBuf::from(path));
            }
            "--metrics" => args.metrics = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            path => {
                if args.config.replace(PathBuf::from(path)).is_some() {
                    bail!("only one scenario file may be given\n{USAGE}");
                }
            }
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args = parse_args()?;

    if args.metrics {
        install_recorder().context("installing metrics recorder")?;
    }

    let config = match &args.config {
        Some(path) => ScenarioConfig::from_json_file(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => ScenarioConfig::default(),
    };

    let trace_to_file = args.trace.is_some();
    let sink: Box<dyn Write + Send> = match &args.trace {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout()),
    };
    let lines = Arc::new(LineRecorder::new(sink));
    let recorder: Arc<dyn Recorder> = Arc::new(
        FanoutRecorder::new()
            .with(lines.clone())
            .with(Arc::new(TracingRecorder)),
    );

    let report = run_scenario(&config, recorder)?;

    lines.flush().context("flushing trace output")?;
    if lines.write_errors() > 0 {
        tracing::warn!(lost = lines.write_errors(), "Some trace lines were not written");
    }

    let json = serde_json::to_string_pretty(&report)?;
    if trace_to_file {
        println!("{json}");
    } else {
        eprintln!("{json}");
    }

    if let Some(rendered) = render_metrics() {
        println!("{rendered}");
    }

    Ok(())
}
