use figure_kit::api::{ExtendedFigure, FigureConfig};
use figure_kit::render::{FigureDocument, FigureSink, HtmlSink};
use std::fs;
use std::path::PathBuf;

#[derive(Debug)]
struct CliArgs {
    input: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
    connected: bool,
    raw: bool,
    verbose: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = parse_args()?;
    let _ = if args.verbose {
        figure_kit::telemetry::init_tracing("figure_kit=debug")
    } else {
        figure_kit::telemetry::init_default_tracing()
    };

    let raw = fs::read_to_string(&args.input)
        .map_err(|err| format!("failed to read `{}`: {err}", args.input.display()))?;
    let document = FigureDocument::from_json_compat_str(&raw).map_err(|err| err.to_string())?;

    let config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|err| format!("failed to read `{}`: {err}", path.display()))?;
            FigureConfig::from_json_str(&raw).map_err(|err| err.to_string())?
        }
        None => FigureConfig::default(),
    };

    let mut sink = HtmlSink::new(args.connected).with_output(&args.output, true);
    if args.raw {
        let options = ExtendedFigure::with_config(config, document.layout.clone())
            .and_then(|figure| figure.show_options())
            .map_err(|err| err.to_string())?;
        sink.show(&document, &options).map_err(|err| err.to_string())?;
    } else {
        let mut figure =
            ExtendedFigure::from_document(config, document).map_err(|err| err.to_string())?;
        figure
            .show(&mut sink, None, None)
            .map_err(|err| err.to_string())?;
    }

    println!("wrote {}", args.output.display());
    Ok(())
}

fn parse_args() -> Result<CliArgs, String> {
    let mut args = std::env::args().skip(1);

    let mut input = None::<PathBuf>;
    let mut output = None::<PathBuf>;
    let mut config = None::<PathBuf>;
    let mut connected = false;
    let mut raw = false;
    let mut verbose = false;

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--input" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --input".to_owned())?;
                input = Some(PathBuf::from(value));
            }
            "--output" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --output".to_owned())?;
                output = Some(PathBuf::from(value));
            }
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --config".to_owned())?;
                config = Some(PathBuf::from(value));
            }
            "--connected" => connected = true,
            "--raw" => raw = true,
            "--verbose" => verbose = true,
            other => return Err(format!("unknown flag `{other}`")),
        }
    }

    let usage = "usage: figure_html_tool --input <figure.json> --output <page.html> [--config <config.json>] [--connected] [--raw] [--verbose]";
    Ok(CliArgs {
        input: input.ok_or_else(|| usage.to_owned())?,
        output: output.ok_or_else(|| usage.to_owned())?,
        config,
        connected,
        raw,
        verbose,
    })
}
