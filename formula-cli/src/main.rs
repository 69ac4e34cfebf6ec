// Command-line interface for formula transcoding
//
// This binary drives the formula-babel pipeline over files: it converts stored documents to
// their editable shape and back, and exposes the text-level building blocks (codec, scanner,
// image metrics) for inspection.
//
// Usage:
//  formula init-parse <input> [-o <file>]      - Stored document -> editable document
//  formula end-parse <input> [-o <file>]       - Editable document -> stored document
//  formula encode <input>                      - Safe-encode markup
//  formula decode <input>                      - Decode safe markup
//  formula scan <input> --tag <name> [--matching] [--safe]
//                                              - List element spans as JSON
//  formula metrics <image>                     - Read PNG/SVG metrics as JSON
//
// Configuration:
//
// `formula.toml` in the working directory is picked up when present, `--config PATH` layers a
// file on top, and `--extra-<dotted.key> <value>` overrides single keys, e.g.
//  formula end-parse doc.html --extra-pipeline.save_mode safeXml
//
// There is no network transport in this binary: the content service is answered from a JSON
// table (`--service-table` or `service.table`).

mod logging;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use formula_babel::metrics::{read_png_metrics, read_svg_metrics, ImageMetrics, PNG_SIGNATURE};
use formula_babel::scanner::{find_spans, ElementQuery};
use formula_babel::service::TableContentService;
use formula_babel::{CharacterSet, Codec, Pipeline, PipelineOptions};
use formula_config::{FormulaConfig, Loader};
use log::{debug, info, warn};
use serde_json::json;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Parse extra-* arguments from command line args
/// Returns (cleaned_args_without_extras, extra_params_map)
///
/// Supports both:
/// - `--extra-<key> <value>` (explicit value)
/// - `--extra-<key>` (boolean flag, defaults to "true")
fn parse_extra_args(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut cleaned_args = Vec::new();
    let mut extra_params = HashMap::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if let Some(key) = arg.strip_prefix("--extra-") {
            let value = args.get(i + 1).filter(|next| !next.starts_with('-'));
            match value {
                Some(value) => {
                    extra_params.insert(key.to_string(), value.clone());
                    i += 2;
                }
                None => {
                    extra_params.insert(key.to_string(), "true".to_string());
                    i += 1;
                }
            }
            continue;
        }

        cleaned_args.push(arg.clone());
        i += 1;
    }

    (cleaned_args, extra_params)
}

fn input_arg(help: &'static str) -> Arg {
    Arg::new("input")
        .help(help)
        .required(true)
        .index(1)
        .value_hint(ValueHint::FilePath)
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .help("Output file path (defaults to stdout)")
        .value_hint(ValueHint::FilePath)
}

fn build_cli() -> Command {
    Command::new("formula")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert formulas in HTML documents between stored and editable forms")
        .long_about(
            "formula moves math formulas embedded in HTML between their stored form\n\
            (MathML markup, raw or safe-encoded) and their editable form (formula images,\n\
            iframe placeholders or $$notation$$ text).\n\n\
            Extra Parameters:\n  \
            Use --extra-<dotted.key> [value] to override a configuration key.\n  \
            Boolean keys can omit the value (defaults to 'true').\n\n\
            Examples:\n  \
            formula init-parse stored.html -o edit.html\n  \
            formula end-parse edit.html --extra-pipeline.save_mode safeXml\n  \
            formula scan doc.html --tag math --matching\n  \
            formula metrics formula.png",
        )
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a formula.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("service-table")
                .long("service-table")
                .value_name("JSON")
                .help("JSON answer table standing in for the content service")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log more (repeat for debug output). FORMULA_LOG takes precedence")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("init-parse")
                .about("Convert a stored document into its editable form")
                .arg(input_arg("Stored document ('-' for stdin)"))
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("end-parse")
                .about("Convert an edited document back into its stored form")
                .arg(input_arg("Edited document ('-' for stdin)"))
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("encode")
                .about("Safe-encode markup so it survives HTML filters")
                .arg(input_arg("Markup file ('-' for stdin)")),
        )
        .subcommand(
            Command::new("decode")
                .about("Decode safe-encoded markup")
                .arg(input_arg("Safe markup file ('-' for stdin)")),
        )
        .subcommand(
            Command::new("scan")
                .about("List the spans of an element as JSON")
                .arg(input_arg("Document to scan ('-' for stdin)"))
                .arg(
                    Arg::new("tag")
                        .long("tag")
                        .help("Element name to look for")
                        .required(true)
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("matching")
                        .long("matching")
                        .help("Spans run to the matching close tag instead of the opening tag's end")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("safe")
                        .long("safe")
                        .help("Scan safe-encoded markup («tag¨attr¨»)")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("metrics")
                .about("Read width, height, baseline and dpi of a rendered PNG or SVG")
                .arg(input_arg("Image file")),
        )
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Parse extra-* arguments before clap processing
    let (cleaned_args, extra_params) = parse_extra_args(&args);
    let matches = build_cli().get_matches_from(&cleaned_args);

    let Some((name, sub_matches)) = matches.subcommand() else {
        eprintln!("Unknown subcommand. Use --help for usage information.");
        std::process::exit(1);
    };

    logging::init(sub_matches.get_count("verbose"));

    let config = load_cli_config(
        sub_matches.get_one::<String>("config").map(String::as_str),
        &extra_params,
    )
    .unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        std::process::exit(1);
    });

    let result = match name {
        "init-parse" => handle_parse_command(sub_matches, Direction::Initial, &config),
        "end-parse" => handle_parse_command(sub_matches, Direction::End, &config),
        "encode" => handle_codec_command(sub_matches, CodecDirection::Encode, &config),
        "decode" => handle_codec_command(sub_matches, CodecDirection::Decode, &config),
        "scan" => handle_scan_command(sub_matches),
        "metrics" => handle_metrics_command(sub_matches),
        _ => Err("Unknown subcommand. Use --help for usage information.".to_string()),
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Initial,
    End,
}

#[derive(Debug, Clone, Copy)]
enum CodecDirection {
    Encode,
    Decode,
}

/// Handle init-parse and end-parse
fn handle_parse_command(
    sub_matches: &ArgMatches,
    direction: Direction,
    config: &FormulaConfig,
) -> Result<(), String> {
    let source = read_input(required(sub_matches, "input")?)?;
    let table = sub_matches.get_one::<String>("service-table").map(String::as_str);
    let service = content_service(config, table)?;

    let pipeline = Pipeline::new(PipelineOptions::from(config), service);
    let conversion = match direction {
        Direction::Initial => pipeline.initial_parse_detailed(&source),
        Direction::End => pipeline.end_parse_detailed(&source),
    };
    if !conversion.issues.is_empty() {
        info!("{} issue(s) while converting", conversion.issues.len());
    }

    write_output(
        sub_matches.get_one::<String>("output").map(String::as_str),
        &conversion.text,
    )
}

/// Handle encode and decode
fn handle_codec_command(
    sub_matches: &ArgMatches,
    direction: CodecDirection,
    config: &FormulaConfig,
) -> Result<(), String> {
    let source = read_input(required(sub_matches, "input")?)?;
    let codec = Codec::new().with_restricted_characters(config.host.restricted_characters);
    match direction {
        CodecDirection::Encode => print!("{}", codec.encode(&source)),
        CodecDirection::Decode => print!("{}", codec.decode(&source)),
    }
    Ok(())
}

/// Handle the scan command
fn handle_scan_command(sub_matches: &ArgMatches) -> Result<(), String> {
    let source = read_input(required(sub_matches, "input")?)?;
    let tag = required(sub_matches, "tag")?;

    let mut query = if sub_matches.get_flag("matching") {
        ElementQuery::matching(tag)
    } else {
        ElementQuery::void(tag)
    };
    if sub_matches.get_flag("safe") {
        query = query.with_characters(CharacterSet::SAFE_XML);
    }

    let spans: Vec<_> = find_spans(&source, query)
        .into_iter()
        .map(|span| {
            json!({
                "start": span.start,
                "end": span.end,
                "kind": format!("{:?}", span.kind),
                "text": span.slice(&source),
            })
        })
        .collect();
    debug!("{} span(s) of <{}>", spans.len(), tag);

    let output = serde_json::to_string_pretty(&spans).map_err(|e| format!("JSON error: {e}"))?;
    println!("{output}");
    Ok(())
}

/// Handle the metrics command
fn handle_metrics_command(sub_matches: &ArgMatches) -> Result<(), String> {
    let path = required(sub_matches, "input")?;
    let bytes = fs::read(path).map_err(|e| format!("Error reading file '{path}': {e}"))?;

    let metrics = image_metrics(&bytes)
        .ok_or_else(|| format!("No image metrics found in '{path}'"))?;
    let output = serde_json::to_string_pretty(&metrics).map_err(|e| format!("JSON error: {e}"))?;
    println!("{output}");
    Ok(())
}

fn image_metrics(bytes: &[u8]) -> Option<ImageMetrics> {
    if bytes.starts_with(&PNG_SIGNATURE) {
        return read_png_metrics(bytes);
    }
    std::str::from_utf8(bytes).ok().and_then(read_svg_metrics)
}

fn required<'a>(sub_matches: &'a ArgMatches, name: &str) -> Result<&'a str, String> {
    sub_matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing argument '{name}'"))
}

fn read_input(path: &str) -> Result<String, String> {
    if path == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .map_err(|e| format!("Error reading stdin: {e}"))?;
        return Ok(source);
    }
    fs::read_to_string(path).map_err(|e| format!("Error reading file '{path}': {e}"))
}

fn write_output(output: Option<&str>, text: &str) -> Result<(), String> {
    match output {
        Some(path) => fs::write(path, text).map_err(|e| format!("Error writing file '{path}': {e}")),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn content_service(config: &FormulaConfig, table: Option<&str>) -> Result<TableContentService, String> {
    let path = table.map(Path::new).or_else(|| config.service.table_path());
    match path {
        Some(path) => TableContentService::from_path(path)
            .map_err(|e| format!("Error loading service table '{}': {e}", path.display())),
        None => {
            match config.service.endpoints() {
                Ok(endpoints) => warn!(
                    "No service table configured and no transport for {}; formulas that need the service are left as they are",
                    endpoints.service
                ),
                Err(err) => warn!("No service table configured ({err})"),
            }
            Ok(TableContentService::new())
        }
    }
}

fn load_cli_config(
    explicit_path: Option<&str>,
    overrides: &HashMap<String, String>,
) -> Result<FormulaConfig, String> {
    let mut loader = Loader::new().with_optional_file("formula.toml");
    if let Some(path) = explicit_path {
        loader = loader.with_file(path);
    }
    for (key, value) in overrides {
        loader = loader
            .set_override(key, value.as_str())
            .map_err(|e| format!("Invalid override --extra-{key}: {e}"))?;
    }
    loader
        .build()
        .map_err(|e| format!("Failed to load configuration: {e}"))
}
