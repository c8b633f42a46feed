//! Parse Capture Example
//!
//! Parses a saved CLI capture with the template the index picks for it, and
//! prints the records as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example parse_capture -- --vendor cisco_ios --command "show vlan" --input vlan.txt
//! ```
//!
//! Read from stdin and use your own template directory:
//! ```bash
//! ssh switch1 "show ip int brief" | cargo run --example parse_capture -- \
//!     --templates ./my-templates --vendor cisco_ios --command "show ip int brief"
//! ```

use std::env;
use std::io::Read;
use std::path::PathBuf;

use ferrisfsm::{Attributes, EofPolicy, PipelineBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut attributes = Attributes::new();
    if let Some(vendor) = &args.vendor {
        attributes.insert("Vendor", vendor);
    }
    if let Some(command) = &args.command {
        attributes.insert("Command", command);
    }
    for (name, value) in &args.attributes {
        attributes.insert(name, value);
    }
    if attributes.is_empty() {
        eprintln!("Error: Need at least one of --vendor, --command or --attr");
        std::process::exit(1);
    }

    let mut input = Vec::new();
    match &args.input {
        Some(path) => input = std::fs::read(path)?,
        None => {
            std::io::stdin().read_to_end(&mut input)?;
        }
    }

    let mut builder = PipelineBuilder::from_dir(&args.templates).index_file(&args.index_file);
    if args.discard_eof {
        builder = builder.eof_policy(EofPolicy::Discard);
    }
    let pipeline = builder.build();

    eprintln!("Templates: {}", args.templates.display());
    eprintln!("Attributes: {}", attributes);

    let text = String::from_utf8_lossy(&input);
    match pipeline.run_detailed(&attributes, &text) {
        Ok(parsed) => {
            eprintln!(
                "Template: {} ({} records in {:?})",
                parsed.template,
                parsed.len(),
                parsed.elapsed
            );
            if args.table {
                println!("{}", serde_json::to_string_pretty(&parsed.table)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&parsed.records)?);
            }
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&e.to_failure())?);
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Simple argument parser
struct Args {
    templates: PathBuf,
    index_file: String,
    vendor: Option<String>,
    command: Option<String>,
    attributes: Vec<(String, String)>,
    input: Option<PathBuf>,
    discard_eof: bool,
    table: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut templates = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"));
        let mut index_file = "index".to_string();
        let mut vendor = None;
        let mut command = None;
        let mut attributes = Vec::new();
        let mut input = None;
        let mut discard_eof = false;
        let mut table = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--templates" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        templates = PathBuf::from(&args[i]);
                    }
                }
                "--index" => {
                    i += 1;
                    if i < args.len() {
                        index_file = args[i].clone();
                    }
                }
                "--vendor" | "-v" => {
                    i += 1;
                    if i < args.len() {
                        vendor = Some(args[i].clone());
                    }
                }
                "--command" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        command = Some(args[i].clone());
                    }
                }
                "--attr" | "-a" => {
                    i += 1;
                    if i < args.len() {
                        match args[i].split_once('=') {
                            Some((name, value)) => {
                                attributes.push((name.to_string(), value.to_string()))
                            }
                            None => eprintln!("Ignoring attribute without '=': {}", args[i]),
                        }
                    }
                }
                "--input" | "-i" => {
                    i += 1;
                    if i < args.len() {
                        input = Some(PathBuf::from(&args[i]));
                    }
                }
                "--discard-eof" => discard_eof = true,
                "--table" => table = true,
                "--help" | "-h" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {}
            }
            i += 1;
        }

        Self {
            templates,
            index_file,
            vendor,
            command,
            attributes,
            input,
            discard_eof,
            table,
        }
    }

    fn print_help() {
        println!(
            r#"ferrisfsm capture parsing example

Resolves a template from the index, parses a CLI capture with it and prints
the records as JSON. Failures are printed as {{"stage": ..., "message": ...}}.

USAGE:
    cargo run --example parse_capture -- [OPTIONS]

OPTIONS:
    -t, --templates <DIR>    Template directory [default: bundled templates]
    --index <FILE>           Index file name in the directory [default: index]
    -v, --vendor <VENDOR>    Vendor attribute, e.g. cisco_ios
    -c, --command <CMD>      Command attribute, e.g. "show vlan"
    -a, --attr <NAME=VALUE>  Extra attribute (repeatable)
    -i, --input <FILE>       Capture to parse [default: stdin]
    --discard-eof            Drop unrecorded values at end of input
    --table                  Print the raw table instead of records
    -h, --help               Print this help message

EXAMPLES:
    # Parse a saved capture
    cargo run --example parse_capture -- \
        --vendor arista_eos --command "show version" --input version.txt

    # With debug logging
    RUST_LOG=ferrisfsm=debug cargo run --example parse_capture -- \
        --vendor linux --command "df -h" --input df.txt
"#
        );
    }
}
