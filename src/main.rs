//! qpress – command-line quote-document generator.
//!
//! Usage:
//!   qpress <payload.json> [output.pdf] [--schema template.json] [--draft]
//!
//! The payload is a quotepress DocumentPayload JSON record. Without
//! `--schema` the built-in standard quote template is used. `--draft` forces
//! draft-preview mode and writes the laid-out tree as JSON instead of a PDF.

use std::{env, fs, path::PathBuf, process};

use quotepress::payload::{DocumentPayload, OutputMode};
use quotepress::schema::TemplateSchema;
use quotepress::templates::standard_quote_schema;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut schema_path: Option<PathBuf> = None;
    let mut draft = false;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1).peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--draft" | "-d" => draft = true,
            "--schema" | "-s" => match iter.next() {
                Some(v) => schema_path = Some(PathBuf::from(v)),
                None => {
                    eprintln!("Error: --schema requires a file path.");
                    process::exit(1);
                }
            },
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                positional += 1;
            }
        }
    }

    let input = match input_path {
        Some(p) => p,
        None => {
            eprintln!("Error: no payload file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    let payload_json = match fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", input.display());
            process::exit(1);
        }
    };
    let mut payload: DocumentPayload = match serde_json::from_str(&payload_json) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error parsing payload: {e}");
            process::exit(1);
        }
    };
    if draft {
        payload.mode = OutputMode::DraftPreview;
    }

    let schema: TemplateSchema = match &schema_path {
        Some(path) => {
            let json = match fs::read_to_string(path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error reading '{}': {e}", path.display());
                    process::exit(1);
                }
            };
            match TemplateSchema::from_json(&json) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error parsing schema: {e}");
                    process::exit(1);
                }
            }
        }
        None => standard_quote_schema(),
    };

    // Default output: same stem as input, extension by mode.
    let output = output_path.unwrap_or_else(|| {
        let mut o = input.clone();
        o.set_extension(match payload.mode {
            OutputMode::DraftPreview => "layout.json",
            OutputMode::Final => "pdf",
        });
        o
    });

    match quotepress::generate(&payload, &schema) {
        Ok(doc) => {
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        eprintln!("Error creating output directory: {e}");
                        process::exit(1);
                    }
                }
            }
            let bytes = match &doc.pdf {
                Some(pdf) => pdf.clone(),
                None => doc.layout.to_json().into_bytes(),
            };
            if let Err(e) = fs::write(&output, &bytes) {
                eprintln!("Error writing '{}': {e}", output.display());
                process::exit(1);
            }
            let pages = doc.page_count();
            eprintln!(
                "Wrote '{}' ({} bytes, {} page{})",
                output.display(),
                bytes.len(),
                pages,
                if pages == 1 { "" } else { "s" }
            );
        }
        Err(e) => {
            eprintln!("Error generating document: {e}");
            process::exit(1);
        }
    }
}

fn print_usage(prog: &str) {
    eprintln!("qpress – quote-document generator (quotepress)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <payload.json> [output.pdf] [--schema template.json] [--draft]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <payload.json>   Quote payload (company, sections, budget lines, totals)");
    eprintln!("  [output.pdf]     Output path  (default: payload stem + .pdf / .layout.json)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --schema, -s     Template schema JSON (default: built-in standard template)");
    eprintln!("  --draft, -d      Draft preview: write the laid-out tree as JSON, no PDF");
    eprintln!("  --help           Print this message");
}
