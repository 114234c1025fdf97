//! `tl`: command-line front end for the TL toolkit.
//!
//! ```text
//! tl parse api.tl -o api.json
//! tl merge layer180.json layer181.json --on-conflict prompt -o merged.json
//! tl diff layer180.json layer181.json
//! tl decode --schema api.json payload.bin
//! ```
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` for build
//! summaries from the libraries.

#![deny(unsafe_code)]

mod error;
mod resolve;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use layer_tl_codec::{Codec, Cursor};
use layer_tl_parser::ParseOptions;
use layer_tl_schema::{
    diff_schemas, merge_schemas, ConflictResolver, EntryKind, LayeredSchema, TlPackedSchema,
};

use error::CliError;
use resolve::{OnConflict, Policy, Prompt};

#[derive(Parser)]
#[command(name = "tl", version)]
#[command(about = "Parse, merge, diff and decode Telegram TL schemas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a `.tl` schema into packed JSON
    Parse {
        /// Input `.tl` file
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Derive missing constructor ids from the declaration text (CRC32)
        #[arg(long)]
        derive_ids: bool,

        /// Layer to record when the file has no `// LAYER N` marker
        #[arg(long)]
        layer: Option<i32>,
    },

    /// Merge several schemas, newest layer first
    Merge {
        /// Packed `.json` schemas or `.tl` files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// What to do when sources of the same layer disagree
        #[arg(long, value_enum, default_value_t = OnConflict::Fail)]
        on_conflict: OnConflict,
    },

    /// Show what changed between two schemas, as JSON
    Diff {
        old: PathBuf,
        new: PathBuf,
    },

    /// Decode concatenated TL objects from a binary file
    Decode {
        /// Packed `.json` schema or `.tl` file
        #[arg(long)]
        schema: PathBuf,

        /// Binary payload
        payload: PathBuf,

        /// Print JSON instead of the debug form
        #[arg(long)]
        json: bool,
    },

    /// Count entries per namespace
    Stats {
        schema: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Parse { input, output, derive_ids, layer } => {
            let options = if derive_ids { ParseOptions::derive_ids() } else { ParseOptions::default() };
            let mut schema = load_tl(&input, options)?;
            if let Some(layer) = layer {
                if schema.layer == 0 {
                    schema.layer = layer;
                }
            }
            let json = TlPackedSchema::from(&schema).to_json().map_err(CliError::schema(&input))?;
            write_output(output.as_deref(), &json)
        }

        Commands::Merge { inputs, output, on_conflict } => {
            let sources = inputs.iter().map(|p| load(p)).collect::<Result<Vec<_>, _>>()?;

            let mut resolver: Box<dyn ConflictResolver> = match on_conflict {
                OnConflict::Prompt => Box::new(Prompt::new(io::stdin().lock(), io::stderr())),
                policy => Box::new(Policy(policy)),
            };
            let merged = merge_schemas(&sources, resolver.as_mut())?;
            if !merged.conflicts.is_empty() {
                log::info!("[tl-cli] resolved {} conflicts: {}", merged.conflicts.len(), merged.conflicts.join(", "));
            }

            let packed = TlPackedSchema::pack(&merged.schema, merged.layer);
            let json = serde_json::to_string_pretty(&packed)?;
            write_output(output.as_deref(), &json)
        }

        Commands::Diff { old, new } => {
            let old = load(&old)?;
            let new = load(&new)?;
            let diff = diff_schemas(&old.schema, &new.schema);
            println!("{}", serde_json::to_string_pretty(&diff)?);
            Ok(())
        }

        Commands::Decode { schema, payload, json } => {
            let schema = load(&schema)?;
            let codec = Codec::new(&schema.schema)?;
            let data = fs::read(&payload).map_err(CliError::io(&payload))?;

            let mut cursor = Cursor::from_slice(&data);
            while !cursor.is_empty() {
                let offset = cursor.pos();
                let value = codec
                    .decode_any(&mut cursor)
                    .map_err(|source| CliError::Decode { offset, source })?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&value)?);
                } else {
                    println!("@{offset}: {value:#?}");
                }
            }
            Ok(())
        }

        Commands::Stats { schema } => {
            let schema = load(&schema)?;
            println!("layer {}", schema.layer);
            for kind in [EntryKind::Class, EntryKind::Method] {
                for (ns, entries) in schema.schema.namespaces(kind) {
                    let ns = if ns.is_empty() { "<root>" } else { ns.as_str() };
                    println!("{kind:<7} {ns:<24} {}", entries.len());
                }
            }
            println!("unions  {}", schema.schema.unions().len());
            Ok(())
        }
    }
}

fn load_tl(path: &Path, options: ParseOptions) -> Result<LayeredSchema, CliError> {
    let text = fs::read_to_string(path).map_err(CliError::io(path))?;
    LayeredSchema::from_tl(&text, options).map_err(CliError::schema(path))
}

/// Loads a packed JSON schema, or parses a `.tl` file.
fn load(path: &Path) -> Result<LayeredSchema, CliError> {
    if path.extension().is_some_and(|ext| ext == "tl") {
        return load_tl(path, ParseOptions::default());
    }
    let json = fs::read_to_string(path).map_err(CliError::io(path))?;
    TlPackedSchema::from_json(&json)
        .and_then(TlPackedSchema::unpack)
        .map_err(CliError::schema(path))
}

fn write_output(path: Option<&Path>, text: &str) -> Result<(), CliError> {
    match path {
        Some(path) => {
            fs::write(path, text).map_err(CliError::io(path))?;
            log::info!("[tl-cli] wrote {}", path.display());
            Ok(())
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}
