use std::fs::File;
use std::io::{Read, stdin};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{ArgAction, Parser};
use normser::{Context, Data, JsonEncoder, Serializer};
use serde_json::{Value, json};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "normser",
    about = "Convert documents between the formats normser can decode and encode",
    version
)]
struct Args {
    /// Format of the input document (matched by substring, e.g. "json", "text/xml")
    #[arg(long, default_value = "json")]
    from: String,

    /// Format to produce; unknown formats fall back to JSON
    #[arg(long, default_value = "json")]
    to: String,

    /// Codec options as a JSON object, e.g. '{"xml_encoder": {"headless": true}}'
    #[arg(long)]
    context: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Input file (defaults to stdin)
    input: Option<PathBuf>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_context(raw: Option<&str>, pretty: bool) -> Result<Context> {
    let mut context = match raw {
        Some(raw) => {
            let value: Value = serde_json::from_str(raw).context("--context is not valid JSON")?;
            Context::try_from(value)?
        }
        None => Context::new(),
    };
    if pretty {
        let mut bag = match context.get(JsonEncoder::CONTEXT_KEY) {
            Some(Value::Object(existing)) => existing.clone(),
            _ => serde_json::Map::new(),
        };
        bag.insert("pretty".to_string(), json!(true));
        context.insert(JsonEncoder::CONTEXT_KEY, Value::Object(bag));
    }
    Ok(context)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut buf = String::new();
    match &args.input {
        Some(path) => {
            let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            f.read_to_string(&mut buf)?;
        }
        None => {
            stdin().read_to_string(&mut buf)?;
        }
    }

    let context = build_context(args.context.as_deref(), args.pretty)?;
    let serializer = Serializer::builder().default_codecs().build();
    debug!(from = %args.from, to = %args.to, bytes = buf.len(), "converting");

    let decoded = serializer
        .decode(&buf, &args.from, &context)
        .with_context(|| format!("decoding input as {}", args.from))?;
    let out = serializer
        .serialize(&Data::from(decoded), &args.to, &context)
        .with_context(|| format!("encoding output as {}", args.to))?;
    println!("{}", out);

    Ok(())
}
