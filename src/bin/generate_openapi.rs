//! Writes the Measure API OpenAPI document, e.g. for client generation.
//!
//! Usage:
//!   cargo run --bin generate_openapi > openapi.json
//!   cargo run --bin generate_openapi -- --output openapi.json \
//!       --server https://measure.example.net

use std::{
    env, fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use measure_service::api::handlers::ApiDoc;
use utoipa::{openapi::Server, OpenApi};

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    output: Option<PathBuf>,
    /// Base URLs of deployed instances, listed under `servers`.
    servers: Vec<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--output" => {
                let path = args.next().context("--output needs a path")?;
                parsed.output = Some(PathBuf::from(path));
            }
            "--server" => {
                let url = args.next().context("--server needs a URL")?;
                parsed.servers.push(url);
            }
            other => bail!("unknown argument: {other:?}"),
        }
    }

    Ok(parsed)
}

fn render(servers: &[String]) -> Result<String> {
    let mut doc = ApiDoc::openapi();
    if !servers.is_empty() {
        doc.servers = Some(servers.iter().map(Server::new).collect());
    }
    doc.to_pretty_json()
        .context("failed to serialise OpenAPI document")
}

fn main() -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let json = render(&args.servers)?;

    match args.output {
        Some(path) => {
            fs::write(&path, &json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("OpenAPI document written to {}", path.display());
        }
        None => io::stdout()
            .write_all(json.as_bytes())
            .context("failed to write to stdout")?,
    }

    Ok(())
}
