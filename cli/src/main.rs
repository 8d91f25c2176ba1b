#![allow(clippy::print_stderr)]
use crate::cli::{Args, Command};
use anyhow::Context;
use clap::Parser;
use rdb2rdf::sink::NQuadsSink;
use rdb2rdf::{MappingConfig, MappingDriver, MappingMetrics};
use std::fs::File;
use std::io::{self, stdout, BufWriter, Write};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

pub fn main() -> anyhow::Result<()> {
    let matches = Args::parse();
    init_logging();
    match matches.command {
        Command::Map {
            database,
            config,
            mapping_version,
            base_iri,
            target_graph,
            time_zone,
            fetch_size,
            query_timeout_ms,
            skip_invalid_tables,
            output,
        } => {
            let mut config = if let Some(path) = config {
                MappingConfig::from_file(&path)
                    .with_context(|| format!("Invalid configuration file {}", path.display()))?
            } else {
                MappingConfig::default()
            };
            if let Some(mapping_version) = mapping_version {
                config.mapping_version = mapping_version;
            }
            if let Some(base_iri) = base_iri {
                config.base_iri = base_iri;
            }
            if target_graph.is_some() {
                config.target_graph = target_graph;
            }
            if let Some(time_zone) = time_zone {
                config.time_zone = time_zone;
            }
            if let Some(fetch_size) = fetch_size {
                config.fetch_size = fetch_size;
            }
            if query_timeout_ms.is_some() {
                config.query_timeout_ms = query_timeout_ms;
            }
            config.skip_invalid_tables |= skip_invalid_tables;
            config.validate()?;

            let metrics = if let Some(output) = output {
                let file = File::create(&output)
                    .with_context(|| format!("Cannot create {}", output.display()))?;
                info!(output = %output.display(), "Writing triples to file");
                let (metrics, writer) = map(&database, config, BufWriter::new(file))?;
                close_file_writer(writer)?;
                metrics
            } else {
                let (metrics, mut writer) = map(&database, config, stdout().lock())?;
                writer.flush()?;
                metrics
            };
            eprintln!("{metrics}");
            Ok(())
        }
    }
}

fn map<W: Write>(
    database: &Path,
    config: MappingConfig,
    writer: W,
) -> anyhow::Result<(MappingMetrics, W)> {
    if !database.is_file() {
        anyhow::bail!("The database file {} does not exist", database.display());
    }
    let target_graph = config.target_graph()?;
    let driver = MappingDriver::open_sqlite(database, config)
        .with_context(|| format!("Cannot open database {}", database.display()))?;
    let mut sink = NQuadsSink::new(writer).with_graph(target_graph);
    let metrics = driver.run(&mut sink)?;
    driver.close()?;
    Ok((metrics, sink.into_inner()))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn close_file_writer(writer: BufWriter<File>) -> io::Result<()> {
    let mut file = writer
        .into_inner()
        .map_err(io::IntoInnerError::into_error)?;
    file.flush()?;
    file.sync_all()
}
