use clap::{Parser, Subcommand, ValueHint};
use rdb2rdf::MappingVersion;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "rdb2rdf")]
/// Maps relational databases to RDF following the W3C Direct Mapping
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Map all tables of a SQLite database to RDF
    Map {
        /// SQLite database file to read
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        database: PathBuf,
        /// TOML file with mapping options
        ///
        /// Options given on the command line take precedence.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
        /// Working draft of the Direct Mapping to follow
        ///
        /// Either WD-2011-03-24 or WD-2012-05-29.
        #[arg(long)]
        mapping_version: Option<MappingVersion>,
        /// IRI that all generated IRIs are relative to
        #[arg(long, value_hint = ValueHint::Url)]
        base_iri: Option<String>,
        /// Named graph to write the triples into
        ///
        /// N-Quads are written if set, N-Triples otherwise.
        #[arg(long, value_hint = ValueHint::Url)]
        target_graph: Option<String>,
        /// Time zone used to rebuild temporal values, like UTC or +02:00
        #[arg(long)]
        time_zone: Option<String>,
        /// Number of rows fetched per database round trip
        #[arg(long)]
        fetch_size: Option<u32>,
        /// Timeout of a single database call in milliseconds
        #[arg(long)]
        query_timeout_ms: Option<u64>,
        /// Skip tables whose metadata cannot be read
        #[arg(long)]
        skip_invalid_tables: bool,
        /// File to write to
        ///
        /// If no file is given, stdout is written.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
}
