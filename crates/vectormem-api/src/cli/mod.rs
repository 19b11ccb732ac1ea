//! CLI command definitions for the `vmem` binary.
//!
//! Uses clap derive macros for argument parsing. Index commands take the
//! index name first; record commands take `<index> <id>`.

pub mod demo;
pub mod index;
pub mod record;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use vectormem_infra::config::DEFAULT_CONFIG_FILE;
use vectormem_types::memory::MemoryFilter;

/// Store, search and manage text memories in a vector database.
#[derive(Parser, Debug)]
#[command(name = "vmem", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, env = "VECTORMEM_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Detailed output (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an index.
    #[command(name = "create-index")]
    CreateIndex {
        name: String,
        /// Vector dimension; must match the embedding model's (the default).
        #[arg(long)]
        dimension: Option<usize>,
    },

    /// List index names.
    Indexes,

    /// Delete an index and every record in it.
    #[command(name = "delete-index")]
    DeleteIndex {
        name: String,
        /// Succeed when the index does not exist.
        #[arg(long)]
        missing_ok: bool,
    },

    /// Embed a text and store it under an id.
    Upsert {
        index: String,
        id: String,
        text: String,
        /// Tag as key=value (repeatable).
        #[arg(long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,
    },

    /// Find the records most similar to a query.
    Search {
        index: String,
        query: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
        #[arg(long, default_value_t = 0.0)]
        min_relevance: f64,
        /// Only records carrying every key=value tag (repeatable).
        #[arg(long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,
        /// Include stored vectors in the output.
        #[arg(long)]
        with_embeddings: bool,
    },

    /// List records in an index.
    #[command(alias = "ls")]
    List {
        index: String,
        /// Maximum records to list (all when omitted).
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,
        #[arg(long)]
        with_embeddings: bool,
    },

    /// Delete a record by id.
    #[command(alias = "rm")]
    Delete {
        index: String,
        id: String,
        /// Succeed when the record does not exist.
        #[arg(long)]
        missing_ok: bool,
    },

    /// Run the sample scenario: index a dated sentence and search for "fecha".
    Demo,
}

/// Parse a `key=value` tag argument.
pub fn parse_tag(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

/// Turn `--tag` arguments into a filter list: one conjunctive filter, or
/// none when no tags were given.
pub fn tag_filters(tags: &[(String, String)]) -> Vec<MemoryFilter> {
    if tags.is_empty() {
        return Vec::new();
    }
    let filter = tags
        .iter()
        .fold(MemoryFilter::new(), |filter, (k, v)| filter.by_tag(k.as_str(), v.as_str()));
    vec![filter]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag("user=alice"), Ok(("user".into(), "alice".into())));
        assert_eq!(parse_tag("url=http://a=b"), Ok(("url".into(), "http://a=b".into())));
        assert!(parse_tag("novalue").is_err());
        assert!(parse_tag("=x").is_err());
    }

    #[test]
    fn test_tag_filters_is_one_conjunction() {
        assert!(tag_filters(&[]).is_empty());
        let filters = tag_filters(&[("user".into(), "alice".into()), ("type".into(), "note".into())]);
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].pairs().count(), 2);
    }

    #[test]
    fn test_search_command_parses() {
        let cli = Cli::try_parse_from([
            "vmem", "--json", "search", "Document", "fecha", "--limit", "1", "--tag", "lang=es",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Search {
                index,
                query,
                limit,
                min_relevance,
                tags,
                with_embeddings,
            } => {
                assert_eq!(index, "Document");
                assert_eq!(query, "fecha");
                assert_eq!(limit, 1);
                assert_eq!(min_relevance, 0.0);
                assert_eq!(tags, vec![("lang".to_string(), "es".to_string())]);
                assert!(!with_embeddings);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_upsert_rejects_bad_tag() {
        let result = Cli::try_parse_from(["vmem", "upsert", "Document", "doc-001", "hola", "--tag", "oops"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_and_default_config() {
        let cli = Cli::try_parse_from(["vmem", "-vv", "indexes"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Indexes));
        if std::env::var_os("VECTORMEM_CONFIG").is_none() {
            assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
