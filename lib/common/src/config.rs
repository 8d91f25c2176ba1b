use rdb2rdf_model::{Iri, NamedNode};
use serde::Deserialize;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use time::UtcOffset;

/// The working draft of the W3C Direct Mapping that drives IRI construction and literal
/// conversion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum MappingVersion {
    #[serde(rename = "WD-2011-03-24")]
    Wd20110324,
    #[default]
    #[serde(rename = "WD-2012-05-29")]
    Wd20120529,
}

impl FromStr for MappingVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "WD-2011-03-24" | "WD_20110324" | "2011" => Ok(Self::Wd20110324),
            "WD-2012-05-29" | "WD_20120529" | "2012" => Ok(Self::Wd20120529),
            other => Err(ConfigError::UnknownVersion(other.to_owned())),
        }
    }
}

impl Display for MappingVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Wd20110324 => "WD-2011-03-24",
            Self::Wd20120529 => "WD-2012-05-29",
        })
    }
}

/// Options of a mapping run.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct MappingConfig {
    pub mapping_version: MappingVersion,
    /// The IRI that all generated IRIs are relative to.
    #[serde(rename = "baseIRI")]
    pub base_iri: String,
    /// The graph that receives the triples. The default graph is used if absent.
    pub target_graph: Option<String>,
    /// `UTC`, `Z` or an offset like `+02:00`. Only consulted for dialects that extract temporal
    /// values as epoch seconds.
    pub time_zone: String,
    /// Number of rows fetched per round trip of the row cursor.
    pub fetch_size: u32,
    /// Timeout of a single database call. A call exceeding it aborts the run.
    pub query_timeout_ms: Option<u64>,
    /// Number of triples between two flushes of the sink.
    pub flush_interval: u64,
    /// Number of triples between two progress reports.
    pub progress_interval: u64,
    /// Maximum length of a chain of primary keys that are foreign keys.
    pub max_key_chain_depth: usize,
    /// Skip tables whose metadata cannot be read instead of aborting the run.
    pub skip_invalid_tables: bool,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            mapping_version: MappingVersion::default(),
            base_iri: Self::DEFAULT_BASE_IRI.to_owned(),
            target_graph: None,
            time_zone: "UTC".to_owned(),
            fetch_size: 1000,
            query_timeout_ms: None,
            flush_interval: 50_000,
            progress_interval: 50_000,
            max_key_chain_depth: 64,
            skip_invalid_tables: false,
        }
    }
}

impl MappingConfig {
    pub const DEFAULT_BASE_IRI: &'static str = "http://foo.example/DB/";

    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Checks that all values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_iri()?;
        self.target_graph()?;
        self.utc_offset()?;
        if self.fetch_size == 0 {
            return Err(ConfigError::ZeroValue("fetchSize"));
        }
        if self.flush_interval == 0 {
            return Err(ConfigError::ZeroValue("flushInterval"));
        }
        if self.progress_interval == 0 {
            return Err(ConfigError::ZeroValue("progressInterval"));
        }
        Ok(())
    }

    /// Returns the parsed base IRI.
    pub fn base_iri(&self) -> Result<Iri<String>, ConfigError> {
        Iri::parse(self.base_iri.clone()).map_err(|error| ConfigError::InvalidIri {
            option: "baseIRI",
            value: self.base_iri.clone(),
            reason: error.to_string(),
        })
    }

    /// Returns the parsed target graph.
    pub fn target_graph(&self) -> Result<Option<NamedNode>, ConfigError> {
        self.target_graph
            .as_ref()
            .map(|target_graph| {
                NamedNode::new(target_graph.clone()).map_err(|error| ConfigError::InvalidIri {
                    option: "targetGraph",
                    value: target_graph.clone(),
                    reason: error.to_string(),
                })
            })
            .transpose()
    }

    /// Returns the parsed time zone.
    pub fn utc_offset(&self) -> Result<UtcOffset, ConfigError> {
        parse_utc_offset(&self.time_zone)
            .ok_or_else(|| ConfigError::InvalidTimeZone(self.time_zone.clone()))
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }
}

fn parse_utc_offset(value: &str) -> Option<UtcOffset> {
    let value = value.trim();
    if matches!(value, "UTC" | "Z" | "GMT") {
        return Some(UtcOffset::UTC);
    }
    let value = value
        .strip_prefix("UTC")
        .or_else(|| value.strip_prefix("GMT"))
        .unwrap_or(value);

    let (sign, rest) = match value.chars().next()? {
        '+' => (1, &value[1..]),
        '-' => (-1, &value[1..]),
        _ => return None,
    };
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit() || b == b':') {
        return None;
    }
    let (hours, minutes) = match rest.split_once(':') {
        Some((hours, minutes)) => (hours, minutes),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours = hours.parse::<i8>().ok()?;
    let minutes = minutes.parse::<i8>().ok()?;
    UtcOffset::from_hms(sign * hours, sign * minutes, 0).ok()
}

/// Invalid or unreadable configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Unknown mapping version '{0}', expected WD-2011-03-24 or WD-2012-05-29")]
    UnknownVersion(String),
    #[error("Invalid IRI '{value}' for option {option}: {reason}")]
    InvalidIri {
        option: &'static str,
        value: String,
        reason: String,
    },
    #[error("Invalid time zone '{0}', expected UTC or an offset like +02:00")]
    InvalidTimeZone(String),
    #[error("Option {0} must be greater than zero")]
    ZeroValue(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_toml() {
        let config = MappingConfig::from_toml_str(
            r#"
            mappingVersion = "WD-2011-03-24"
            baseIRI = "http://example.com/db/"
            targetGraph = "http://example.com/graph"
            timeZone = "+02:00"
            fetchSize = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.mapping_version, MappingVersion::Wd20110324);
        assert_eq!(config.base_iri, "http://example.com/db/");
        assert_eq!(
            config.target_graph.as_deref(),
            Some("http://example.com/graph")
        );
        assert_eq!(config.fetch_size, 50);
        assert_eq!(
            config.utc_offset().unwrap(),
            UtcOffset::from_hms(2, 0, 0).unwrap()
        );
        assert_eq!(config.flush_interval, 50_000);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            MappingConfig::from_toml_str("baseIRI = \"not an iri\""),
            Err(ConfigError::InvalidIri { .. })
        ));
        assert!(matches!(
            MappingConfig::from_toml_str("fetchSize = 0"),
            Err(ConfigError::ZeroValue("fetchSize"))
        ));
        assert!(matches!(
            MappingConfig::from_toml_str("timeZone = \"Mars/Olympus\""),
            Err(ConfigError::InvalidTimeZone(_))
        ));
        assert!(matches!(
            MappingConfig::from_toml_str("unknownOption = 1"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_utc_offset("Z"), Some(UtcOffset::UTC));
        assert_eq!(
            parse_utc_offset("-0530"),
            Some(UtcOffset::from_hms(-5, -30, 0).unwrap())
        );
        assert_eq!(
            parse_utc_offset("UTC+1"),
            Some(UtcOffset::from_hms(1, 0, 0).unwrap())
        );
        assert_eq!(parse_utc_offset("Europe/Paris"), None);
        assert_eq!(parse_utc_offset("+1\u{e9}1"), None);
        assert_eq!(parse_utc_offset("+"), None);
    }

    #[test]
    fn rejects_non_ascii_offsets() {
        let config = MappingConfig {
            time_zone: "+1\u{e9}1".to_owned(),
            ..MappingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeZone(_))
        ));
    }

    #[test]
    fn parses_versions() {
        assert_eq!(
            "WD-2012-05-29".parse::<MappingVersion>().unwrap(),
            MappingVersion::Wd20120529
        );
        assert_eq!(
            "2011".parse::<MappingVersion>().unwrap(),
            MappingVersion::Wd20110324
        );
        assert!("WD-1999".parse::<MappingVersion>().is_err());
    }
}
