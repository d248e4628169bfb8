//! Parsing of `quarry databases` output
//!
//! `databases --json` is the canonical form. The older plain-text form,
//! one `name: N documents, <size>` line per database, is accepted only
//! when the output is not JSON.

use serde::Deserialize;

use crate::types::DatabaseInfo;
use crate::util::{describe_size, parse_size};

use super::DiscoveryError;

#[derive(Deserialize)]
struct JsonDatabase {
    name: String,
    #[serde(default)]
    document_count: u64,
    #[serde(default)]
    size_bytes: u64,
    #[serde(default)]
    size_description: Option<String>,
}

impl From<JsonDatabase> for DatabaseInfo {
    fn from(db: JsonDatabase) -> Self {
        let size_description = db
            .size_description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| describe_size(db.size_bytes));
        Self {
            name: db.name,
            document_count: db.document_count,
            size_bytes: db.size_bytes,
            size_description,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonListing {
    List(Vec<JsonDatabase>),
    Wrapped { databases: Vec<JsonDatabase> },
}

/// Parse discovery output, JSON first, then the line format
pub fn parse_listing(output: &str) -> Result<Vec<DatabaseInfo>, DiscoveryError> {
    let output = output.trim();
    if output.is_empty() {
        return Ok(Vec::new());
    }

    let json_error = match parse_json(output) {
        Ok(databases) => return Ok(databases),
        Err(e) => e,
    };

    let databases: Vec<DatabaseInfo> = output.lines().filter_map(parse_line).collect();
    if databases.is_empty() {
        return Err(DiscoveryError::Parse(json_error.to_string()));
    }
    Ok(databases)
}

/// Parse the `databases --json` form
pub fn parse_json(output: &str) -> Result<Vec<DatabaseInfo>, serde_json::Error> {
    let listing: JsonListing = serde_json::from_str(output)?;
    let databases = match listing {
        JsonListing::List(list) => list,
        JsonListing::Wrapped { databases } => databases,
    };
    Ok(databases.into_iter().map(DatabaseInfo::from).collect())
}

/// Parse one `name: N documents, 1.2 MB` line
pub fn parse_line(line: &str) -> Option<DatabaseInfo> {
    let (name, rest) = line.trim().split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let (count, size) = match rest.split_once(',') {
        Some((count, size)) => (count, size.trim()),
        None => (rest, ""),
    };

    let mut words = count.split_whitespace();
    let document_count: u64 = words.next()?.parse().ok()?;
    if !matches!(words.next(), Some("document" | "documents")) {
        return None;
    }

    Some(DatabaseInfo {
        name: name.to_string(),
        document_count,
        size_bytes: parse_size(size).unwrap_or(0),
        size_description: size.to_string(),
    })
}
