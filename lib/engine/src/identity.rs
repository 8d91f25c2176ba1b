//! The subject identity of rows (phi).

use crate::literal::key_value;
use crate::MappingRules;
use rdb2rdf_common::error::EncodingError;
use rdb2rdf_common::MappingError;
use rdb2rdf_model::{BlankNode, ForeignKey, Iri, NamedNode, NamedOrBlankNode, Row};
use sha2::{Digest, Sha256};

/// Builds the IRIs and blank nodes of one mapping run.
#[derive(Clone, Debug)]
pub(crate) struct IdentityBuilder {
    rules: MappingRules,
    base: Iri<String>,
}

impl IdentityBuilder {
    pub(crate) fn new(rules: MappingRules, base: Iri<String>) -> Self {
        Self { rules, base }
    }

    pub(crate) fn base(&self) -> &Iri<String> {
        &self.base
    }

    /// `<base><table>`
    pub(crate) fn table_iri(&self, table: &str) -> Result<NamedNode, MappingError> {
        self.named_node(table, self.table_part(table))
    }

    /// `<base><table>#<column>`
    pub(crate) fn literal_predicate(
        &self,
        table: &str,
        column: &str,
    ) -> Result<NamedNode, MappingError> {
        let iri = format!("{}#{}", self.table_part(table), self.rules.names().encode(column));
        self.named_node(table, iri)
    }

    /// `<base><table>#<prefix><column>(<separator><column>)*`
    pub(crate) fn reference_predicate(&self, key: &ForeignKey) -> Result<NamedNode, MappingError> {
        let columns = key
            .columns
            .iter()
            .map(|column| self.rules.names().encode(column))
            .collect::<Vec<_>>()
            .join(&self.rules.key_separator().to_string());
        let iri = format!(
            "{}#{}{columns}",
            self.table_part(&key.table),
            self.rules.reference_prefix()
        );
        self.named_node(&key.table, iri)
    }

    /// The subject of `row`: an IRI built from its primary key or a blank node if the table has
    /// none.
    pub(crate) fn subject(&self, row: &Row) -> Result<NamedOrBlankNode, MappingError> {
        let table = row.table();
        let Some(primary_key) = table.primary_key() else {
            return Ok(blank_node(row).into());
        };

        let separator = self.rules.key_separator().to_string();
        let mut pairs = Vec::with_capacity(primary_key.columns.len());
        for name in &primary_key.columns {
            let column = table.header().column(name).ok_or_else(|| EncodingError {
                table: table.name().to_owned(),
                column: name.clone(),
                reason: "primary key column is not part of the header".to_owned(),
            })?;
            if row.value(name).is_none() {
                return Err(EncodingError {
                    table: table.name().to_owned(),
                    column: name.clone(),
                    reason: "primary key value is null".to_owned(),
                }
                .into());
            }
            let lexical = key_value(&self.rules, row, column)?;
            pairs.push(format!(
                "{}={}",
                self.rules.names().encode(name),
                self.rules.values().encode(&lexical)
            ));
        }

        let iri = format!("{}/{}", self.table_part(table.name()), pairs.join(&separator));
        Ok(self.named_node(table.name(), iri)?.into())
    }

    fn table_part(&self, table: &str) -> String {
        format!("{}{}", self.base.as_str(), self.rules.names().encode(table))
    }

    fn named_node(&self, table: &str, iri: String) -> Result<NamedNode, MappingError> {
        NamedNode::new(iri).map_err(|error| {
            EncodingError {
                table: table.to_owned(),
                column: String::new(),
                reason: error.to_string(),
            }
            .into()
        })
    }
}

/// Derives a blank node for a row of a table without primary key.
///
/// The label is a digest of the table name and of the first unique key without nulls. Rows
/// without such a key are identified by their extraction index and all of their values, so equal
/// rows still get distinct blank nodes.
fn blank_node(row: &Row) -> BlankNode {
    let table = row.table();
    let mut hasher = Sha256::new();
    update(&mut hasher, table.name().as_bytes());

    let unique_key = table
        .unique_keys()
        .iter()
        .find(|key| !row.has_null_in(&key.columns));
    if let Some(key) = unique_key {
        hasher.update(b"k");
        for column in &key.columns {
            update(&mut hasher, column.as_bytes());
            update(&mut hasher, row.value(column).unwrap_or_default());
        }
    } else {
        hasher.update(b"r");
        hasher.update(row.index().unwrap_or_default().to_be_bytes());
        for (column, value) in row.values() {
            update(&mut hasher, column.name.as_bytes());
            match value {
                Some(value) => {
                    hasher.update([1]);
                    update(&mut hasher, value);
                }
                None => hasher.update([0]),
            }
        }
    }

    let digest = hasher.finalize();
    let mut id = [0; 16];
    id.copy_from_slice(&digest[..16]);
    BlankNode::new_from_unique_id(u128::from_be_bytes(id))
}

/// Length-prefixed so that adjacent values cannot run into each other.
fn update(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}
