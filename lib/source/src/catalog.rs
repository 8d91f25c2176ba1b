use crate::{Database, ImportedKeyMetadata, ObjectKind};
use rdb2rdf_common::error::SchemaError;
use rdb2rdf_model::{CandidateKey, Column, ForeignKey, Header, SqlType, Table};
use std::sync::Arc;
use tracing::debug;

/// Derives table descriptors from the metadata of a [Database].
///
/// The catalog is a pure query layer. It does not cache; callers keep the descriptors for as long
/// as they need them.
pub struct SchemaCatalog<'db, D: Database + ?Sized> {
    db: &'db D,
}

impl<'db, D: Database + ?Sized> SchemaCatalog<'db, D> {
    pub fn new(db: &'db D) -> Self {
        Self { db }
    }

    /// Returns the names of all base tables. Views and other objects are excluded.
    pub fn tables(&self) -> Result<Vec<String>, SchemaError> {
        let objects = self
            .db
            .schema_objects()
            .map_err(|error| SchemaError::new("catalog", error))?;
        Ok(objects
            .into_iter()
            .filter(|object| object.kind == ObjectKind::BaseTable)
            .map(|object| object.name)
            .collect())
    }

    /// Returns the columns of `table` with their source datatypes.
    pub fn header(&self, table: &str) -> Result<Header, SchemaError> {
        let columns = self
            .db
            .columns(table)
            .map_err(|error| SchemaError::new(table, error))?;
        if columns.is_empty() {
            return Err(SchemaError::msg(table, "table has no columns or does not exist"));
        }
        Ok(columns
            .into_iter()
            .map(|column| Column::new(column.name, SqlType::from_type_name(&column.type_name)))
            .collect())
    }

    /// Returns the primary key of `table`, if it has one.
    pub fn primary_key(
        &self,
        table: &str,
        header: &Header,
    ) -> Result<Option<CandidateKey>, SchemaError> {
        let mut columns = self
            .db
            .primary_key_columns(table)
            .map_err(|error| SchemaError::new(table, error))?;
        if columns.is_empty() {
            return Ok(None);
        }
        columns.sort_by_key(|column| column.key_seq);

        let columns = columns
            .into_iter()
            .map(|column| column.column)
            .collect::<Vec<_>>();
        if let Some(missing) = columns.iter().find(|column| !header.contains(column)) {
            return Err(SchemaError::msg(
                table,
                format!("primary key column '{missing}' is not part of the table"),
            ));
        }
        Ok(Some(CandidateKey::primary(table, columns)))
    }

    /// Returns the foreign keys of `table`.
    ///
    /// Columns of composite keys are grouped by their sequence hint: a new key starts whenever the
    /// hint is back at its first value.
    pub fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>, SchemaError> {
        let imported = self
            .db
            .imported_keys(table)
            .map_err(|error| SchemaError::new(table, error))?;

        let mut groups: Vec<Vec<ImportedKeyMetadata>> = Vec::new();
        for column in imported {
            match groups.last_mut() {
                Some(group) if column.key_seq > 1 => group.push(column),
                _ => groups.push(vec![column]),
            }
        }

        groups
            .into_iter()
            .map(|group| self.foreign_key(table, group))
            .collect()
    }

    /// Returns the unique keys of `table` other than its primary key.
    pub fn unique_keys(&self, table: &str) -> Result<Vec<CandidateKey>, SchemaError> {
        let keys = self
            .db
            .unique_keys(table)
            .map_err(|error| SchemaError::new(table, error))?;
        Ok(keys
            .into_iter()
            .map(|key| CandidateKey::reference(table, key.columns))
            .collect())
    }

    /// Assembles the complete descriptor of `table`.
    pub fn table(&self, table: &str) -> Result<Arc<Table>, SchemaError> {
        let header = self.header(table)?;
        let primary_key = self.primary_key(table, &header)?;
        let foreign_keys = self.foreign_keys(table)?;
        let unique_keys = self
            .unique_keys(table)?
            .into_iter()
            .filter(|key| {
                primary_key
                    .as_ref()
                    .map_or(true, |primary_key| !primary_key.has_column_set(&key.columns))
            })
            .collect();

        debug!(
            table,
            columns = header.len(),
            has_primary_key = primary_key.is_some(),
            foreign_keys = foreign_keys.len(),
            "Read table metadata"
        );
        Ok(Arc::new(Table::try_new(
            table,
            header,
            primary_key,
            foreign_keys,
            unique_keys,
        )?))
    }

    fn foreign_key(
        &self,
        table: &str,
        group: Vec<ImportedKeyMetadata>,
    ) -> Result<ForeignKey, SchemaError> {
        let target_table = group
            .first()
            .map(|column| column.target_table.clone())
            .ok_or_else(|| SchemaError::msg(table, "empty foreign key"))?;
        if group.iter().any(|column| column.target_table != target_table) {
            return Err(SchemaError::msg(
                table,
                "columns of a foreign key reference different tables",
            ));
        }

        let explicit_targets = group
            .iter()
            .map(|column| column.target_column.clone())
            .collect::<Option<Vec<_>>>();
        let target_columns = match explicit_targets {
            Some(columns) => columns,
            None => {
                let target_header = self.header(&target_table)?;
                self.primary_key(&target_table, &target_header)?
                    .map(|key| key.columns)
                    .ok_or_else(|| {
                        SchemaError::msg(
                            table,
                            format!(
                                "foreign key references the primary key of '{target_table}', which has none"
                            ),
                        )
                    })?
            }
        };

        let columns = group.into_iter().map(|column| column.column).collect();
        Ok(ForeignKey::new(
            table,
            columns,
            CandidateKey::reference(target_table, target_columns),
        ))
    }
}
