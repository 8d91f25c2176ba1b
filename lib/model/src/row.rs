use crate::{Column, ModelError, Table, ValueEncodingError};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// An immutable snapshot of one database row.
///
/// Values are the raw bytes delivered by the database, aligned with the header of the owning
/// [Table]. The extraction index is the 1-based position of the row within its table scan and is
/// only known for rows produced by the row cursor. Rows fetched through a foreign key lookup carry
/// no index.
#[derive(Clone, PartialEq, Eq)]
pub struct Row {
    table: Arc<Table>,
    index: Option<u64>,
    values: Vec<Option<Vec<u8>>>,
}

impl Row {
    pub fn try_new(
        table: Arc<Table>,
        index: Option<u64>,
        values: Vec<Option<Vec<u8>>>,
    ) -> Result<Self, ModelError> {
        if values.len() != table.header().len() {
            return Err(ModelError::RowArity {
                table: table.name().to_owned(),
                expected: table.header().len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            table,
            index,
            values,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Returns the shared table descriptor.
    pub fn table_arc(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn index(&self) -> Option<u64> {
        self.index
    }

    /// Returns the raw value of `column`, or [None] if the value is null or the column does not
    /// exist.
    pub fn value(&self, column: &str) -> Option<&[u8]> {
        let position = self.table.header().position(column)?;
        self.values.get(position)?.as_deref()
    }

    /// Returns the value of `column` as UTF-8 text.
    pub fn text(&self, column: &str) -> Result<Option<&str>, ValueEncodingError> {
        self.value(column)
            .map(|bytes| {
                std::str::from_utf8(bytes).map_err(|source| ValueEncodingError {
                    table: self.table.name().to_owned(),
                    column: column.to_owned(),
                    source,
                })
            })
            .transpose()
    }

    /// Iterates over all columns together with their raw values.
    pub fn values(&self) -> impl Iterator<Item = (&Column, Option<&[u8]>)> {
        self.table
            .header()
            .iter()
            .zip(self.values.iter().map(Option::as_deref))
    }

    /// Returns whether any of `columns` is null in this row.
    pub fn has_null_in(&self, columns: &[String]) -> bool {
        columns.iter().any(|column| self.value(column).is_none())
    }
}

impl Debug for Row {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let values = self
            .values()
            .map(|(column, value)| {
                (
                    column.name.as_str(),
                    value.map(String::from_utf8_lossy),
                )
            })
            .collect::<Vec<_>>();
        f.debug_struct("Row")
            .field("table", &self.table.name())
            .field("index", &self.index)
            .field("values", &values)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Header, SqlType};

    fn table() -> Arc<Table> {
        Arc::new(
            Table::try_new(
                "person",
                Header::new(vec![
                    Column::new("id", SqlType::Integer),
                    Column::new("name", SqlType::VarChar),
                ]),
                None,
                Vec::new(),
                Vec::new(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn reads_values_by_name() {
        let row = Row::try_new(table(), Some(1), vec![Some(b"1".to_vec()), None]).unwrap();
        assert_eq!(row.value("id"), Some(b"1".as_slice()));
        assert_eq!(row.value("name"), None);
        assert_eq!(row.value("missing"), None);
        assert!(row.has_null_in(&["name".to_owned()]));
        assert!(!row.has_null_in(&["id".to_owned()]));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let row = Row::try_new(table(), None, vec![Some(vec![0xFF, 0xFE]), None]).unwrap();
        let error = row.text("id").unwrap_err();
        assert_eq!(error.column, "id");
        assert_eq!(row.text("name"), Ok(None));
    }

    #[test]
    fn rejects_wrong_arity() {
        let result = Row::try_new(table(), None, vec![None]);
        assert!(matches!(result, Err(ModelError::RowArity { .. })));
    }
}
