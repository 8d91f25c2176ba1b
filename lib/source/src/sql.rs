use crate::temporal::epoch_to_lexical;
use crate::{Record, SqlParam};
use rdb2rdf_common::error::EncodingError;
use rdb2rdf_common::{Dialect, MappingError};
use rdb2rdf_model::{Row, SqlType, Table};
use std::sync::Arc;
use time::UtcOffset;

/// Builds the queries issued by the row cursor and the foreign key resolver.
#[derive(Clone, Copy, Debug)]
pub struct SqlBuilder {
    dialect: Dialect,
}

/// A condition of a foreign key lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum KeyCondition<'a> {
    Equals(&'a str),
    IsNull(&'a str),
}

impl SqlBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The projection of all columns of `table`, with epoch extraction applied to temporal
    /// columns if the dialect requires it.
    pub fn select_list(&self, table: &Table) -> String {
        table
            .header()
            .iter()
            .map(|column| {
                let quoted = self.dialect.quote(&column.name);
                if !column.sql_type.is_epoch_temporal() {
                    return quoted;
                }
                match self.dialect.epoch_expression(&quoted) {
                    Some(expression) => format!("{expression} AS {quoted}"),
                    None => quoted,
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Selects one page of the rows of `table`.
    ///
    /// Rows are ordered by the primary key, or by all columns if there is none, so that pages do
    /// not overlap and the extraction index of a row is reproducible.
    pub fn select_page(&self, table: &Table, offset: u64, limit: u64) -> String {
        let order = match table.primary_key() {
            Some(key) => key
                .columns
                .iter()
                .filter_map(|column| table.header().position(column))
                .map(|position| (position + 1).to_string())
                .collect::<Vec<_>>(),
            None => (1..=table.header().len()).map(|p| p.to_string()).collect(),
        };
        let mut query = format!(
            "SELECT {} FROM {}",
            self.select_list(table),
            self.dialect.quote(table.name())
        );
        if !order.is_empty() {
            query.push_str(" ORDER BY ");
            query.push_str(&order.join(", "));
        }
        self.dialect.paginate(&query, offset, limit)
    }

    /// Counts the rows of `table`.
    pub fn count_rows(&self, table: &str) -> String {
        format!("SELECT COUNT(*) FROM {}", self.dialect.quote(table))
    }

    /// Selects the rows of `table` matching `conditions`. At most two rows are requested, which
    /// suffices to detect ambiguous matches.
    pub(crate) fn lookup(&self, table: &Table, conditions: &[KeyCondition<'_>]) -> String {
        let predicates = conditions
            .iter()
            .map(|condition| match condition {
                KeyCondition::Equals(column) => format!("{} = ?", self.dialect.quote(column)),
                KeyCondition::IsNull(column) => format!("{} IS NULL", self.dialect.quote(column)),
            })
            .collect::<Vec<_>>()
            .join(" AND ");
        let query = format!(
            "SELECT {} FROM {} WHERE {predicates}",
            self.select_list(table),
            self.dialect.quote(table.name())
        );
        self.dialect.limit(&query, 2)
    }
}

/// Turns a raw record into a [Row] of `table`.
pub(crate) fn decode_record(
    table: &Arc<Table>,
    index: Option<u64>,
    record: Record,
    dialect: Dialect,
    offset: UtcOffset,
) -> Result<Row, MappingError> {
    let row = Row::try_new(Arc::clone(table), index, record)
        .map_err(|error| MappingError::Schema(error.into()))?;
    if !dialect.extracts_temporal_as_epoch() {
        return Ok(row);
    }

    let values = row
        .values()
        .map(|(column, value)| -> Result<Option<Vec<u8>>, MappingError> {
            if value.is_none() || !column.sql_type.is_epoch_temporal() {
                return Ok(value.map(<[u8]>::to_vec));
            }
            let text = row.text(&column.name)?.unwrap_or_default();
            let lexical = epoch_to_lexical(text, &column.sql_type, offset).map_err(|reason| {
                EncodingError {
                    table: table.name().to_owned(),
                    column: column.name.clone(),
                    reason,
                }
            })?;
            Ok(Some(lexical.into_bytes()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Row::try_new(Arc::clone(table), index, values)
        .map_err(|error| MappingError::Schema(error.into()))
}

/// Binds a raw value of a column of type `sql_type` as a query parameter.
pub(crate) fn to_param(value: &[u8], sql_type: &SqlType) -> SqlParam {
    if sql_type.is_binary() {
        return SqlParam::Blob(value.to_vec());
    }
    let Ok(text) = std::str::from_utf8(value) else {
        return SqlParam::Blob(value.to_vec());
    };
    if sql_type.is_integer() {
        if let Ok(integer) = text.trim().parse::<i64>() {
            return SqlParam::Integer(integer);
        }
    }
    if matches!(sql_type, SqlType::Real | SqlType::Float | SqlType::Double) {
        if let Ok(real) = text.trim().parse::<f64>() {
            return SqlParam::Real(real);
        }
    }
    SqlParam::Text(text.to_owned())
}
