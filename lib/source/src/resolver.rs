use crate::sql::{decode_record, to_param, KeyCondition};
use crate::{Database, SchemaCatalog, SqlBuilder, SqlParam};
use rdb2rdf_common::error::{KeyChainCycleError, ReferentialIntegrityError, SchemaError};
use rdb2rdf_common::MappingError;
use rdb2rdf_model::{ForeignKey, PrimaryKeyChain, Reference, ReferencedRows, Row, Table};
use std::collections::HashMap;
use std::sync::Arc;
use time::UtcOffset;
use tracing::{debug, trace};

/// Looks up the rows referenced by the foreign keys of a row.
///
/// Table descriptors of referenced tables are cached for the lifetime of the resolver.
pub struct ForeignKeyResolver<'db, D: Database + ?Sized> {
    db: &'db D,
    catalog: SchemaCatalog<'db, D>,
    sql: SqlBuilder,
    tables: HashMap<String, Arc<Table>>,
    time_offset: UtcOffset,
    max_chain_depth: usize,
}

impl<'db, D: Database + ?Sized> ForeignKeyResolver<'db, D> {
    pub fn new(db: &'db D, time_offset: UtcOffset, max_chain_depth: usize) -> Self {
        Self {
            db,
            catalog: SchemaCatalog::new(db),
            sql: SqlBuilder::new(db.dialect()),
            tables: HashMap::new(),
            time_offset,
            max_chain_depth,
        }
    }

    /// Returns the row of the referenced table matched by `key` for `row`.
    ///
    /// Null local values are matched with `IS NULL`. Returns [None] for a dangling reference and
    /// fails with [MappingError::ReferentialIntegrity] if more than one row matches.
    pub fn resolve(&mut self, row: &Row, key: &ForeignKey) -> Result<Option<Row>, MappingError> {
        let target = self.table(key.target_table())?;

        let mut conditions = Vec::with_capacity(key.columns.len());
        let mut params = Vec::with_capacity(key.columns.len());
        for (local, referenced) in key.column_pairs() {
            match row.value(local) {
                Some(value) => {
                    conditions.push(KeyCondition::Equals(referenced));
                    params.push(local_param(row, local, value));
                }
                None => conditions.push(KeyCondition::IsNull(referenced)),
            }
        }

        let query = self.sql.lookup(&target, &conditions);
        let mut records = self.db.query(&query, &params)?;
        if records.len() > 1 {
            return Err(ReferentialIntegrityError { key: key.clone() }.into());
        }
        let Some(record) = records.pop() else {
            trace!(
                table = row.table().name(),
                target = key.target_table(),
                "Dangling foreign key"
            );
            return Ok(None);
        };
        decode_record(&target, None, record, self.sql.dialect(), self.time_offset).map(Some)
    }

    /// Resolves every foreign key of `row`, in the order of the table's foreign keys.
    ///
    /// Keys with a null local value are reported as dangling without a lookup, as they never
    /// produce a reference. The identity of each referenced row is resolved through its own
    /// primary key chain, or is the referenced row itself if that chain is dangling.
    pub fn resolve_all(&mut self, row: &Row) -> Result<ReferencedRows, MappingError> {
        let table = Arc::clone(row.table_arc());
        let mut references = Vec::with_capacity(table.foreign_keys().len());
        for key in table.foreign_keys() {
            if row.has_null_in(&key.columns) {
                references.push(Reference::dangling(key.clone()));
                continue;
            }
            let Some(target) = self.resolve(row, key)? else {
                references.push(Reference::dangling(key.clone()));
                continue;
            };
            // A dangling chain leaves the target with its own identity, as when it is visited.
            let identity = match target.table().primary_is_foreign_key().cloned() {
                Some(chain_key) => self.resolve_primary_chain(&target, &chain_key)?,
                None => None,
            }
            .unwrap_or_else(|| target.clone());
            references.push(Reference {
                key: key.clone(),
                target: Some(target),
                identity: Some(identity),
            });
        }
        Ok(ReferencedRows::new(references))
    }

    /// Returns the resolved primary key chain if the primary key of `row`'s table is also one of
    /// its foreign keys.
    pub fn primary_is_foreign_key(
        &mut self,
        row: &Row,
    ) -> Result<Option<PrimaryKeyChain>, MappingError> {
        let Some(key) = row.table().primary_is_foreign_key().cloned() else {
            return Ok(None);
        };
        let terminal = self.resolve_primary_chain(row, &key)?;
        Ok(terminal.map(|terminal| PrimaryKeyChain { key, terminal }))
    }

    /// Follows `key` from `row` until a row is reached whose primary key is not a foreign key.
    ///
    /// Returns [None] if a link of the chain is dangling. Fails with
    /// [MappingError::KeyChainCycle] if a row is visited twice or the chain is longer than the
    /// configured depth.
    pub fn resolve_primary_chain(
        &mut self,
        row: &Row,
        key: &ForeignKey,
    ) -> Result<Option<Row>, MappingError> {
        let mut visited = vec![describe(row)];
        let mut current = row.clone();
        let mut key = key.clone();
        loop {
            let Some(next) = self.resolve(&current, &key)? else {
                debug!(
                    table = current.table().name(),
                    target = key.target_table(),
                    "Primary key chain ends in a dangling reference"
                );
                return Ok(None);
            };
            let Some(next_key) = next.table().primary_is_foreign_key().cloned() else {
                return Ok(Some(next));
            };

            let label = describe(&next);
            let seen = visited.contains(&label);
            visited.push(label);
            if seen || visited.len() > self.max_chain_depth {
                return Err(KeyChainCycleError { chain: visited }.into());
            }
            current = next;
            key = next_key;
        }
    }

    fn table(&mut self, name: &str) -> Result<Arc<Table>, SchemaError> {
        if let Some(table) = self.tables.get(name) {
            return Ok(Arc::clone(table));
        }
        let table = self.catalog.table(name)?;
        self.tables.insert(name.to_owned(), Arc::clone(&table));
        Ok(table)
    }
}

fn local_param(row: &Row, column: &str, value: &[u8]) -> SqlParam {
    match row.table().header().column(column) {
        Some(column) => to_param(value, &column.sql_type),
        None => SqlParam::Blob(value.to_vec()),
    }
}

/// Renders `row` as `table(key values)` for cycle reports.
fn describe(row: &Row) -> String {
    let columns = row
        .table()
        .primary_key()
        .map(|key| key.columns.clone())
        .unwrap_or_else(|| {
            row.table()
                .header()
                .iter()
                .map(|column| column.name.clone())
                .collect()
        });
    let values = columns
        .iter()
        .map(|column| {
            row.value(column)
                .map_or_else(|| "NULL".to_owned(), |v| String::from_utf8_lossy(v).into_owned())
        })
        .collect::<Vec<_>>();
    format!("{}({})", row.table().name(), values.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CursorOptions, RowCursor, SqliteDatabase};

    fn database(sql: &str) -> SqliteDatabase {
        let db = SqliteDatabase::open_in_memory().unwrap();
        // Fixtures hold dangling, ambiguous and cyclic references on purpose.
        db.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
        db.execute_batch(sql).unwrap();
        db
    }

    fn rows_of(db: &SqliteDatabase, table: &str) -> Vec<Row> {
        let mut cursor = RowCursor::new(db, CursorOptions::default());
        let mut rows = Vec::new();
        while let Some(row) = cursor.next().unwrap() {
            if row.table().name() == table {
                rows.push(row);
            }
        }
        rows
    }

    #[test]
    fn resolves_referenced_rows() {
        let db = database(
            "CREATE TABLE person (id INTEGER PRIMARY KEY, name TEXT,
                 manager INTEGER REFERENCES person(id));
             INSERT INTO person VALUES (1, 'Ann', NULL), (2, 'Bo', 1), (3, 'Cy', 9);",
        );
        let rows = rows_of(&db, "person");
        let mut resolver = ForeignKeyResolver::new(&db, UtcOffset::UTC, 8);
        let key = rows[0].table().foreign_keys()[0].clone();

        let references = resolver.resolve_all(&rows[1]).unwrap();
        let reference = references.get(&key).unwrap();
        let target = reference.target.as_ref().unwrap();
        assert_eq!(target.text("name").unwrap(), Some("Ann"));
        assert_eq!(target.index(), None);
        assert_eq!(reference.identity.as_ref(), Some(target));

        assert!(resolver.resolve_all(&rows[0]).unwrap().get(&key).unwrap().target.is_none());
        assert!(resolver.resolve(&rows[2], &key).unwrap().is_none());
    }

    #[test]
    fn matches_null_values_with_is_null() {
        let db = database(
            "CREATE TABLE target (a TEXT, b TEXT, UNIQUE (a, b));
             CREATE TABLE source (id INTEGER PRIMARY KEY, a TEXT, b TEXT,
                 FOREIGN KEY (a, b) REFERENCES target(a, b));
             INSERT INTO target VALUES ('x', NULL);
             INSERT INTO source VALUES (1, 'x', NULL);",
        );
        let row = rows_of(&db, "source").remove(0);
        let key = row.table().foreign_keys()[0].clone();
        let mut resolver = ForeignKeyResolver::new(&db, UtcOffset::UTC, 8);

        let target = resolver.resolve(&row, &key).unwrap().unwrap();
        assert_eq!(target.text("a").unwrap(), Some("x"));
        assert!(resolver.resolve_all(&row).unwrap().get(&key).unwrap().target.is_none());
    }

    #[test]
    fn rejects_ambiguous_matches() {
        let db = database(
            "CREATE TABLE target (code TEXT);
             CREATE TABLE source (id INTEGER PRIMARY KEY, code TEXT REFERENCES target(code));
             INSERT INTO target VALUES ('a'), ('a');
             INSERT INTO source VALUES (1, 'a');",
        );
        let row = rows_of(&db, "source").remove(0);
        let mut resolver = ForeignKeyResolver::new(&db, UtcOffset::UTC, 8);

        let error = resolver.resolve_all(&row).unwrap_err();
        assert!(matches!(error, MappingError::ReferentialIntegrity(_)));
    }

    #[test]
    fn walks_primary_key_chains() {
        let db = database(
            "CREATE TABLE a (id INTEGER PRIMARY KEY, label TEXT);
             CREATE TABLE b (id INTEGER PRIMARY KEY REFERENCES a(id));
             CREATE TABLE c (id INTEGER PRIMARY KEY REFERENCES b(id));
             INSERT INTO a VALUES (7, 'seven');
             INSERT INTO b VALUES (7);
             INSERT INTO c VALUES (7);",
        );
        let row = rows_of(&db, "c").remove(0);
        let mut resolver = ForeignKeyResolver::new(&db, UtcOffset::UTC, 8);

        let chain = resolver.primary_is_foreign_key(&row).unwrap().unwrap();
        assert_eq!(chain.key.target_table(), "b");
        assert_eq!(chain.terminal.table().name(), "a");
        assert_eq!(chain.terminal.text("label").unwrap(), Some("seven"));
    }

    #[test]
    fn keeps_the_target_identity_when_its_chain_dangles() {
        let db = database(
            "CREATE TABLE person (id INTEGER PRIMARY KEY);
             CREATE TABLE student (id INTEGER PRIMARY KEY REFERENCES person(id));
             CREATE TABLE enrollment (id INTEGER PRIMARY KEY,
                 student INTEGER REFERENCES student(id));
             INSERT INTO student VALUES (7);
             INSERT INTO enrollment VALUES (1, 7);",
        );
        let row = rows_of(&db, "enrollment").remove(0);
        let key = row.table().foreign_keys()[0].clone();
        let mut resolver = ForeignKeyResolver::new(&db, UtcOffset::UTC, 8);

        let references = resolver.resolve_all(&row).unwrap();
        let reference = references.get(&key).unwrap();
        let target = reference.target.as_ref().unwrap();
        assert_eq!(target.table().name(), "student");
        assert_eq!(reference.identity.as_ref(), Some(target));
    }

    #[test]
    fn detects_primary_key_cycles() {
        let db = database(
            "CREATE TABLE a (id INTEGER PRIMARY KEY REFERENCES b(id));
             CREATE TABLE b (id INTEGER PRIMARY KEY REFERENCES a(id));
             INSERT INTO a VALUES (1);
             INSERT INTO b VALUES (1);",
        );
        let row = rows_of(&db, "a").remove(0);
        let mut resolver = ForeignKeyResolver::new(&db, UtcOffset::UTC, 8);

        let MappingError::KeyChainCycle(error) = resolver.primary_is_foreign_key(&row).unwrap_err()
        else {
            panic!("expected a cycle error");
        };
        assert_eq!(error.chain, vec!["a(1)", "b(1)", "a(1)"]);
    }
}
