use std::collections::BTreeSet;

/// Distinguishes the primary key of a table from keys that are the target of a foreign key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyKind {
    Primary,
    Reference,
}

/// An ordered list of columns that uniquely identifies a row of `table`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateKey {
    pub table: String,
    pub columns: Vec<String>,
    pub kind: KeyKind,
}

impl CandidateKey {
    pub fn primary(table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            table: table.into(),
            columns,
            kind: KeyKind::Primary,
        }
    }

    pub fn reference(table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            table: table.into(),
            columns,
            kind: KeyKind::Reference,
        }
    }

    /// Returns whether this key consists of exactly the columns in `columns`, ignoring order.
    pub fn has_column_set(&self, columns: &[String]) -> bool {
        self.columns.iter().collect::<BTreeSet<_>>() == columns.iter().collect::<BTreeSet<_>>()
    }
}

/// A set of local columns of `table` that references a candidate key of another (or the same)
/// table.
///
/// `columns[i]` is matched against `references.columns[i]`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForeignKey {
    pub table: String,
    pub columns: Vec<String>,
    pub references: CandidateKey,
}

impl ForeignKey {
    pub fn new(table: impl Into<String>, columns: Vec<String>, references: CandidateKey) -> Self {
        Self {
            table: table.into(),
            columns,
            references,
        }
    }

    pub fn target_table(&self) -> &str {
        &self.references.table
    }

    /// Iterates over the pairs of local and referenced column names.
    pub fn column_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.references.columns.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_set_ignores_order() {
        let key = CandidateKey::primary("t", vec!["a".to_owned(), "b".to_owned()]);
        assert!(key.has_column_set(&["b".to_owned(), "a".to_owned()]));
        assert!(!key.has_column_set(&["a".to_owned()]));
    }

    #[test]
    fn pairs_local_and_referenced_columns() {
        let key = ForeignKey::new(
            "emp",
            vec!["dept_name".to_owned(), "dept_city".to_owned()],
            CandidateKey::reference("dept", vec!["name".to_owned(), "city".to_owned()]),
        );
        let pairs = key.column_pairs().collect::<Vec<_>>();
        assert_eq!(pairs, vec![("dept_name", "name"), ("dept_city", "city")]);
        assert_eq!(key.target_table(), "dept");
    }
}
