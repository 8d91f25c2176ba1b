use crate::{CandidateKey, ForeignKey, Header, KeyKind, ModelError};

/// The descriptor of a relational table: its header and keys.
///
/// A table has at most one primary key. Tables without a primary key identify their rows with
/// blank nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    name: String,
    header: Header,
    primary_key: Option<CandidateKey>,
    foreign_keys: Vec<ForeignKey>,
    unique_keys: Vec<CandidateKey>,
}

impl Table {
    /// Creates a new table descriptor and checks that all keys are consistent with the header.
    pub fn try_new(
        name: impl Into<String>,
        header: Header,
        primary_key: Option<CandidateKey>,
        foreign_keys: Vec<ForeignKey>,
        unique_keys: Vec<CandidateKey>,
    ) -> Result<Self, ModelError> {
        let name = name.into();

        if let Some(primary_key) = &primary_key {
            if primary_key.kind != KeyKind::Primary {
                return Err(ModelError::PrimaryKeyKind {
                    table: name,
                    kind: primary_key.kind,
                });
            }
            check_columns(&name, &header, &primary_key.columns)?;
        }

        for foreign_key in &foreign_keys {
            if foreign_key.references.kind != KeyKind::Reference {
                return Err(ModelError::ReferencedKeyKind {
                    table: name,
                    kind: foreign_key.references.kind,
                });
            }
            if foreign_key.columns.len() != foreign_key.references.columns.len() {
                return Err(ModelError::ForeignKeyArity {
                    table: name,
                    local: foreign_key.columns.len(),
                    referenced: foreign_key.references.columns.len(),
                });
            }
            check_columns(&name, &header, &foreign_key.columns)?;
        }

        for unique_key in &unique_keys {
            check_columns(&name, &header, &unique_key.columns)?;
        }

        Ok(Self {
            name,
            header,
            primary_key,
            foreign_keys,
            unique_keys,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn primary_key(&self) -> Option<&CandidateKey> {
        self.primary_key.as_ref()
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// Unique keys other than the primary key.
    pub fn unique_keys(&self) -> &[CandidateKey] {
        &self.unique_keys
    }

    /// Returns the foreign key whose columns are exactly the primary key columns, if any.
    ///
    /// Rows of such a table inherit their identity from the referenced row.
    pub fn primary_is_foreign_key(&self) -> Option<&ForeignKey> {
        let primary_key = self.primary_key.as_ref()?;
        self.foreign_keys
            .iter()
            .find(|foreign_key| primary_key.has_column_set(&foreign_key.columns))
    }
}

fn check_columns(table: &str, header: &Header, columns: &[String]) -> Result<(), ModelError> {
    if columns.is_empty() {
        return Err(ModelError::EmptyKey {
            table: table.to_owned(),
        });
    }
    match columns.iter().find(|column| !header.contains(column)) {
        None => Ok(()),
        Some(column) => Err(ModelError::UnknownKeyColumn {
            table: table.to_owned(),
            column: column.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Column, SqlType};

    fn header() -> Header {
        Header::new(vec![
            Column::new("id", SqlType::Integer),
            Column::new("name", SqlType::VarChar),
        ])
    }

    #[test]
    fn detects_primary_is_foreign_key() {
        let table = Table::try_new(
            "student",
            header(),
            Some(CandidateKey::primary("student", vec!["id".to_owned()])),
            vec![ForeignKey::new(
                "student",
                vec!["id".to_owned()],
                CandidateKey::reference("person", vec!["pid".to_owned()]),
            )],
            Vec::new(),
        )
        .unwrap();

        let key = table.primary_is_foreign_key().unwrap();
        assert_eq!(key.target_table(), "person");
    }

    #[test]
    fn rejects_primary_key_with_reference_kind() {
        let result = Table::try_new(
            "t",
            header(),
            Some(CandidateKey::reference("t", vec!["id".to_owned()])),
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(
            result,
            Err(ModelError::PrimaryKeyKind {
                table: "t".to_owned(),
                kind: KeyKind::Reference,
            })
        );
    }

    #[test]
    fn rejects_referenced_primary_kind() {
        let result = Table::try_new(
            "t",
            header(),
            None,
            vec![ForeignKey::new(
                "t",
                vec!["id".to_owned()],
                CandidateKey::primary("u", vec!["id".to_owned()]),
            )],
            Vec::new(),
        );
        assert!(matches!(result, Err(ModelError::ReferencedKeyKind { .. })));
    }

    #[test]
    fn rejects_unknown_key_columns() {
        let result = Table::try_new(
            "t",
            header(),
            Some(CandidateKey::primary("t", vec!["missing".to_owned()])),
            Vec::new(),
            Vec::new(),
        );
        assert!(matches!(result, Err(ModelError::UnknownKeyColumn { .. })));
    }
}
