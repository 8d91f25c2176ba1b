use crate::identity::IdentityBuilder;
use crate::literal::literal;
use crate::MappingRules;
use itertools::Itertools;
use rdb2rdf_common::{MappingError, MappingVersion};
use rdb2rdf_model::vocab::rdf;
use rdb2rdf_model::{
    Iri, NamedNode, NamedOrBlankNode, PrimaryKeyChain, ReferencedRows, Row, Triple,
};
use rustc_hash::FxHashSet;
use tracing::trace;

/// Converts rows into triples following one draft of the W3C Direct Mapping.
///
/// The engine is a pure function of its inputs. All database access happens before
/// [DirectMappingEngine::convert] is called: the referenced rows and the primary key chain are
/// resolved by the caller.
#[derive(Clone, Debug)]
pub struct DirectMappingEngine {
    rules: MappingRules,
    identities: IdentityBuilder,
}

impl DirectMappingEngine {
    pub fn new(version: MappingVersion, base_iri: Iri<String>) -> Self {
        let rules = MappingRules::new(version);
        Self {
            rules,
            identities: IdentityBuilder::new(rules, base_iri),
        }
    }

    pub fn rules(&self) -> &MappingRules {
        &self.rules
    }

    pub fn base_iri(&self) -> &Iri<String> {
        self.identities.base()
    }

    /// The IRI denoting `table`, used as the class of its rows.
    pub fn table_iri(&self, table: &str) -> Result<NamedNode, MappingError> {
        self.identities.table_iri(table)
    }

    /// The subject identity of `row`, ignoring primary keys that are foreign keys.
    pub fn subject(&self, row: &Row) -> Result<NamedOrBlankNode, MappingError> {
        self.identities.subject(row)
    }

    /// Converts `row` into its set of triples.
    ///
    /// `referenced` holds the resolved foreign keys of the row. If the primary key of the row's
    /// table is also a foreign key, `primary_chain` holds the row at the end of that chain, whose
    /// identity becomes the subject.
    pub fn convert(
        &self,
        row: &Row,
        referenced: &ReferencedRows,
        primary_chain: Option<&PrimaryKeyChain>,
    ) -> Result<Vec<Triple>, MappingError> {
        let table = row.table();
        let subject = match primary_chain {
            Some(chain) => self.identities.subject(&chain.terminal)?,
            None => self.identities.subject(row)?,
        };
        let identifying_key = table.primary_is_foreign_key();

        let mut triples = vec![Triple::new(
            subject.clone(),
            rdf::TYPE,
            self.identities.table_iri(table.name())?,
        )];

        for key in table.foreign_keys() {
            if identifying_key == Some(key) || row.has_null_in(&key.columns) {
                continue;
            }
            let Some(identity) = referenced
                .get(key)
                .and_then(|reference| reference.identity.as_ref())
            else {
                trace!(table = table.name(), columns = ?key.columns, "No referenced row");
                continue;
            };
            triples.push(Triple::new(
                subject.clone(),
                self.identities.reference_predicate(key)?,
                self.identities.subject(identity)?,
            ));
        }

        let mut without_literals = FxHashSet::default();
        if !self.rules.literals_for_foreign_keys() {
            without_literals.extend(
                table
                    .foreign_keys()
                    .iter()
                    .filter(|key| identifying_key != Some(*key))
                    .flat_map(|key| key.columns.iter().map(String::as_str)),
            );
        }

        for (column, value) in row.values() {
            if without_literals.contains(column.name.as_str()) {
                continue;
            }
            if value.is_none() {
                trace!(table = table.name(), column = %column.name, "Skipping null value");
                continue;
            }
            if column.sql_type.is_blob() {
                trace!(table = table.name(), column = %column.name, "Skipping BLOB value");
                continue;
            }
            triples.push(Triple::new(
                subject.clone(),
                self.identities.literal_predicate(table.name(), &column.name)?,
                literal(&self.rules, row, column)?,
            ));
        }

        Ok(triples.into_iter().unique().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use rdb2rdf_model::{
        CandidateKey, Column, ForeignKey, Header, Reference, SqlType, Subject, Table,
    };
    use std::sync::Arc;

    const BASE: &str = "http://foo.example/DB/";

    fn engine(version: MappingVersion) -> DirectMappingEngine {
        DirectMappingEngine::new(version, Iri::parse(BASE.to_owned()).unwrap())
    }

    fn person() -> Arc<Table> {
        let manager = ForeignKey::new(
            "Person",
            vec!["managerId".to_owned()],
            CandidateKey::reference("Person", vec!["id".to_owned()]),
        );
        Arc::new(
            Table::try_new(
                "Person",
                Header::new(vec![
                    Column::new("id", SqlType::Integer),
                    Column::new("name", SqlType::VarChar),
                    Column::new("managerId", SqlType::Integer),
                ]),
                Some(CandidateKey::primary("Person", vec!["id".to_owned()])),
                vec![manager],
                vec![],
            )
            .unwrap(),
        )
    }

    fn row(table: &Arc<Table>, index: Option<u64>, values: &[Option<&str>]) -> Row {
        let values = values
            .iter()
            .map(|value| value.map(|value| value.as_bytes().to_vec()))
            .collect();
        Row::try_new(Arc::clone(table), index, values).unwrap()
    }

    fn references_to(row: &Row, target: &Row) -> ReferencedRows {
        row.table()
            .foreign_keys()
            .iter()
            .map(|key| Reference {
                key: key.clone(),
                target: Some(target.clone()),
                identity: Some(target.clone()),
            })
            .collect()
    }

    fn render(triples: &[Triple]) -> String {
        triples.iter().map(|triple| format!("{triple} .")).join("\n")
    }

    #[test]
    fn maps_rows_with_references_2012() {
        let person = person();
        let ann = row(&person, Some(1), &[Some("1"), Some("Ann"), None]);
        let bo = row(&person, Some(2), &[Some("2"), Some("Bo"), Some("1")]);
        let engine = engine(MappingVersion::Wd20120529);

        let triples = engine
            .convert(&ann, &ReferencedRows::default(), None)
            .unwrap();
        assert_snapshot!(render(&triples), @r#"
        <http://foo.example/DB/Person/id=1> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://foo.example/DB/Person> .
        <http://foo.example/DB/Person/id=1> <http://foo.example/DB/Person#id> "1"^^<http://www.w3.org/2001/XMLSchema#integer> .
        <http://foo.example/DB/Person/id=1> <http://foo.example/DB/Person#name> "Ann" .
        "#);

        let triples = engine
            .convert(&bo, &references_to(&bo, &ann), None)
            .unwrap();
        assert_snapshot!(render(&triples), @r#"
        <http://foo.example/DB/Person/id=2> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://foo.example/DB/Person> .
        <http://foo.example/DB/Person/id=2> <http://foo.example/DB/Person#ref-managerId> <http://foo.example/DB/Person/id=1> .
        <http://foo.example/DB/Person/id=2> <http://foo.example/DB/Person#id> "2"^^<http://www.w3.org/2001/XMLSchema#integer> .
        <http://foo.example/DB/Person/id=2> <http://foo.example/DB/Person#name> "Bo" .
        <http://foo.example/DB/Person/id=2> <http://foo.example/DB/Person#managerId> "1"^^<http://www.w3.org/2001/XMLSchema#integer> .
        "#);
    }

    #[test]
    fn maps_rows_with_references_2011() {
        let person = person();
        let ann = row(&person, Some(1), &[Some("1"), Some("Ann"), None]);
        let bo = row(&person, Some(2), &[Some("2"), Some("Bo"), Some("1")]);
        let engine = engine(MappingVersion::Wd20110324);

        let triples = engine
            .convert(&bo, &references_to(&bo, &ann), None)
            .unwrap();
        assert_snapshot!(render(&triples), @r#"
        <http://foo.example/DB/Person/id=2> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://foo.example/DB/Person> .
        <http://foo.example/DB/Person/id=2> <http://foo.example/DB/Person#managerId> <http://foo.example/DB/Person/id=1> .
        <http://foo.example/DB/Person/id=2> <http://foo.example/DB/Person#id> "2"^^<http://www.w3.org/2001/XMLSchema#integer> .
        <http://foo.example/DB/Person/id=2> <http://foo.example/DB/Person#name> "Bo" .
        "#);
    }

    #[test]
    fn joins_composite_reference_columns_per_draft() {
        let dept = Arc::new(
            Table::try_new(
                "Dept",
                Header::new(vec![
                    Column::new("name", SqlType::VarChar),
                    Column::new("city", SqlType::VarChar),
                ]),
                Some(CandidateKey::primary(
                    "Dept",
                    vec!["name".to_owned(), "city".to_owned()],
                )),
                vec![],
                vec![],
            )
            .unwrap(),
        );
        let emp = Arc::new(
            Table::try_new(
                "Emp",
                Header::new(vec![
                    Column::new("id", SqlType::Integer),
                    Column::new("dept_name", SqlType::VarChar),
                    Column::new("dept_city", SqlType::VarChar),
                ]),
                Some(CandidateKey::primary("Emp", vec!["id".to_owned()])),
                vec![ForeignKey::new(
                    "Emp",
                    vec!["dept_name".to_owned(), "dept_city".to_owned()],
                    CandidateKey::reference("Dept", vec!["name".to_owned(), "city".to_owned()]),
                )],
                vec![],
            )
            .unwrap(),
        );
        let sales = row(&dept, None, &[Some("Sales"), Some("Paris")]);
        let ann = row(&emp, Some(1), &[Some("1"), Some("Sales"), Some("Paris")]);
        let references = references_to(&ann, &sales);

        let triples = engine(MappingVersion::Wd20120529)
            .convert(&ann, &references, None)
            .unwrap();
        assert_snapshot!(render(&triples), @r#"
        <http://foo.example/DB/Emp/id=1> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://foo.example/DB/Emp> .
        <http://foo.example/DB/Emp/id=1> <http://foo.example/DB/Emp#ref-dept_name;dept_city> <http://foo.example/DB/Dept/name=Sales;city=Paris> .
        <http://foo.example/DB/Emp/id=1> <http://foo.example/DB/Emp#id> "1"^^<http://www.w3.org/2001/XMLSchema#integer> .
        <http://foo.example/DB/Emp/id=1> <http://foo.example/DB/Emp#dept_name> "Sales" .
        <http://foo.example/DB/Emp/id=1> <http://foo.example/DB/Emp#dept_city> "Paris" .
        "#);

        let triples = engine(MappingVersion::Wd20110324)
            .convert(&ann, &references, None)
            .unwrap();
        assert_snapshot!(render(&triples), @r#"
        <http://foo.example/DB/Emp/id=1> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://foo.example/DB/Emp> .
        <http://foo.example/DB/Emp/id=1> <http://foo.example/DB/Emp#dept_name.dept_city> <http://foo.example/DB/Dept/name=Sales.city=Paris> .
        <http://foo.example/DB/Emp/id=1> <http://foo.example/DB/Emp#id> "1"^^<http://www.w3.org/2001/XMLSchema#integer> .
        "#);
    }

    #[test]
    fn omits_dangling_and_null_references() {
        let person = person();
        let bo = row(&person, Some(2), &[Some("2"), Some("Bo"), Some("9")]);
        let dangling: ReferencedRows = person
            .foreign_keys()
            .iter()
            .cloned()
            .map(Reference::dangling)
            .collect();

        let triples = engine(MappingVersion::Wd20120529)
            .convert(&bo, &dangling, None)
            .unwrap();
        assert_eq!(triples.len(), 4);
        assert!(triples
            .iter()
            .all(|triple| !triple.predicate.as_str().contains("#ref-")));
    }

    #[test]
    fn encodes_names_and_values_per_draft() {
        let table = Arc::new(
            Table::try_new(
                "my-table.x",
                Header::new(vec![
                    Column::new("a.b", SqlType::VarChar),
                    Column::new("c d", SqlType::VarChar),
                ]),
                Some(CandidateKey::primary(
                    "my-table.x",
                    vec!["a.b".to_owned(), "c d".to_owned()],
                )),
                vec![],
                vec![],
            )
            .unwrap(),
        );
        let row = row(&table, Some(1), &[Some("x-y.z"), Some("1/2")]);

        let subject = engine(MappingVersion::Wd20110324).subject(&row).unwrap();
        assert_eq!(
            subject.to_string(),
            "<http://foo.example/DB/my-table%2Ex/a%2Eb=x-y%2Ez.c%20d=1%2F2>"
        );
        let subject = engine(MappingVersion::Wd20120529).subject(&row).unwrap();
        assert_eq!(
            subject.to_string(),
            "<http://foo.example/DB/my%2Dtable.x/a.b=x-y.z;c%20d=1%2F2>"
        );
    }

    #[test]
    fn inherits_the_subject_of_the_primary_key_chain() {
        let person = person();
        let student = Arc::new(
            Table::try_new(
                "Student",
                Header::new(vec![
                    Column::new("id", SqlType::Integer),
                    Column::new("grade", SqlType::Char),
                ]),
                Some(CandidateKey::primary("Student", vec!["id".to_owned()])),
                vec![ForeignKey::new(
                    "Student",
                    vec!["id".to_owned()],
                    CandidateKey::reference("Person", vec!["id".to_owned()]),
                )],
                vec![],
            )
            .unwrap(),
        );
        let ann = row(&person, None, &[Some("7"), Some("Ann"), None]);
        let student_row = row(&student, Some(1), &[Some("7"), Some("A")]);
        let chain = PrimaryKeyChain {
            key: student.foreign_keys()[0].clone(),
            terminal: ann,
        };

        for version in [MappingVersion::Wd20110324, MappingVersion::Wd20120529] {
            let triples = engine(version)
                .convert(
                    &student_row,
                    &references_to(&student_row, &chain.terminal),
                    Some(&chain),
                )
                .unwrap();
            insta::allow_duplicates! {
                assert_snapshot!(render(&triples), @r#"
                <http://foo.example/DB/Person/id=7> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://foo.example/DB/Student> .
                <http://foo.example/DB/Person/id=7> <http://foo.example/DB/Student#id> "7"^^<http://www.w3.org/2001/XMLSchema#integer> .
                <http://foo.example/DB/Person/id=7> <http://foo.example/DB/Student#grade> "A" .
                "#);
            }
        }
    }

    #[test]
    fn skips_null_and_blob_values() {
        let table = Arc::new(
            Table::try_new(
                "Doc",
                Header::new(vec![
                    Column::new("id", SqlType::Integer),
                    Column::new("title", SqlType::VarChar),
                    Column::new("body", SqlType::Blob),
                ]),
                Some(CandidateKey::primary("Doc", vec!["id".to_owned()])),
                vec![],
                vec![],
            )
            .unwrap(),
        );
        let doc = row(&table, Some(1), &[Some("1"), None, Some("binary")]);

        let triples = engine(MappingVersion::Wd20120529)
            .convert(&doc, &ReferencedRows::default(), None)
            .unwrap();
        let predicates = triples
            .iter()
            .map(|triple| triple.predicate.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            predicates,
            vec![
                "http://www.w3.org/1999/02/22-rdf-syntax-ns#type",
                "http://foo.example/DB/Doc#id"
            ]
        );
    }

    #[test]
    fn identifies_rows_without_primary_key_with_blank_nodes() {
        let table = Arc::new(
            Table::try_new(
                "Log",
                Header::new(vec![Column::new("msg", SqlType::VarChar)]),
                None,
                vec![],
                vec![],
            )
            .unwrap(),
        );
        let first = row(&table, Some(1), &[Some("same")]);
        let second = row(&table, Some(2), &[Some("same")]);
        let engine = engine(MappingVersion::Wd20120529);

        let first_subject = engine.subject(&first).unwrap();
        assert!(matches!(first_subject, NamedOrBlankNode::BlankNode(_)));
        assert_ne!(first_subject, engine.subject(&second).unwrap());
        assert_eq!(first_subject, engine.subject(&first.clone()).unwrap());
    }

    #[test]
    fn uses_unique_keys_for_blank_nodes() {
        let table = Arc::new(
            Table::try_new(
                "Tag",
                Header::new(vec![
                    Column::new("code", SqlType::VarChar),
                    Column::new("label", SqlType::VarChar),
                ]),
                None,
                vec![],
                vec![CandidateKey::reference("Tag", vec!["code".to_owned()])],
            )
            .unwrap(),
        );
        let scanned = row(&table, Some(3), &[Some("rs"), Some("Rust")]);
        let looked_up = row(&table, None, &[Some("rs"), Some("Rust")]);
        let engine = engine(MappingVersion::Wd20120529);

        let subject = engine.subject(&scanned).unwrap();
        assert_eq!(subject, engine.subject(&looked_up).unwrap());
        let triples = engine
            .convert(&scanned, &ReferencedRows::default(), None)
            .unwrap();
        assert!(triples
            .iter()
            .all(|triple| triple.subject == Subject::from(subject.clone())));
    }
}
