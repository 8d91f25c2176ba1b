use crate::{ForeignKey, Row};

/// The outcome of resolving a single foreign key of a row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    /// The resolved foreign key.
    pub key: ForeignKey,
    /// The referenced row, or [None] for a dangling reference.
    pub target: Option<Row>,
    /// The row whose identity denotes the referenced resource.
    ///
    /// This is the target itself unless the target's primary key is again a foreign key, in which
    /// case it is the last row of that chain.
    pub identity: Option<Row>,
}

impl Reference {
    pub fn dangling(key: ForeignKey) -> Self {
        Self {
            key,
            target: None,
            identity: None,
        }
    }
}

/// All references of one row, in the order of the table's foreign keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferencedRows {
    references: Vec<Reference>,
}

impl ReferencedRows {
    pub fn new(references: Vec<Reference>) -> Self {
        Self { references }
    }

    pub fn get(&self, key: &ForeignKey) -> Option<&Reference> {
        self.references.iter().find(|reference| &reference.key == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reference> {
        self.references.iter()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

impl FromIterator<Reference> for ReferencedRows {
    fn from_iter<T: IntoIterator<Item = Reference>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A row's primary key that is also a foreign key, resolved to the end of its chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrimaryKeyChain {
    /// The local foreign key that equals the primary key.
    pub key: ForeignKey,
    /// The row at the end of the chain, whose primary key is not a foreign key.
    pub terminal: Row,
}
