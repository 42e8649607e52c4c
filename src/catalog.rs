use std::collections::{BTreeSet, HashMap};

/// Immutable mapping from class name to a dense, zero-based id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCatalog {
    names: Vec<String>,
    ids: HashMap<String, usize>,
}

impl ClassCatalog {
    /// Assign ids in sorted label order.
    pub fn from_labels(labels: &BTreeSet<String>) -> Self {
        Self::from_ordered(labels.iter().cloned())
    }

    /// Assign ids in the given order, ignoring repeated names.
    pub fn from_ordered<I>(names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut catalog = Self {
            names: Vec::new(),
            ids: HashMap::new(),
        };
        for name in names {
            if !catalog.ids.contains_key(&name) {
                catalog.ids.insert(name.clone(), catalog.names.len());
                catalog.names.push(name);
            }
        }
        catalog
    }

    /// Catalog holding a single class with id 0
    pub fn single(name: &str) -> Self {
        Self::from_ordered([name.to_string()])
    }

    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    /// Class names ordered by id
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
