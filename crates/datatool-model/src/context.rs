//! The database context: an explicit, owned name → database map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::{ModelError, Result};

/// Holds every loaded database. Names are unique; creating over an
/// existing name is an error and loading into one requires the load
/// action to allow appending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataContext {
    databases: BTreeMap<String, Database>,
}

impl DataContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.databases.contains_key(name)
    }

    /// Creates an empty database under `name`.
    pub fn create(&mut self, name: &str) -> Result<&mut Database> {
        if self.contains(name) {
            return Err(ModelError::DatabaseExists(name.to_string()));
        }
        Ok(self
            .databases
            .entry(name.to_string())
            .or_insert_with(|| Database::new(name)))
    }

    /// Inserts an already-built database under its own name.
    pub fn insert(&mut self, database: Database) -> Result<&mut Database> {
        let name = database.name().to_string();
        if self.contains(&name) {
            return Err(ModelError::DatabaseExists(name));
        }
        Ok(self.databases.entry(name).or_insert(database))
    }

    pub fn get(&self, name: &str) -> Result<&Database> {
        self.databases
            .get(name)
            .ok_or_else(|| ModelError::DatabaseNotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Database> {
        self.databases
            .get_mut(name)
            .ok_or_else(|| ModelError::DatabaseNotFound(name.to_string()))
    }

    pub fn get_or_create(&mut self, name: &str) -> &mut Database {
        self.databases
            .entry(name.to_string())
            .or_insert_with(|| Database::new(name))
    }

    pub fn remove(&mut self, name: &str) -> Result<Database> {
        self.databases
            .remove(name)
            .ok_or_else(|| ModelError::DatabaseNotFound(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.databases.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Database> {
        self.databases.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_duplicate() {
        let mut context = DataContext::new();
        context.create("marks").unwrap();
        assert!(context.contains("marks"));
        assert_eq!(
            context.create("marks").unwrap_err(),
            ModelError::DatabaseExists("marks".to_string())
        );
    }

    #[test]
    fn get_missing() {
        let context = DataContext::new();
        assert_eq!(
            context.get("marks").unwrap_err(),
            ModelError::DatabaseNotFound("marks".to_string())
        );
    }

    #[test]
    fn remove_returns_the_database() {
        let mut context = DataContext::new();
        context.create("marks").unwrap();
        let db = context.remove("marks").unwrap();
        assert_eq!(db.name(), "marks");
        assert!(context.is_empty());
    }
}
