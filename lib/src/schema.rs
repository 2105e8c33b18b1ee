//! [`SchemaCatalog`] holds the set of internal schema definitions that
//! attribute references and mappings are validated against. It is one of the
//! two process-wide mutable catalogs of the engine (the other being the
//! [`AnyTypeGraph`]).
//!
//! Access follows a reader/writer discipline: any number of readers hold
//! cheap copy-on-write snapshots and never block each other, while writers
//! serialise on the cell, apply their changes and commit atomically. A commit
//! that removed definitions dispatches a cascade notification to registered
//! observers *before* the write transaction is released, so that referencing
//! catalogs (any-type classes) are updated as part of the same administrative
//! operation.
//!
//! Already-parsed [`IntAttrName`] values are deliberately not tracked here -
//! they are immutable value objects, and consumers re-resolve them at use
//! time (see `mapping::resolve`).
//!
//! [`AnyTypeGraph`]: ../anytype/struct.AnyTypeGraph.html
//! [`IntAttrName`]: ../intattr/struct.IntAttrName.html

use std::sync::{Arc, Mutex};

use concread::cowcell::*;
use hashbrown::HashMap;

use crate::prelude::*;

/// A named attribute definition: its kind (plain/derived/virtual) and value
/// syntax. Owned by the catalog; created and deleted via administrative CRUD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDefinition {
    pub name: String,
    pub uuid: Uuid,
    pub description: String,
    pub schema_type: SchemaType,
    pub syntax: AttrSyntax,
    pub multivalue: bool,
}

impl SchemaDefinition {
    pub fn new(name: &str, schema_type: SchemaType, syntax: AttrSyntax) -> Self {
        SchemaDefinition {
            name: name.to_string(),
            uuid: Uuid::new_v4(),
            description: String::new(),
            schema_type,
            syntax,
            multivalue: false,
        }
    }
}

/// Receives cascade notifications when schema definitions are deleted. The
/// notification fires after the deleting write transaction has committed, so
/// observers see the post-delete catalog state. The committing writer stays
/// exclusive until every observer returns; an observer must not commit to
/// the schema catalog itself.
pub trait SchemaDeleteObserver: Send + Sync {
    fn schema_deleted(&self, name: &str);
}

/// The working schema definition set.
pub struct SchemaCatalog {
    definitions: CowCell<HashMap<String, SchemaDefinition>>,
    observers: Mutex<Vec<Arc<dyn SchemaDeleteObserver>>>,
}

/// A writable transaction of the schema definition set. Changes are not
/// visible to readers until `commit`.
pub struct SchemaWriteTransaction<'a> {
    definitions: CowCellWriteTxn<'a, HashMap<String, SchemaDefinition>>,
    observers: &'a Mutex<Vec<Arc<dyn SchemaDeleteObserver>>>,
    pending_deletes: Vec<String>,
}

/// A read-only snapshot of the schema definition set. Remains stable for the
/// lifetime of the transaction even if writers commit concurrently.
pub struct SchemaReadTransaction {
    definitions: CowCellReadTxn<HashMap<String, SchemaDefinition>>,
}

pub trait SchemaTransaction {
    fn get_definitions(&self) -> &HashMap<String, SchemaDefinition>;

    fn lookup(&self, name: &str) -> Result<&SchemaDefinition, CatalogError> {
        self.get_definitions()
            .get(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    fn contains(&self, name: &str) -> bool {
        self.get_definitions().contains_key(name)
    }

    /// Look up a definition requiring it to be of the given kind. Used by the
    /// parser when a reference carries an explicit schema-type prefix.
    fn lookup_typed(&self, name: &str, schema_type: SchemaType) -> Option<&SchemaDefinition> {
        self.get_definitions()
            .get(name)
            .filter(|def| def.schema_type == schema_type)
    }
}

impl SchemaTransaction for SchemaWriteTransaction<'_> {
    fn get_definitions(&self) -> &HashMap<String, SchemaDefinition> {
        &self.definitions
    }
}

impl SchemaTransaction for SchemaReadTransaction {
    fn get_definitions(&self) -> &HashMap<String, SchemaDefinition> {
        &self.definitions
    }
}

impl<'a> SchemaWriteTransaction<'a> {
    pub fn define(&mut self, def: SchemaDefinition) -> Result<(), CatalogError> {
        if self.definitions.contains_key(&def.name) {
            warn!(name = %def.name, "schema define rejected - duplicate name");
            return Err(CatalogError::DuplicateName(def.name));
        }
        trace!(name = %def.name, schema_type = %def.schema_type, "schema define");
        self.definitions.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Result<(), CatalogError> {
        match self.definitions.remove(name) {
            Some(_) => {
                trace!(%name, "schema delete");
                self.pending_deletes.push(name.to_string());
                Ok(())
            }
            None => Err(CatalogError::NotFound(name.to_string())),
        }
    }

    /// Publish the new catalog state and dispatch cascade notifications for
    /// every definition deleted within this transaction. Every commit takes
    /// the observer registry lock for its whole duration, so no other writer
    /// can commit between the state becoming visible and the cascade
    /// completing. Observers must not commit to this catalog themselves.
    /// The persistence layer is expected to have durably applied the same
    /// changes before the administrative operation is acknowledged.
    pub fn commit(self) {
        let SchemaWriteTransaction {
            definitions,
            observers,
            pending_deletes,
        } = self;

        match observers.lock() {
            Ok(observers) => {
                definitions.commit();
                for name in &pending_deletes {
                    for observer in observers.iter() {
                        observer.schema_deleted(name);
                    }
                }
            }
            Err(_) => {
                // A poisoned registry means an observer panicked earlier; the
                // catalog state itself is still consistent.
                error!("schema observer registry poisoned, cascade skipped");
                definitions.commit();
            }
        }
    }
}

impl SchemaCatalog {
    pub fn new() -> Self {
        SchemaCatalog {
            definitions: CowCell::new(HashMap::with_capacity(128)),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn read(&self) -> SchemaReadTransaction {
        SchemaReadTransaction {
            definitions: self.definitions.read(),
        }
    }

    pub fn write(&self) -> SchemaWriteTransaction<'_> {
        SchemaWriteTransaction {
            definitions: self.definitions.write(),
            observers: &self.observers,
            pending_deletes: Vec::new(),
        }
    }

    pub fn register_observer(&self, observer: Arc<dyn SchemaDeleteObserver>) {
        match self.observers.lock() {
            Ok(mut observers) => observers.push(observer),
            Err(_) => error!("schema observer registry poisoned, observer dropped"),
        }
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::new()
    }
}
