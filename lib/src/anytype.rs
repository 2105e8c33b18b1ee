//! [`AnyTypeGraph`] is the catalog of managed entity kinds: any-types and the
//! classes of schema names assigned to them, relationship type definitions,
//! and the registry of named entities (groups, users, any objects) that
//! qualified attribute references may point at.
//!
//! Shares the copy-on-write reader/writer discipline of the
//! [`SchemaCatalog`], and participates in its deletion cascade: when a schema
//! definition is removed, it is stripped from every class referencing it.
//!
//! [`SchemaCatalog`]: ../schema/struct.SchemaCatalog.html

use std::collections::BTreeSet;

use concread::cowcell::*;
use hashbrown::HashMap;

use crate::prelude::*;

/// A kind of managed identity entity, carrying the classes that assign
/// schemas to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnyType {
    pub name: String,
    pub kind: AnyTypeKind,
    pub classes: Vec<String>,
}

/// A named grouping of plain/derived/virtual schema names assignable to an
/// any-type. Every schema name must exist in the schema catalog with the
/// matching kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnyTypeClass {
    pub name: String,
    pub plain_schemas: BTreeSet<String>,
    pub der_schemas: BTreeSet<String>,
    pub vir_schemas: BTreeSet<String>,
}

impl AnyTypeClass {
    pub fn new(name: &str) -> Self {
        AnyTypeClass {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn contains(&self, schema: &str) -> bool {
        self.plain_schemas.contains(schema)
            || self.der_schemas.contains(schema)
            || self.vir_schemas.contains(schema)
    }

    fn schema_iter(&self) -> impl Iterator<Item = (&String, SchemaType)> {
        self.plain_schemas
            .iter()
            .map(|s| (s, SchemaType::Plain))
            .chain(self.der_schemas.iter().map(|s| (s, SchemaType::Derived)))
            .chain(self.vir_schemas.iter().map(|s| (s, SchemaType::Virtual)))
    }
}

/// A relationship type definition: its name and the any-types it connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipType {
    pub name: String,
    pub left_any_type: String,
    pub right_any_type: String,
}

/// The working any-type catalog.
pub struct AnyTypeGraph {
    any_types: CowCell<HashMap<String, AnyType>>,
    classes: CowCell<HashMap<String, AnyTypeClass>>,
    relationship_types: CowCell<HashMap<String, RelationshipType>>,
    entities: CowCell<HashMap<String, AnyTypeKind>>,
}

pub struct AnyTypeGraphWriteTransaction<'a> {
    any_types: CowCellWriteTxn<'a, HashMap<String, AnyType>>,
    classes: CowCellWriteTxn<'a, HashMap<String, AnyTypeClass>>,
    relationship_types: CowCellWriteTxn<'a, HashMap<String, RelationshipType>>,
    entities: CowCellWriteTxn<'a, HashMap<String, AnyTypeKind>>,
}

pub struct AnyTypeGraphReadTransaction {
    any_types: CowCellReadTxn<HashMap<String, AnyType>>,
    classes: CowCellReadTxn<HashMap<String, AnyTypeClass>>,
    relationship_types: CowCellReadTxn<HashMap<String, RelationshipType>>,
    entities: CowCellReadTxn<HashMap<String, AnyTypeKind>>,
}

pub trait AnyTypeGraphTransaction {
    fn get_any_types(&self) -> &HashMap<String, AnyType>;
    fn get_classes(&self) -> &HashMap<String, AnyTypeClass>;
    fn get_relationship_types(&self) -> &HashMap<String, RelationshipType>;
    fn get_entities(&self) -> &HashMap<String, AnyTypeKind>;

    fn any_type(&self, name: &str) -> Result<&AnyType, CatalogError> {
        self.get_any_types()
            .get(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    fn class(&self, name: &str) -> Result<&AnyTypeClass, CatalogError> {
        self.get_classes()
            .get(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    /// The classes assigned to an any-type. Class names without a matching
    /// definition are skipped - `validate` reports them.
    fn classes_of(&self, any_type: &str) -> Result<Vec<&AnyTypeClass>, CatalogError> {
        let at = self.any_type(any_type)?;
        Ok(at
            .classes
            .iter()
            .filter_map(|name| {
                let cls = self.get_classes().get(name);
                if cls.is_none() {
                    warn!(any_type = %at.name, class = %name, "dangling class assignment");
                }
                cls
            })
            .collect())
    }

    fn relationship_type(&self, name: &str) -> Option<&RelationshipType> {
        self.get_relationship_types().get(name)
    }

    fn kind_of(&self, any_type: &str) -> Option<AnyTypeKind> {
        self.get_any_types().get(any_type).map(|at| at.kind)
    }

    /// Check that a referenced named entity exists and is of a kind
    /// compatible with the qualifier being constructed.
    fn is_valid_kind(&self, kind: AnyTypeKind, entity_ref: &str) -> bool {
        self.get_entities().get(entity_ref) == Some(&kind)
    }

    /// Graph-wide consistency sweep against the current schema catalog state:
    /// reports every class entry whose schema is missing or of the wrong
    /// kind, and every dangling class assignment. Intended as a post-load
    /// check; all findings are returned, none fixed.
    fn validate(&self, schema: &impl SchemaTransaction) -> Vec<CatalogError> {
        let mut res = Vec::new();

        self.get_classes().values().for_each(|cls| {
            cls.schema_iter().for_each(|(name, schema_type)| {
                if schema.lookup_typed(name, schema_type).is_none() {
                    res.push(CatalogError::UnknownSchema(name.clone()));
                }
            })
        });

        self.get_any_types().values().for_each(|at| {
            at.classes.iter().for_each(|cls| {
                if !self.get_classes().contains_key(cls) {
                    res.push(CatalogError::NotFound(cls.clone()));
                }
            })
        });

        res
    }
}

impl AnyTypeGraphTransaction for AnyTypeGraphWriteTransaction<'_> {
    fn get_any_types(&self) -> &HashMap<String, AnyType> {
        &self.any_types
    }

    fn get_classes(&self) -> &HashMap<String, AnyTypeClass> {
        &self.classes
    }

    fn get_relationship_types(&self) -> &HashMap<String, RelationshipType> {
        &self.relationship_types
    }

    fn get_entities(&self) -> &HashMap<String, AnyTypeKind> {
        &self.entities
    }
}

impl AnyTypeGraphTransaction for AnyTypeGraphReadTransaction {
    fn get_any_types(&self) -> &HashMap<String, AnyType> {
        &self.any_types
    }

    fn get_classes(&self) -> &HashMap<String, AnyTypeClass> {
        &self.classes
    }

    fn get_relationship_types(&self) -> &HashMap<String, RelationshipType> {
        &self.relationship_types
    }

    fn get_entities(&self) -> &HashMap<String, AnyTypeKind> {
        &self.entities
    }
}

impl<'a> AnyTypeGraphWriteTransaction<'a> {
    pub fn add_any_type(&mut self, any_type: AnyType) -> Result<(), CatalogError> {
        if self.any_types.contains_key(&any_type.name) {
            return Err(CatalogError::DuplicateName(any_type.name));
        }
        trace!(name = %any_type.name, kind = %any_type.kind, "any type add");
        self.any_types.insert(any_type.name.clone(), any_type);
        Ok(())
    }

    fn check_class_schemas(
        &self,
        class: &AnyTypeClass,
        schema: &impl SchemaTransaction,
    ) -> Result<(), CatalogError> {
        for (name, schema_type) in class.schema_iter() {
            if schema.lookup_typed(name, schema_type).is_none() {
                warn!(class = %class.name, schema = %name, "class references unknown schema");
                return Err(CatalogError::UnknownSchema(name.clone()));
            }
        }
        Ok(())
    }

    pub fn add_class(
        &mut self,
        class: AnyTypeClass,
        schema: &impl SchemaTransaction,
    ) -> Result<(), CatalogError> {
        if self.classes.contains_key(&class.name) {
            return Err(CatalogError::DuplicateName(class.name));
        }
        self.check_class_schemas(&class, schema)?;
        trace!(name = %class.name, "any type class add");
        self.classes.insert(class.name.clone(), class);
        Ok(())
    }

    pub fn update_class(
        &mut self,
        class: AnyTypeClass,
        schema: &impl SchemaTransaction,
    ) -> Result<(), CatalogError> {
        if !self.classes.contains_key(&class.name) {
            return Err(CatalogError::NotFound(class.name));
        }
        self.check_class_schemas(&class, schema)?;
        trace!(name = %class.name, "any type class update");
        self.classes.insert(class.name.clone(), class);
        Ok(())
    }

    pub fn delete_class(&mut self, name: &str) -> Result<(), CatalogError> {
        match self.classes.remove(name) {
            Some(_) => {
                trace!(%name, "any type class delete");
                Ok(())
            }
            None => Err(CatalogError::NotFound(name.to_string())),
        }
    }

    pub fn assign_class(&mut self, any_type: &str, class: &str) -> Result<(), CatalogError> {
        if !self.classes.contains_key(class) {
            return Err(CatalogError::NotFound(class.to_string()));
        }
        // The write txn's own get_mut() shadows the map's; deref explicitly.
        let at = self
            .any_types
            .get_mut()
            .get_mut(any_type)
            .ok_or_else(|| CatalogError::NotFound(any_type.to_string()))?;
        if !at.classes.iter().any(|c| c == class) {
            at.classes.push(class.to_string());
        }
        Ok(())
    }

    pub fn add_relationship_type(&mut self, rt: RelationshipType) -> Result<(), CatalogError> {
        if self.relationship_types.contains_key(&rt.name) {
            return Err(CatalogError::DuplicateName(rt.name));
        }
        for end in [&rt.left_any_type, &rt.right_any_type] {
            if !self.any_types.contains_key(end) {
                return Err(CatalogError::NotFound(end.clone()));
            }
        }
        self.relationship_types.insert(rt.name.clone(), rt);
        Ok(())
    }

    /// Record a named entity (a group, user or any object) so that qualified
    /// references to it can be kind-checked at parse time.
    pub fn register_entity(&mut self, name: &str, kind: AnyTypeKind) {
        self.entities.insert(name.to_string(), kind);
    }

    pub fn unregister_entity(&mut self, name: &str) {
        self.entities.remove(name);
    }

    /// Cascade step for a deleted schema: strip it from every class.
    pub fn remove_schema_from_classes(&mut self, schema: &str) {
        self.classes.values_mut().for_each(|cls| {
            let removed = cls.plain_schemas.remove(schema)
                || cls.der_schemas.remove(schema)
                || cls.vir_schemas.remove(schema);
            if removed {
                debug!(class = %cls.name, %schema, "schema removed from class");
            }
        });
    }

    pub fn commit(self) {
        let AnyTypeGraphWriteTransaction {
            any_types,
            classes,
            relationship_types,
            entities,
        } = self;

        any_types.commit();
        classes.commit();
        relationship_types.commit();
        entities.commit();
    }
}

impl AnyTypeGraph {
    pub fn new() -> Self {
        AnyTypeGraph {
            any_types: CowCell::new(HashMap::with_capacity(8)),
            classes: CowCell::new(HashMap::with_capacity(32)),
            relationship_types: CowCell::new(HashMap::with_capacity(8)),
            entities: CowCell::new(HashMap::with_capacity(64)),
        }
    }

    pub fn read(&self) -> AnyTypeGraphReadTransaction {
        AnyTypeGraphReadTransaction {
            any_types: self.any_types.read(),
            classes: self.classes.read(),
            relationship_types: self.relationship_types.read(),
            entities: self.entities.read(),
        }
    }

    pub fn write(&self) -> AnyTypeGraphWriteTransaction<'_> {
        AnyTypeGraphWriteTransaction {
            any_types: self.any_types.write(),
            classes: self.classes.write(),
            relationship_types: self.relationship_types.write(),
            entities: self.entities.write(),
        }
    }
}

impl Default for AnyTypeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaDeleteObserver for AnyTypeGraph {
    fn schema_deleted(&self, name: &str) {
        let mut gw = self.write();
        gw.remove_schema_from_classes(name);
        gw.commit();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::schema::{SchemaCatalog, SchemaDefinition};

    fn catalog_with(defs: &[(&str, SchemaType, AttrSyntax)]) -> SchemaCatalog {
        let catalog = SchemaCatalog::new();
        let mut sw = catalog.write();
        for (name, schema_type, syntax) in defs {
            sw.define(SchemaDefinition::new(name, *schema_type, *syntax))
                .expect("define failed");
        }
        sw.commit();
        catalog
    }

    #[test]
    fn test_any_type_class_crud() {
        let catalog = catalog_with(&[
            ("firstname", SchemaType::Plain, AttrSyntax::String),
            ("cn", SchemaType::Derived, AttrSyntax::String),
        ]);
        let graph = AnyTypeGraph::new();

        // Create with a single plain schema.
        let mut new_class = AnyTypeClass::new("new class");
        new_class.plain_schemas.insert("firstname".to_string());

        let mut gw = graph.write();
        gw.add_class(new_class, &catalog.read())
            .expect("add failed");
        gw.commit();

        let cls = graph
            .read()
            .class("new class")
            .expect("read failed")
            .clone();
        assert!(!cls.plain_schemas.is_empty());
        assert!(cls.der_schemas.is_empty());
        assert!(cls.vir_schemas.is_empty());

        // Update adding a derived schema.
        let mut updated = cls;
        updated.der_schemas.insert("cn".to_string());
        let mut gw = graph.write();
        gw.update_class(updated, &catalog.read())
            .expect("update failed");
        gw.commit();

        let cls = graph
            .read()
            .class("new class")
            .expect("read failed")
            .clone();
        assert!(!cls.plain_schemas.is_empty());
        assert!(!cls.der_schemas.is_empty());
        assert!(cls.vir_schemas.is_empty());

        // Delete, then a read must fail with NotFound.
        let mut gw = graph.write();
        gw.delete_class("new class").expect("delete failed");
        gw.commit();

        assert_eq!(
            graph.read().class("new class").err(),
            Some(CatalogError::NotFound("new class".to_string()))
        );
    }

    #[test]
    fn test_class_requires_known_schema() {
        let catalog = catalog_with(&[("cn", SchemaType::Derived, AttrSyntax::String)]);
        let graph = AnyTypeGraph::new();

        let mut cls = AnyTypeClass::new("broken");
        cls.plain_schemas.insert("nosuch".to_string());
        let mut gw = graph.write();
        assert_eq!(
            gw.add_class(cls, &catalog.read()),
            Err(CatalogError::UnknownSchema("nosuch".to_string()))
        );

        // A schema of the wrong kind is just as unknown to that set.
        let mut cls = AnyTypeClass::new("broken");
        cls.plain_schemas.insert("cn".to_string());
        assert_eq!(
            gw.add_class(cls, &catalog.read()),
            Err(CatalogError::UnknownSchema("cn".to_string()))
        );
    }

    #[test]
    fn test_delete_schema_cascades_to_classes() {
        let catalog = catalog_with(&[("newschema", SchemaType::Plain, AttrSyntax::Date)]);
        let graph = Arc::new(AnyTypeGraph::new());
        catalog.register_observer(graph.clone());

        let mut cls = AnyTypeClass::new("new class");
        cls.plain_schemas.insert("newschema".to_string());
        let mut gw = graph.write();
        gw.add_class(cls, &catalog.read()).expect("add failed");
        gw.commit();

        assert!(graph
            .read()
            .class("new class")
            .expect("read failed")
            .contains("newschema"));

        let mut sw = catalog.write();
        sw.delete("newschema").expect("delete failed");
        sw.commit();

        // The class still exists but no longer references the schema.
        let cls = graph
            .read()
            .class("new class")
            .expect("read failed")
            .clone();
        assert!(!cls.contains("newschema"));
        assert!(cls.plain_schemas.is_empty());
    }

    #[test]
    fn test_assign_class_to_any_type() {
        let catalog = catalog_with(&[("email", SchemaType::Plain, AttrSyntax::String)]);
        let graph = AnyTypeGraph::new();

        let mut cls = AnyTypeClass::new("minimal user");
        cls.plain_schemas.insert("email".to_string());
        let mut gw = graph.write();
        gw.add_class(cls, &catalog.read()).expect("add failed");
        gw.add_any_type(AnyType {
            name: "USER".to_string(),
            kind: AnyTypeKind::User,
            classes: Vec::new(),
        })
        .expect("add failed");

        // Both ends must exist.
        assert_eq!(
            gw.assign_class("USER", "nosuch"),
            Err(CatalogError::NotFound("nosuch".to_string()))
        );
        assert_eq!(
            gw.assign_class("MACHINE", "minimal user"),
            Err(CatalogError::NotFound("MACHINE".to_string()))
        );

        gw.assign_class("USER", "minimal user").expect("assign failed");
        // Re-assigning is idempotent.
        gw.assign_class("USER", "minimal user").expect("assign failed");
        gw.commit();

        let gr = graph.read();
        assert_eq!(gr.any_type("USER").expect("read failed").classes.len(), 1);
        let classes = gr.classes_of("USER").expect("read failed");
        assert_eq!(classes.len(), 1);
        assert!(classes[0].contains("email"));
    }

    #[test]
    fn test_relationship_types_and_entities() {
        let graph = AnyTypeGraph::new();
        let mut gw = graph.write();
        gw.add_any_type(AnyType {
            name: "USER".to_string(),
            kind: AnyTypeKind::User,
            classes: Vec::new(),
        })
        .expect("add failed");
        gw.add_any_type(AnyType {
            name: "PRINTER".to_string(),
            kind: AnyTypeKind::AnyObject,
            classes: Vec::new(),
        })
        .expect("add failed");
        gw.add_relationship_type(RelationshipType {
            name: "assignment".to_string(),
            left_any_type: "USER".to_string(),
            right_any_type: "PRINTER".to_string(),
        })
        .expect("add failed");
        // Unknown end any-type is rejected.
        assert_eq!(
            gw.add_relationship_type(RelationshipType {
                name: "broken".to_string(),
                left_any_type: "USER".to_string(),
                right_any_type: "SCANNER".to_string(),
            }),
            Err(CatalogError::NotFound("SCANNER".to_string()))
        );
        gw.register_entity("devs", AnyTypeKind::Group);
        gw.commit();

        let gr = graph.read();
        assert!(gr.relationship_type("assignment").is_some());
        assert_eq!(gr.kind_of("PRINTER"), Some(AnyTypeKind::AnyObject));
        assert!(gr.is_valid_kind(AnyTypeKind::Group, "devs"));
        assert!(!gr.is_valid_kind(AnyTypeKind::User, "devs"));
        assert!(!gr.is_valid_kind(AnyTypeKind::Group, "nosuch"));
    }

    #[test]
    fn test_validate_reports_dangling_references() {
        let catalog = catalog_with(&[("email", SchemaType::Plain, AttrSyntax::String)]);
        let graph = AnyTypeGraph::new();
        // No observer registered - the cascade does not run, leaving the
        // class dangling after the schema is deleted.
        let mut cls = AnyTypeClass::new("minimal user");
        cls.plain_schemas.insert("email".to_string());
        let mut gw = graph.write();
        gw.add_class(cls, &catalog.read()).expect("add failed");
        gw.add_any_type(AnyType {
            name: "USER".to_string(),
            kind: AnyTypeKind::User,
            classes: vec!["minimal user".to_string(), "ghost".to_string()],
        })
        .expect("add failed");
        gw.commit();

        let mut sw = catalog.write();
        sw.delete("email").expect("delete failed");
        sw.commit();

        let findings = graph.read().validate(&catalog.read());
        assert!(findings.contains(&CatalogError::UnknownSchema("email".to_string())));
        assert!(findings.contains(&CatalogError::NotFound("ghost".to_string())));
    }
}
