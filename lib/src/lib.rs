//! The idprov core engine. This implements the internal components used to
//! resolve symbolic attribute references against the live schema and
//! any-type catalogs, and to validate per-resource attribute mappings before
//! they are persisted or propagated to a connector.
//!
//! The engine owns no I/O. Catalog contents are loaded by an external
//! persistence collaborator; connector object-class schemas arrive as
//! already-fetched values. Everything outside the two catalogs is a pure
//! function over its inputs.

#![deny(warnings)]
#![warn(unused_extern_crates)]
// Enable some groups of clippy lints.
#![deny(clippy::suspicious)]
#![deny(clippy::perf)]
// Specific lints to enforce.
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]

#[macro_use]
extern crate tracing;
#[macro_use]
extern crate lazy_static;

pub mod anytype;
pub mod flow;
pub mod intattr;
pub mod mapping;
pub mod schema;

/// A prelude of imports that should be imported by all other idprov modules
/// to help make imports cleaner.
pub mod prelude {
    pub use idprov_proto::constants::*;
    pub use idprov_proto::error::{
        CatalogError, ConsistencyError, MappingError, MappingErrorKind, ParseError,
    };
    pub use idprov_proto::to::{ConnAttr, ConnObjectClass, Mapping, MappingItem, Provision};
    pub use idprov_proto::types::{
        AnyTypeKind, AttrSyntax, ConnAttrType, MappingPurpose, SchemaType,
    };
    pub use uuid::Uuid;

    pub use crate::anytype::{
        AnyType, AnyTypeClass, AnyTypeGraph, AnyTypeGraphReadTransaction,
        AnyTypeGraphTransaction, AnyTypeGraphWriteTransaction, RelationshipType,
    };
    pub use crate::flow::{on_field_change, FieldChange, ProvisionFlowState};
    pub use crate::intattr::{
        IntAttrName, IntAttrNameParser, IntAttrQualifier, IntAttrTarget,
    };
    pub use crate::mapping::consistency::check;
    pub use crate::mapping::resolve::{resolve, ResolvedMapping, ResolvedMappingItem};
    pub use crate::schema::{
        SchemaCatalog, SchemaDefinition, SchemaDeleteObserver, SchemaReadTransaction,
        SchemaTransaction, SchemaWriteTransaction,
    };
}
