use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of managed identity entity an attribute reference ultimately
/// addresses.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AnyTypeKind {
    User,
    Group,
    AnyObject,
}

impl AnyTypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnyTypeKind::User => "user",
            AnyTypeKind::Group => "group",
            AnyTypeKind::AnyObject => "anyObject",
        }
    }
}

impl fmt::Display for AnyTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a schema's value is produced: stored directly, derived from other
/// attributes, or fetched through a virtual lookup.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Plain,
    Derived,
    Virtual,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Plain => "plain",
            SchemaType::Derived => "derived",
            SchemaType::Virtual => "virtual",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value syntax of an internal schema definition.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AttrSyntax {
    String,
    Enum,
    Long,
    Double,
    Boolean,
    Date,
    Binary,
    Encrypted,
}

impl fmt::Display for AttrSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttrSyntax::String => "string",
            AttrSyntax::Enum => "enum",
            AttrSyntax::Long => "long",
            AttrSyntax::Double => "double",
            AttrSyntax::Boolean => "boolean",
            AttrSyntax::Date => "date",
            AttrSyntax::Binary => "binary",
            AttrSyntax::Encrypted => "encrypted",
        };
        f.write_str(s)
    }
}

/// The value type a connector advertises for an attribute of its object
/// class. Supplied by the connector-introspection collaborator, never
/// fetched by the core.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ConnAttrType {
    String,
    Long,
    Double,
    Boolean,
    Binary,
    DateTime,
}

impl fmt::Display for ConnAttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnAttrType::String => "string",
            ConnAttrType::Long => "long",
            ConnAttrType::Double => "double",
            ConnAttrType::Boolean => "boolean",
            ConnAttrType::Binary => "binary",
            ConnAttrType::DateTime => "datetime",
        };
        f.write_str(s)
    }
}

/// What role a mapping item plays within its provision.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MappingPurpose {
    /// The item identifies the connector object (at most one per provision
    /// is meaningful, enforced by the consistency checker).
    ConnObjectKey,
    /// The item carries the propagated password.
    Password,
    /// Any other propagated attribute.
    Other,
}
