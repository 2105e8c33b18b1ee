use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AnyTypeKind, AttrSyntax, ConnAttrType};

/// Failures raised while parsing a textual internal-attribute reference.
/// Parsing fails fast - one error per call.
#[derive(Serialize, Deserialize, Error, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParseError {
    #[error("malformed attribute reference '{0}'")]
    MalformedReference(String),
    #[error("reference to unknown schema '{0}'")]
    UnknownSchema(String),
    #[error("reference '{reference}' is not valid for any type kind '{kind}'")]
    IncompatibleKind {
        reference: String,
        kind: AnyTypeKind,
    },
}

/// Failures raised by catalog mutations and lookups. Single error per call.
#[derive(Serialize, Deserialize, Error, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CatalogError {
    #[error("'{0}' is already defined")]
    DuplicateName(String),
    #[error("'{0}' not found")]
    NotFound(String),
    #[error("unknown schema '{0}'")]
    UnknownSchema(String),
}

/// What went wrong with one mapping item during resolution.
#[derive(Serialize, Deserialize, Error, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MappingErrorKind {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("connector object class does not expose this attribute")]
    UnknownConnAttr,
    #[error("internal syntax '{internal}' is incompatible with connector type '{external}'")]
    TypeMismatch {
        internal: AttrSyntax,
        external: ConnAttrType,
    },
}

/// One resolution finding. Item-level findings are pinned to the mapping
/// item they concern so that a configuration UI can surface each against the
/// right row.
#[derive(Serialize, Deserialize, Error, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MappingError {
    #[error("provision targets unknown any type '{0}'")]
    UnknownAnyType(String),
    #[error("mapping item {item} ('{int_attr_name}' -> '{ext_attr_name}'): {kind}")]
    Item {
        /// Ordinal of the item within the provision's mapping.
        item: usize,
        int_attr_name: String,
        ext_attr_name: String,
        kind: MappingErrorKind,
    },
}

/// Cross-item findings from the resource-mapping consistency pass. All rules
/// are evaluated independently and every violation is reported.
#[derive(Serialize, Deserialize, Error, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyError {
    #[error("multiple items target connector attribute '{ext_attr_name}'")]
    DuplicateTarget {
        ext_attr_name: String,
        /// Internal references of every item hitting the target.
        int_attr_names: Vec<String>,
    },
    #[error("no mapping item carries the password")]
    MissingPasswordMapping,
    #[error("more than one mapping item carries the password")]
    MultiplePasswordMappings { int_attr_names: Vec<String> },
    #[error("connector object link references '{token}' which is neither mapped nor a core field")]
    DanglingLinkReference { token: String },
    #[error("mandatory connector attribute '{ext_attr_name}' has no mapping")]
    UnmappedMandatoryAttribute { ext_attr_name: String },
}
