//! Transfer objects accepted from the administration UI / REST layer. These
//! arrive already parsed from JSON; the core treats them as plain values.

use serde::{Deserialize, Serialize};

use crate::types::{ConnAttrType, MappingPurpose};

/// One pairing of an internal attribute reference with a connector-side
/// attribute name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MappingItem {
    /// Textual internal reference, e.g. `username` or `membership::devs::plain::email`.
    pub int_attr_name: String,
    /// Attribute name within the connector object class.
    pub ext_attr_name: String,
    pub purpose: MappingPurpose,
    /// The internal value must be present for propagation to proceed.
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub multivalue: bool,
}

/// The ordered attribute mapping of one provision.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    pub items: Vec<MappingItem>,
    /// Optional expression producing the connector object link (DN-style
    /// naming), referencing mapped internal attributes and core fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conn_object_link: Option<String>,
}

/// The configuration binding one any-type to one external resource.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Provision {
    pub any_type: String,
    pub object_class: String,
    pub mapping: Mapping,
}

/// One attribute of a connector object class, as introspected from the
/// external system by the connector layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConnAttr {
    pub name: String,
    pub attr_type: ConnAttrType,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub multivalue: bool,
}

/// The external system's schema for one object kind. Handed to the core as
/// an already-fetched value - the core never contacts a connector.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConnObjectClass {
    pub name: String,
    pub attributes: Vec<ConnAttr>,
}

impl ConnObjectClass {
    pub fn attr(&self, name: &str) -> Option<&ConnAttr> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn mandatory_attrs(&self) -> impl Iterator<Item = &ConnAttr> {
        self.attributes.iter().filter(|a| a.mandatory)
    }
}
