//! Resolution of a provision's mapping items against the target connector
//! object class.

use crate::intattr::{IntAttrNameParser, IntAttrTarget};
use crate::prelude::*;

/// One fully-resolved mapping item: the parsed internal reference paired
/// with the connector attribute it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMappingItem {
    pub int_attr_name: IntAttrName,
    pub ext_attr_name: String,
    pub purpose: MappingPurpose,
    pub mandatory: bool,
    pub multivalue: bool,
    pub conn_attr_type: ConnAttrType,
}

/// A validated mapping set, safe to hand to the propagation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMapping {
    pub any_type: String,
    pub object_class: String,
    pub items: Vec<ResolvedMappingItem>,
    pub conn_object_link: Option<String>,
}

/// Structural compatibility between an internal value syntax and a connector
/// attribute type. Exact equality is not required: a string-typed connector
/// attribute can carry most scalar renderings, a datetime can be propagated
/// as an epoch long. Binary data only fits a binary attribute.
fn syntax_compatible(internal: AttrSyntax, external: ConnAttrType) -> bool {
    match internal {
        AttrSyntax::String | AttrSyntax::Enum => matches!(external, ConnAttrType::String),
        AttrSyntax::Long => matches!(
            external,
            ConnAttrType::Long | ConnAttrType::Double | ConnAttrType::String
        ),
        AttrSyntax::Double => matches!(external, ConnAttrType::Double | ConnAttrType::String),
        AttrSyntax::Boolean => matches!(external, ConnAttrType::Boolean | ConnAttrType::String),
        AttrSyntax::Date => matches!(
            external,
            ConnAttrType::DateTime | ConnAttrType::Long | ConnAttrType::String
        ),
        AttrSyntax::Binary => matches!(external, ConnAttrType::Binary),
        AttrSyntax::Encrypted => {
            matches!(external, ConnAttrType::String | ConnAttrType::Binary)
        }
    }
}

/// The value syntax of a core entity field.
fn field_syntax(field: &str) -> AttrSyntax {
    match field {
        "creationDate" | "lastChangeDate" => AttrSyntax::Date,
        _ => AttrSyntax::String,
    }
}

fn internal_syntax(
    schema: &impl SchemaTransaction,
    parsed: &IntAttrName,
) -> Result<AttrSyntax, ParseError> {
    match &parsed.target {
        IntAttrTarget::Field(name) => Ok(field_syntax(name)),
        IntAttrTarget::Privileges { .. } => Ok(AttrSyntax::String),
        IntAttrTarget::Schema { name, .. } => schema
            .lookup(name)
            .map(|def| def.syntax)
            .map_err(|_| ParseError::UnknownSchema(name.clone())),
    }
}

/// Resolve every mapping item of `provision` against `object_class`. Each
/// item's internal reference is (re-)parsed against the current catalog
/// snapshots - this is where a mapping holding a reference to a
/// since-deleted schema surfaces its staleness. All findings are collected;
/// nothing stops at the first failure.
#[instrument(level = "debug", name = "mapping::resolve", skip_all, fields(any_type = %provision.any_type, object_class = %object_class.name))]
pub fn resolve<S, G>(
    schema: &S,
    graph: &G,
    provision: &Provision,
    object_class: &ConnObjectClass,
) -> Result<ResolvedMapping, Vec<MappingError>>
where
    S: SchemaTransaction,
    G: AnyTypeGraphTransaction,
{
    let kind = match graph.kind_of(&provision.any_type) {
        Some(kind) => kind,
        None => {
            error!(any_type = %provision.any_type, "resolve rejected - unknown any type");
            return Err(vec![MappingError::UnknownAnyType(
                provision.any_type.clone(),
            )]);
        }
    };

    let parser = IntAttrNameParser::new(schema, graph);
    let mut errors = Vec::new();
    let mut items = Vec::with_capacity(provision.mapping.items.len());

    for (idx, item) in provision.mapping.items.iter().enumerate() {
        let item_error = |kind: MappingErrorKind| MappingError::Item {
            item: idx,
            int_attr_name: item.int_attr_name.clone(),
            ext_attr_name: item.ext_attr_name.clone(),
            kind,
        };

        let parsed = match parser.parse(&item.int_attr_name, kind) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                errors.push(item_error(e.into()));
                None
            }
        };

        let conn_attr = match object_class.attr(&item.ext_attr_name) {
            Some(attr) => Some(attr),
            None => {
                errors.push(item_error(MappingErrorKind::UnknownConnAttr));
                None
            }
        };

        let (parsed, conn_attr) = match (parsed, conn_attr) {
            (Some(p), Some(c)) => (p, c),
            _ => continue,
        };

        match internal_syntax(schema, &parsed) {
            Ok(internal) if !syntax_compatible(internal, conn_attr.attr_type) => {
                errors.push(item_error(MappingErrorKind::TypeMismatch {
                    internal,
                    external: conn_attr.attr_type,
                }));
            }
            Ok(_) => {
                items.push(ResolvedMappingItem {
                    int_attr_name: parsed,
                    ext_attr_name: item.ext_attr_name.clone(),
                    purpose: item.purpose,
                    mandatory: item.mandatory,
                    multivalue: item.multivalue,
                    conn_attr_type: conn_attr.attr_type,
                });
            }
            Err(e) => errors.push(item_error(e.into())),
        }
    }

    if errors.is_empty() {
        debug!(items = items.len(), "mapping resolved");
        Ok(ResolvedMapping {
            any_type: provision.any_type.clone(),
            object_class: provision.object_class.clone(),
            items,
            conn_object_link: provision.mapping.conn_object_link.clone(),
        })
    } else {
        debug!(findings = errors.len(), "mapping resolution failed");
        Err(errors)
    }
}
