//! [`IntAttrName`] identifies a single addressable internal attribute: a core
//! entity field or a schema, optionally reached through a relationship
//! context (the group enclosing the entity, a related user or any object, a
//! membership, an application's privileges, a typed relationship).
//!
//! The one-of-many union is expressed structurally: [`IntAttrTarget`] and
//! [`IntAttrQualifier`] make the mutual-exclusivity invariants impossible to
//! violate rather than convention-based.
//!
//! [`IntAttrNameParser::parse`] turns a textual reference into a validated
//! value; [`IntAttrName::format`] is its left inverse. Parsing validates
//! against catalog state *at parse time* only - parsed values are immutable
//! and are not retroactively corrected when the catalog changes. Consumers
//! that care about freshness re-resolve at use time.

use std::fmt;

use regex::Regex;

use crate::prelude::*;

lazy_static! {
    static ref NAME_RE: Regex =
        Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\- ]*$").expect("Invalid name regex found");
}

/// What the reference ultimately addresses on the subject entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IntAttrTarget {
    /// A core entity field, e.g. `username` or `creationDate`.
    Field(String),
    /// A schema of the given kind.
    Schema { schema_type: SchemaType, name: String },
    /// The set of privileges granted for one application. Carries no schema
    /// and admits no qualifier.
    Privileges { application: String },
}

/// The relationship context the target is read through, if any.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IntAttrQualifier {
    /// An attribute of the named group enclosing the entity.
    EnclosingGroup(String),
    /// An attribute of the named related user.
    RelatedUser(String),
    /// An attribute of the named related any object.
    RelatedAnyObject(String),
    /// A membership-scoped attribute of the entity itself, within the named
    /// group.
    MembershipOfGroup(String),
    /// An attribute of the any object reached through a typed relationship.
    Relationship {
        relationship_type: String,
        any_type: String,
    },
}

/// A parsed internal attribute reference. Immutable value object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntAttrName {
    /// The kind of entity the attribute is ultimately read from.
    pub any_type_kind: AnyTypeKind,
    pub qualifier: Option<IntAttrQualifier>,
    pub target: IntAttrTarget,
}

impl IntAttrName {
    /// The schema name this reference addresses, if it addresses one.
    pub fn schema_name(&self) -> Option<&str> {
        match &self.target {
            IntAttrTarget::Schema { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Render the canonical textual form. `parse(format(x)) == x` for every
    /// well-formed `x`.
    pub fn format(&self) -> String {
        self.to_string()
    }

    fn fmt_target(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            IntAttrTarget::Field(name) => f.write_str(name),
            IntAttrTarget::Schema { schema_type, name } => {
                write!(f, "{}::{}", schema_type.as_str(), name)
            }
            IntAttrTarget::Privileges { application } => {
                write!(f, "privilege::{}", application)
            }
        }
    }
}

impl fmt::Display for IntAttrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            None => {}
            Some(IntAttrQualifier::EnclosingGroup(group)) => write!(f, "group::{}::", group)?,
            Some(IntAttrQualifier::RelatedUser(user)) => write!(f, "user::{}::", user)?,
            Some(IntAttrQualifier::RelatedAnyObject(obj)) => write!(f, "anyObject::{}::", obj)?,
            Some(IntAttrQualifier::MembershipOfGroup(group)) => {
                write!(f, "membership::{}::", group)?
            }
            Some(IntAttrQualifier::Relationship {
                relationship_type,
                any_type,
            }) => write!(f, "relationship::{}::{}::", relationship_type, any_type)?,
        }
        self.fmt_target(f)
    }
}

/// The core entity fields addressable without a schema, per kind.
pub fn core_fields(kind: AnyTypeKind) -> &'static [&'static str] {
    match kind {
        AnyTypeKind::User => &[
            "key",
            "username",
            "password",
            "status",
            "creationDate",
            "lastChangeDate",
        ],
        AnyTypeKind::Group => &["key", "name", "creationDate", "lastChangeDate"],
        AnyTypeKind::AnyObject => &["key", "name", "status", "creationDate", "lastChangeDate"],
    }
}

fn core_field(kind: AnyTypeKind, name: &str) -> Option<&'static str> {
    core_fields(kind).iter().find(|f| **f == name).copied()
}

/// Parses textual attribute references against the current catalog state.
/// Side-effect free and reentrant; holds read snapshots only.
pub struct IntAttrNameParser<'a, S, G>
where
    S: SchemaTransaction,
    G: AnyTypeGraphTransaction,
{
    schema: &'a S,
    graph: &'a G,
}

impl<'a, S, G> IntAttrNameParser<'a, S, G>
where
    S: SchemaTransaction,
    G: AnyTypeGraphTransaction,
{
    pub fn new(schema: &'a S, graph: &'a G) -> Self {
        IntAttrNameParser { schema, graph }
    }

    /// Parse `token` as a reference on a provision of `provision_kind`.
    /// Fails fast with a single error: `MalformedReference` on grammar
    /// violations, `UnknownSchema` when a schema name cannot be resolved,
    /// `IncompatibleKind` when a qualifier does not fit the provision or its
    /// referenced entity.
    pub fn parse(
        &self,
        token: &str,
        provision_kind: AnyTypeKind,
    ) -> Result<IntAttrName, ParseError> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(ParseError::MalformedReference(token.to_string()));
        }

        let segments: Vec<&str> = trimmed.split("::").map(str::trim).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ParseError::MalformedReference(token.to_string()));
        }

        let keyword = segments[0].to_lowercase();
        match (keyword.as_str(), segments.len()) {
            ("group", 3..=4) => {
                let group = self.entity(segments[1], AnyTypeKind::Group)?;
                let target = self.parse_target(&segments[2..], AnyTypeKind::Group)?;
                Ok(IntAttrName {
                    any_type_kind: AnyTypeKind::Group,
                    qualifier: Some(IntAttrQualifier::EnclosingGroup(group)),
                    target,
                })
            }
            ("user", 3..=4) => {
                let user = self.entity(segments[1], AnyTypeKind::User)?;
                let target = self.parse_target(&segments[2..], AnyTypeKind::User)?;
                Ok(IntAttrName {
                    any_type_kind: AnyTypeKind::User,
                    qualifier: Some(IntAttrQualifier::RelatedUser(user)),
                    target,
                })
            }
            ("anyobject", 3..=4) => {
                let obj = self.entity(segments[1], AnyTypeKind::AnyObject)?;
                let target = self.parse_target(&segments[2..], AnyTypeKind::AnyObject)?;
                Ok(IntAttrName {
                    any_type_kind: AnyTypeKind::AnyObject,
                    qualifier: Some(IntAttrQualifier::RelatedAnyObject(obj)),
                    target,
                })
            }
            ("membership", 3..=4) => {
                // Groups have no memberships of their own.
                if provision_kind == AnyTypeKind::Group {
                    return Err(ParseError::IncompatibleKind {
                        reference: trimmed.to_string(),
                        kind: provision_kind,
                    });
                }
                let group = self.entity(segments[1], AnyTypeKind::Group)?;
                let target = self.parse_target(&segments[2..], provision_kind)?;
                Ok(IntAttrName {
                    any_type_kind: provision_kind,
                    qualifier: Some(IntAttrQualifier::MembershipOfGroup(group)),
                    target,
                })
            }
            ("privilege", 2) => {
                if provision_kind != AnyTypeKind::User {
                    return Err(ParseError::IncompatibleKind {
                        reference: trimmed.to_string(),
                        kind: provision_kind,
                    });
                }
                let application = self.name(segments[1], token)?;
                Ok(IntAttrName {
                    any_type_kind: AnyTypeKind::User,
                    qualifier: None,
                    target: IntAttrTarget::Privileges { application },
                })
            }
            ("relationship", 4..=5) => {
                if provision_kind == AnyTypeKind::Group {
                    return Err(ParseError::IncompatibleKind {
                        reference: trimmed.to_string(),
                        kind: provision_kind,
                    });
                }
                let rel_type = self.name(segments[1], token)?;
                let any_type = self.name(segments[2], token)?;
                let rt = self.graph.relationship_type(&rel_type).ok_or_else(|| {
                    ParseError::IncompatibleKind {
                        reference: rel_type.clone(),
                        kind: provision_kind,
                    }
                })?;
                if rt.left_any_type != any_type && rt.right_any_type != any_type {
                    return Err(ParseError::IncompatibleKind {
                        reference: any_type,
                        kind: provision_kind,
                    });
                }
                if self.graph.kind_of(&any_type) != Some(AnyTypeKind::AnyObject) {
                    return Err(ParseError::IncompatibleKind {
                        reference: any_type,
                        kind: AnyTypeKind::AnyObject,
                    });
                }
                let target = self.parse_target(&segments[3..], AnyTypeKind::AnyObject)?;
                Ok(IntAttrName {
                    any_type_kind: AnyTypeKind::AnyObject,
                    qualifier: Some(IntAttrQualifier::Relationship {
                        relationship_type: rel_type,
                        any_type,
                    }),
                    target,
                })
            }
            (_, 1 | 2) => {
                let target = self.parse_target(&segments, provision_kind)?;
                Ok(IntAttrName {
                    any_type_kind: provision_kind,
                    qualifier: None,
                    target,
                })
            }
            _ => {
                trace!(%token, "reference rejected - unrecognised shape");
                Err(ParseError::MalformedReference(token.to_string()))
            }
        }
    }

    /// Parse the unqualified tail of a reference: a bare field or schema
    /// name, or an explicit `plain::`/`derived::`/`virtual::` form.
    fn parse_target(
        &self,
        segments: &[&str],
        subject_kind: AnyTypeKind,
    ) -> Result<IntAttrTarget, ParseError> {
        match segments {
            [name] => {
                let keyword = name.to_lowercase();
                if matches!(
                    keyword.as_str(),
                    "group"
                        | "user"
                        | "anyobject"
                        | "membership"
                        | "privilege"
                        | "relationship"
                        | "plain"
                        | "derived"
                        | "virtual"
                ) {
                    // A keyword with no payload is a shape error, not an
                    // unknown schema.
                    return Err(ParseError::MalformedReference(name.to_string()));
                }
                let name = self.name(name, name)?;
                if let Some(field) = core_field(subject_kind, &name) {
                    return Ok(IntAttrTarget::Field(field.to_string()));
                }
                // Resolution order mirrors the original: plain first, then
                // derived, then virtual.
                for schema_type in [SchemaType::Plain, SchemaType::Derived, SchemaType::Virtual] {
                    if self.schema.lookup_typed(&name, schema_type).is_some() {
                        return Ok(IntAttrTarget::Schema { schema_type, name });
                    }
                }
                Err(ParseError::UnknownSchema(name))
            }
            [prefix, name] => {
                let schema_type = match prefix.to_lowercase().as_str() {
                    "plain" => SchemaType::Plain,
                    "derived" => SchemaType::Derived,
                    "virtual" => SchemaType::Virtual,
                    _ => return Err(ParseError::MalformedReference(segments.join("::"))),
                };
                let name = self.name(name, name)?;
                // An explicit prefix requires the schema to exist with that
                // exact kind.
                match self.schema.lookup_typed(&name, schema_type) {
                    Some(_) => Ok(IntAttrTarget::Schema { schema_type, name }),
                    None => Err(ParseError::UnknownSchema(name)),
                }
            }
            _ => Err(ParseError::MalformedReference(segments.join("::"))),
        }
    }

    fn name(&self, segment: &str, token: &str) -> Result<String, ParseError> {
        if NAME_RE.is_match(segment) {
            Ok(segment.to_string())
        } else {
            Err(ParseError::MalformedReference(token.to_string()))
        }
    }

    fn entity(&self, segment: &str, kind: AnyTypeKind) -> Result<String, ParseError> {
        let name = self.name(segment, segment)?;
        if self.graph.is_valid_kind(kind, &name) {
            Ok(name)
        } else {
            Err(ParseError::IncompatibleKind {
                reference: name,
                kind,
            })
        }
    }
}
