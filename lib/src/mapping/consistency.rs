//! Cross-item consistency rules for a provision's mapping set. Stateless;
//! run on demand before a mapping update is persisted, and again by the UI
//! on every save attempt. Each rule is evaluated independently and every
//! violation is reported.

use itertools::Itertools;
use regex::Regex;

use crate::intattr::core_fields;
use crate::prelude::*;

lazy_static! {
    // Quoted literals inside a connector object link expression carry no
    // attribute references.
    static ref QUOTED_RE: Regex = Regex::new(r#"'[^']*'|"[^"]*""#).expect("Invalid quote regex");
    static ref LINK_TOKEN_RE: Regex =
        Regex::new(r"[A-Za-z_][A-Za-z0-9_\-]*(::[A-Za-z0-9_\-]+)*").expect("Invalid token regex");
}

/// Cross-check a provision's mapping set:
///
/// - no two items may target the same connector attribute;
/// - exactly one password-purpose item on a user provision that requires
///   password propagation, and never more than one anywhere;
/// - a connector object link may only reference mapped internal attributes
///   or core fields of the provision's kind;
/// - every mandatory connector attribute must be mapped.
pub fn check(
    any_type_kind: AnyTypeKind,
    mapping: &Mapping,
    object_class: &ConnObjectClass,
    password_required: bool,
) -> Vec<ConsistencyError> {
    let mut res = Vec::new();

    // Duplicate connector targets, every colliding internal reference named.
    mapping
        .items
        .iter()
        .map(|item| (item.ext_attr_name.as_str(), item.int_attr_name.as_str()))
        .into_group_map()
        .into_iter()
        .filter(|(_, ints)| ints.len() > 1)
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .for_each(|(ext, ints)| {
            res.push(ConsistencyError::DuplicateTarget {
                ext_attr_name: ext.to_string(),
                int_attr_names: ints.into_iter().map(str::to_string).collect(),
            })
        });

    // Password cardinality. At most one everywhere; exactly one when the
    // resource propagates passwords for users.
    let password_items: Vec<&str> = mapping
        .items
        .iter()
        .filter(|item| item.purpose == MappingPurpose::Password)
        .map(|item| item.int_attr_name.as_str())
        .collect();
    if password_items.len() > 1 {
        res.push(ConsistencyError::MultiplePasswordMappings {
            int_attr_names: password_items.iter().map(|s| s.to_string()).collect(),
        });
    } else if password_items.is_empty()
        && any_type_kind == AnyTypeKind::User
        && password_required
    {
        res.push(ConsistencyError::MissingPasswordMapping);
    }

    // Connector object link references.
    if let Some(link) = &mapping.conn_object_link {
        let stripped = QUOTED_RE.replace_all(link, " ");
        for token in LINK_TOKEN_RE.find_iter(&stripped) {
            let token = token.as_str();
            let mapped = mapping
                .items
                .iter()
                .any(|item| item.int_attr_name.trim() == token);
            let field = core_fields(any_type_kind).contains(&token);
            if !mapped && !field {
                res.push(ConsistencyError::DanglingLinkReference {
                    token: token.to_string(),
                });
            }
        }
    }

    // Mandatory connector attributes must all be mapped.
    object_class
        .mandatory_attrs()
        .filter(|attr| {
            !mapping
                .items
                .iter()
                .any(|item| item.ext_attr_name == attr.name)
        })
        .for_each(|attr| {
            res.push(ConsistencyError::UnmappedMandatoryAttribute {
                ext_attr_name: attr.name.clone(),
            })
        });

    if !res.is_empty() {
        debug!(findings = res.len(), "mapping consistency check failed");
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(int: &str, ext: &str, purpose: MappingPurpose) -> MappingItem {
        MappingItem {
            int_attr_name: int.to_string(),
            ext_attr_name: ext.to_string(),
            purpose,
            mandatory: false,
            multivalue: false,
        }
    }

    fn object_class() -> ConnObjectClass {
        ConnObjectClass {
            name: OBJECT_CLASS_ACCOUNT.to_string(),
            attributes: vec![
                ConnAttr {
                    name: "uid".to_string(),
                    attr_type: ConnAttrType::String,
                    mandatory: true,
                    multivalue: false,
                },
                ConnAttr {
                    name: "cn".to_string(),
                    attr_type: ConnAttrType::String,
                    mandatory: true,
                    multivalue: false,
                },
                ConnAttr {
                    name: "mail".to_string(),
                    attr_type: ConnAttrType::String,
                    mandatory: false,
                    multivalue: true,
                },
            ],
        }
    }

    fn base_mapping() -> Mapping {
        Mapping {
            items: vec![
                item("username", "uid", MappingPurpose::ConnObjectKey),
                item("plain::fullname", "cn", MappingPurpose::Other),
            ],
            conn_object_link: None,
        }
    }

    #[test]
    fn test_check_clean_mapping() {
        let res = check(AnyTypeKind::User, &base_mapping(), &object_class(), false);
        assert!(res.is_empty());
    }

    #[test]
    fn test_check_duplicate_target() {
        let mut mapping = base_mapping();
        mapping
            .items
            .push(item("plain::email", "uid", MappingPurpose::Other));
        let res = check(AnyTypeKind::User, &mapping, &object_class(), false);
        // Both colliding item identities are named.
        assert_eq!(
            res,
            vec![ConsistencyError::DuplicateTarget {
                ext_attr_name: "uid".to_string(),
                int_attr_names: vec!["username".to_string(), "plain::email".to_string()],
            }]
        );
    }

    #[test]
    fn test_check_password_cardinality() {
        let mapping = base_mapping();
        // Required but absent.
        let res = check(AnyTypeKind::User, &mapping, &object_class(), true);
        assert_eq!(res, vec![ConsistencyError::MissingPasswordMapping]);
        // Not required for groups even when absent.
        let res = check(AnyTypeKind::Group, &mapping, &object_class(), true);
        assert!(res.is_empty());
        // Not required when the resource does not propagate passwords.
        let res = check(AnyTypeKind::User, &mapping, &object_class(), false);
        assert!(res.is_empty());

        // Exactly one clears the finding.
        let mut mapping = base_mapping();
        mapping
            .items
            .push(item("password", CONN_ATTR_PASSWORD, MappingPurpose::Password));
        let mut oc = object_class();
        oc.attributes.push(ConnAttr {
            name: CONN_ATTR_PASSWORD.to_string(),
            attr_type: ConnAttrType::String,
            mandatory: false,
            multivalue: false,
        });
        assert!(check(AnyTypeKind::User, &mapping, &oc, true).is_empty());

        // A second one is always a violation, required or not.
        mapping
            .items
            .push(item("plain::pin", "mail", MappingPurpose::Password));
        let res = check(AnyTypeKind::User, &mapping, &oc, false);
        assert_eq!(
            res,
            vec![ConsistencyError::MultiplePasswordMappings {
                int_attr_names: vec!["password".to_string(), "plain::pin".to_string()],
            }]
        );
    }

    #[test]
    fn test_check_conn_object_link_references() {
        let mut mapping = base_mapping();
        mapping.conn_object_link =
            Some("'uid=' + username + ',ou=people,dc=example'".to_string());
        assert!(check(AnyTypeKind::User, &mapping, &object_class(), false).is_empty());

        // Core fields are always referencable, mapped or not.
        mapping.conn_object_link = Some("'cn=' + key".to_string());
        assert!(check(AnyTypeKind::User, &mapping, &object_class(), false).is_empty());

        // Unmapped non-field references dangle.
        mapping.conn_object_link = Some("'uid=' + plain::email + ',ou=people'".to_string());
        let res = check(AnyTypeKind::User, &mapping, &object_class(), false);
        assert_eq!(
            res,
            vec![ConsistencyError::DanglingLinkReference {
                token: "plain::email".to_string(),
            }]
        );
    }

    #[test]
    fn test_check_unmapped_mandatory() {
        let mapping = Mapping {
            items: vec![item("username", "uid", MappingPurpose::ConnObjectKey)],
            conn_object_link: None,
        };
        let res = check(AnyTypeKind::User, &mapping, &object_class(), false);
        assert_eq!(
            res,
            vec![ConsistencyError::UnmappedMandatoryAttribute {
                ext_attr_name: "cn".to_string(),
            }]
        );
    }

    #[test]
    fn test_check_reports_all_violations_at_once() {
        let mapping = Mapping {
            items: vec![
                item("username", "uid", MappingPurpose::ConnObjectKey),
                item("plain::email", "uid", MappingPurpose::Other),
            ],
            conn_object_link: Some("'x=' + nosuch".to_string()),
        };
        let res = check(AnyTypeKind::User, &mapping, &object_class(), true);
        assert_eq!(res.len(), 4);
        assert!(res
            .iter()
            .any(|e| matches!(e, ConsistencyError::DuplicateTarget { .. })));
        assert!(res.contains(&ConsistencyError::MissingPasswordMapping));
        assert!(res
            .iter()
            .any(|e| matches!(e, ConsistencyError::DanglingLinkReference { .. })));
        assert!(res
            .iter()
            .any(|e| matches!(e, ConsistencyError::UnmappedMandatoryAttribute { .. })));
    }
}
