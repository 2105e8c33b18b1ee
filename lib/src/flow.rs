//! Provision configuration flow: the state-transition function behind the
//! resource provision wizard. The UI layer owns rendering and event wiring;
//! this module owns what a field change does to the rest of the draft
//! configuration, so the behaviour is testable without any widget tree.

use crate::anytype::AnyType;
use crate::prelude::*;

/// The draft state of a provision being configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionFlowState {
    pub any_type: Option<String>,
    pub object_class: Option<String>,
    pub aux_classes: Vec<String>,
    pub mapping: Mapping,
    pub link_enabled: bool,
}

/// A single field edit from the configuration UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    /// The any-type selection changed. Carries the kind so the well-known
    /// object class default can be suggested.
    AnyType { name: String, kind: AnyTypeKind },
    ObjectClass(String),
    AuxClasses(Vec<String>),
    MappingItems(Vec<MappingItem>),
    ConnObjectLink(String),
    /// Toggling the link checkbox off discards the expression.
    LinkEnabled(bool),
}

/// Apply one field change to the draft. Dependent fields are reset when
/// their premise changes: picking a different any-type invalidates the
/// mapping and the auxiliary class selection, and re-suggests the
/// conventional object class for the kind.
pub fn on_field_change(
    mut state: ProvisionFlowState,
    change: FieldChange,
) -> ProvisionFlowState {
    match change {
        FieldChange::AnyType { name, kind } => {
            let changed = state.any_type.as_deref() != Some(name.as_str());
            state.any_type = Some(name);
            if changed {
                // Only users and groups have a conventional object class;
                // anything else is left for the administrator to pick.
                state.object_class = match kind {
                    AnyTypeKind::User => Some(OBJECT_CLASS_ACCOUNT.to_string()),
                    AnyTypeKind::Group => Some(OBJECT_CLASS_GROUP.to_string()),
                    AnyTypeKind::AnyObject => None,
                };
                state.aux_classes.clear();
                state.mapping = Mapping::default();
                state.link_enabled = false;
            }
        }
        FieldChange::ObjectClass(name) => {
            state.object_class = Some(name);
        }
        FieldChange::AuxClasses(classes) => {
            state.aux_classes = classes;
        }
        FieldChange::MappingItems(items) => {
            state.mapping.items = items;
        }
        FieldChange::ConnObjectLink(expr) => {
            if state.link_enabled {
                state.mapping.conn_object_link = Some(expr);
            }
        }
        FieldChange::LinkEnabled(enabled) => {
            state.link_enabled = enabled;
            if !enabled {
                state.mapping.conn_object_link = None;
            }
        }
    }
    state
}

/// The any-types still selectable for a new provision on a resource: every
/// known any-type minus those already provisioned.
pub fn selectable_any_types<'a>(
    all: impl Iterator<Item = &'a AnyType>,
    provisioned: &[Provision],
) -> Vec<String> {
    all.filter(|at| !provisioned.iter().any(|p| p.any_type == at.name))
        .map(|at| at.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProvisionFlowState {
        let state = on_field_change(
            ProvisionFlowState::default(),
            FieldChange::AnyType {
                name: "USER".to_string(),
                kind: AnyTypeKind::User,
            },
        );
        on_field_change(
            state,
            FieldChange::MappingItems(vec![MappingItem {
                int_attr_name: "username".to_string(),
                ext_attr_name: "uid".to_string(),
                purpose: MappingPurpose::ConnObjectKey,
                mandatory: true,
                multivalue: false,
            }]),
        )
    }

    #[test]
    fn test_any_type_change_resets_dependents() {
        let state = draft();
        assert_eq!(state.object_class.as_deref(), Some(OBJECT_CLASS_ACCOUNT));
        assert_eq!(state.mapping.items.len(), 1);

        let state = on_field_change(
            state,
            FieldChange::AnyType {
                name: "GROUP".to_string(),
                kind: AnyTypeKind::Group,
            },
        );
        assert_eq!(state.object_class.as_deref(), Some(OBJECT_CLASS_GROUP));
        assert!(state.mapping.items.is_empty());
        assert!(state.aux_classes.is_empty());
    }

    #[test]
    fn test_anyobject_gets_no_suggested_object_class() {
        let state = on_field_change(
            draft(),
            FieldChange::AnyType {
                name: "PRINTER".to_string(),
                kind: AnyTypeKind::AnyObject,
            },
        );
        assert_eq!(state.object_class, None);
        assert!(state.mapping.items.is_empty());
    }

    #[test]
    fn test_reselecting_same_any_type_keeps_mapping() {
        let state = draft();
        let state = on_field_change(
            state,
            FieldChange::AnyType {
                name: "USER".to_string(),
                kind: AnyTypeKind::User,
            },
        );
        assert_eq!(state.mapping.items.len(), 1);
    }

    #[test]
    fn test_link_toggle_discards_expression() {
        let state = on_field_change(draft(), FieldChange::LinkEnabled(true));
        let state = on_field_change(
            state,
            FieldChange::ConnObjectLink("'uid=' + username".to_string()),
        );
        assert!(state.mapping.conn_object_link.is_some());

        let state = on_field_change(state, FieldChange::LinkEnabled(false));
        assert_eq!(state.mapping.conn_object_link, None);

        // The expression is ignored while the toggle is off.
        let state = on_field_change(
            state,
            FieldChange::ConnObjectLink("'uid=' + username".to_string()),
        );
        assert_eq!(state.mapping.conn_object_link, None);
    }

    #[test]
    fn test_selectable_any_types_excludes_provisioned() {
        let all = vec![
            AnyType {
                name: "USER".to_string(),
                kind: AnyTypeKind::User,
                classes: Vec::new(),
            },
            AnyType {
                name: "GROUP".to_string(),
                kind: AnyTypeKind::Group,
                classes: Vec::new(),
            },
            AnyType {
                name: "PRINTER".to_string(),
                kind: AnyTypeKind::AnyObject,
                classes: Vec::new(),
            },
        ];
        let provisioned = vec![Provision {
            any_type: "USER".to_string(),
            object_class: OBJECT_CLASS_ACCOUNT.to_string(),
            mapping: Mapping::default(),
        }];
        let selectable = selectable_any_types(all.iter(), &provisioned);
        assert_eq!(selectable, vec!["GROUP".to_string(), "PRINTER".to_string()]);
    }
}
