//! Per-resource attribute mapping validation: [`resolve`] turns a
//! provision's mapping items into fully-resolved internal/external attribute
//! pairs, [`check`] cross-checks the mapping set as a whole.
//!
//! Both passes are pure functions over their inputs, and both are multi-error
//! collectors: every finding is returned in one pass so a configuration UI
//! can present all problems simultaneously rather than one per save attempt.
//! The at-most-one connector-object-link invariant is structural
//! (`Mapping::conn_object_link` is an `Option`).
//!
//! [`resolve`]: resolve/fn.resolve.html
//! [`check`]: consistency/fn.check.html

pub mod consistency;
pub mod resolve;
