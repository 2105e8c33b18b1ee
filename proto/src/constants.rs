//! Well-known names shared with connector implementations.

/// The connector object class conventionally holding user accounts.
pub const OBJECT_CLASS_ACCOUNT: &str = "__ACCOUNT__";

/// The connector object class conventionally holding groups.
pub const OBJECT_CLASS_GROUP: &str = "__GROUP__";

/// The connector attribute conventionally carrying the entry password.
pub const CONN_ATTR_PASSWORD: &str = "__PASSWORD__";

/// The connector attribute conventionally carrying the entry name/identifier.
pub const CONN_ATTR_NAME: &str = "__NAME__";
