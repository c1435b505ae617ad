use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// # Examples
/// ```
/// let id = matchday_common::id::prefixed_ulid(matchday_common::id::prefix::USER);
/// assert!(id.starts_with("usr_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Well-known ID prefixes.
pub mod prefix {
    pub const USER: &str = "usr";
    pub const MATCH: &str = "mat";
    pub const MESSAGE: &str = "msg";
    pub const NOTIFICATION: &str = "ntf";
    pub const CONNECTION: &str = "conn";
    pub const FRIENDSHIP: &str = "frn";
}
