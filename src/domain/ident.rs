//! Allow-list for SQL identifiers that cannot be bound as parameters.

/// True when `ident` is one or more ASCII letters, digits or underscores.
///
/// Table and column names are interpolated into statement text, so anything
/// outside this set is refused outright (no trimming, no case folding).
pub fn is_valid_identifier(ident: &str) -> bool {
    !ident.is_empty() && ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Returns `candidate` when it is a valid identifier, otherwise `default`.
pub fn resolve_table_name<'a>(candidate: Option<&'a str>, default: &'a str) -> &'a str {
    match candidate {
        Some(name) if is_valid_identifier(name) => name,
        Some(name) => {
            tracing::warn!(rejected = %name, fallback = %default, "table name failed identifier check");
            default
        }
        None => default,
    }
}
