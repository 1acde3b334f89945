//! Address grammar: `/`-delimited path segments.
//!
//! Addresses are never stored on nodes. They are derived by walking the
//! tree from the root, so the tree can change without invalidating them.

use crate::error::ConfigError;

/// An ordered list of path segments from a root to a node.
pub type Path = Vec<String>;

/// The trailing segment appended to build a status address.
pub const STATUS_SEGMENT: &str = "status";

/// Join path segments into an address: `["a", "b"]` becomes `/a/b`.
///
/// # Examples
///
/// ```
/// use tether_core::path_to_address;
///
/// assert_eq!(path_to_address(&["mixer", "gain"]), "/mixer/gain");
/// ```
pub fn path_to_address<S: AsRef<str>>(path: &[S]) -> String {
    let mut address = String::from("/");
    for (i, segment) in path.iter().enumerate() {
        if i > 0 {
            address.push('/');
        }
        address.push_str(segment.as_ref());
    }
    address
}

/// Split an address into path segments, dropping the empty segment
/// produced by a leading `/`.
///
/// # Examples
///
/// ```
/// use tether_core::address_to_path;
///
/// assert_eq!(address_to_path("/mixer/gain"), vec!["mixer", "gain"]);
/// ```
pub fn address_to_path(address: &str) -> Path {
    let trimmed = address.strip_prefix('/').unwrap_or(address);
    trimmed.split('/').map(str::to_owned).collect()
}

/// Build the status address for an external address: `/a` becomes `/a/status`.
pub fn status_address(address: &str) -> String {
    let mut path = address_to_path(address);
    path.retain(|segment| !segment.is_empty());
    path.push(STATUS_SEGMENT.to_owned());
    path_to_address(&path)
}

/// Whether `address` starts with `/` and has no empty or whitespace-bearing segments.
///
/// The bare root `/` is valid.
pub fn is_valid_address(address: &str) -> bool {
    if address == "/" {
        return true;
    }
    address.starts_with('/')
        && address_to_path(address)
            .iter()
            .all(|segment| !segment.is_empty() && !segment.contains(char::is_whitespace))
}

/// Check an address literal, returning a [`ConfigError`] naming the problem.
pub fn validate_address(address: &str) -> Result<(), ConfigError> {
    let reason = if !address.starts_with('/') {
        "must begin with '/'"
    } else if !is_valid_address(address) {
        "segments must be non-empty and contain no whitespace"
    } else {
        return Ok(());
    };
    Err(ConfigError::InvalidAddress {
        address: address.to_owned(),
        reason: reason.to_owned(),
    })
}

/// Whether `address` equals `prefix` or is an immediate child of it.
///
/// Returns the child segment, or `None` for an exact match. The outer
/// `Option` is `None` when the address does not match at all.
pub fn match_prefix<'a>(prefix: &str, address: &'a str) -> Option<Option<&'a str>> {
    if address == prefix {
        return Some(None);
    }
    let base = prefix.strip_suffix('/').unwrap_or(prefix);
    let child = address.strip_prefix(base)?.strip_prefix('/')?;
    if child.is_empty() || child.contains('/') {
        return None;
    }
    Some(Some(child))
}
