//! Folder paths and the navigation routes that address them.

use anyhow::{Context, anyhow};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::Result;
use crate::fs::validate_name;

/// Prefix of every browser route; the encoded folder follows it.
pub const ROUTE_PREFIX: &str = "/home";

/// Characters escaped the way `encodeURIComponent` does.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Append `name` to a relative folder path.
pub fn join_folder(folder: &str, name: &str) -> String {
    if folder.is_empty() { name.to_string() } else { format!("{folder}/{name}") }
}

/// Route for opening `folder`. The whole folder path is encoded as a single segment.
pub fn route_for(folder: &str) -> String {
    if folder.is_empty() {
        return ROUTE_PREFIX.to_string();
    }
    format!("{ROUTE_PREFIX}/{}", utf8_percent_encode(folder, COMPONENT))
}

/// Inverse of [`route_for`].
///
/// The decoded folder must stay below the data directory: `.` and `..` segments are rejected.
pub fn folder_from_route(route: &str) -> Result<String> {
    let rest = route
        .strip_prefix(ROUTE_PREFIX)
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
        .ok_or_else(|| anyhow!("route {route:?} is not a browser route"))?;
    let encoded = rest.trim_start_matches('/');
    let folder = percent_decode_str(encoded)
        .decode_utf8()
        .with_context(|| format!("decoding folder from route {route:?}"))?;
    let folder = folder.trim_matches('/');
    for segment in folder.split('/').filter(|segment| !segment.is_empty()) {
        validate_name(segment)
            .with_context(|| format!("route {route:?} leaves the data directory"))?;
    }
    Ok(folder.to_string())
}
