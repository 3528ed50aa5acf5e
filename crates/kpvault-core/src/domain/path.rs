//! Path codec
//!
//! Maps a group hierarchy plus an entry name onto a flat secret-store key.
//! Escaping is deterministic and never changes case, so the same literal
//! path always produces byte-identical keys across runs.

/// Separator used by the secret store between namespace segments
pub const SEPARATOR: char = '/';

/// Replaces store-unsafe characters in a single path segment
///
/// `/` becomes `-` and a space becomes `_`. A segment that would come out
/// empty becomes `_`, and the dot segments `.` and `..` get a leading `_`
/// so no key can address its parent namespace.
pub fn escape_segment(segment: &str) -> String {
    let escaped = segment.replace(SEPARATOR, "-").replace(' ', "_");
    match escaped.as_str() {
        "" => "_".to_string(),
        "." | ".." => format!("_{escaped}"),
        _ => escaped,
    }
}

/// Builds the store key for an entry at `location` named `name`
///
/// Every location segment and the name are escaped, then joined with
/// [`SEPARATOR`]. An empty location yields just the escaped name.
pub fn build_key<S: AsRef<str>>(location: &[S], name: &str) -> String {
    let prefix = location
        .iter()
        .map(|segment| escape_segment(segment.as_ref()))
        .collect::<Vec<_>>()
        .join("/");

    if prefix.is_empty() {
        escape_segment(name)
    } else {
        format!("{prefix}/{}", escape_segment(name))
    }
}

/// The literal, unescaped path of an entry (`Group/Sub/Name`)
pub fn unescaped_path<S: AsRef<str>>(location: &[S], name: &str) -> String {
    if location.is_empty() {
        return name.to_string();
    }
    format!("{}/{}", joined_location(location), name)
}

/// Joins the unescaped location segments with [`SEPARATOR`]
pub fn joined_location<S: AsRef<str>>(location: &[S]) -> String {
    location
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("/")
}

/// Case-insensitive equality of two unescaped locations
pub fn locations_equal<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> bool {
    joined_location(a).to_lowercase() == joined_location(b).to_lowercase()
}

/// Comparison form of a store key
///
/// Keys that differ only by letter case fold to the same value and are
/// treated as the same reconciliation target.
pub fn fold_key(key: &str) -> String {
    key.to_lowercase()
}

/// Removes the `<mount>/` prefix from a listed store path
///
/// Paths outside the mount are returned unchanged.
pub fn strip_mount<'a>(path: &'a str, mount: &str) -> &'a str {
    let mount = mount.trim_end_matches(SEPARATOR);
    path.strip_prefix(mount)
        .and_then(|rest| rest.strip_prefix(SEPARATOR))
        .unwrap_or(path)
}
