//! File name sanitizing.

/// Characters that are illegal in file names on common filesystems.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Remove filesystem-illegal characters from a file name.
///
/// Returns `(changed, clean_name)`; `changed` is true only if at least one
/// character was removed.
pub fn sanitize(name: &str) -> (bool, String) {
    let clean: String = name.chars().filter(|c| !ILLEGAL_CHARS.contains(c)).collect();
    (clean.len() != name.len(), clean)
}
