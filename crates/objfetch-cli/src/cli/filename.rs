//! Output filename derivation from the object URI.

/// Default filename when the URI path yields nothing usable.
const DEFAULT_FILENAME: &str = "object.bin";

/// Derives an output filename from the last path segment of `uri`,
/// falling back to a generic name for root or dot-only paths.
pub fn filename_from_uri(uri: &str) -> String {
    let segment = url::Url::parse(uri).ok().and_then(|parsed| {
        parsed
            .path()
            .split('/')
            .filter(|s| !s.is_empty())
            .last()
            .map(str::to_string)
    });
    match segment {
        Some(s) if s != "." && s != ".." => s,
        _ => DEFAULT_FILENAME.to_string(),
    }
}
