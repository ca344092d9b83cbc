//! Extension and target-format normalisation.
//!
//! Routing only ever looks at strings: the source extension comes from the
//! declared upload filename and is lower-cased, the target format comes from
//! the request and is upper-cased.

/// Strip any directory components a client may have sent with the filename.
fn base_name(filename: &str) -> &str {
    filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename)
}

/// Source extension of an uploaded file: the text after the last dot,
/// lower-cased. A name without a dot yields the whole name.
pub fn source_extension(filename: &str) -> String {
    base_name(filename)
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Normalise a requested target format (`"xlsx"` → `"XLSX"`).
pub fn normalize_target(target: &str) -> String {
    target.trim().to_ascii_uppercase()
}

/// File extension written for a target format (`"JPG"` → `"jpg"`).
pub fn target_extension(target: &str) -> String {
    target.trim().to_ascii_lowercase()
}

/// Stem of the uploaded filename: everything before the first dot.
pub fn original_stem(filename: &str) -> &str {
    let name = base_name(filename);
    name.split('.').next().unwrap_or(name)
}

/// Download name for a converted file: `converted_<stem>.<target-lower>`.
pub fn download_name(filename: &str, target: &str) -> String {
    format!(
        "converted_{}.{}",
        original_stem(filename),
        target_extension(target)
    )
}
