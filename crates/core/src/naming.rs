//! Canonical file naming for a job's namespace.
//!
//! Uploaded images are renamed on ingest so downstream tooling sees a
//! stable, ordered sequence regardless of what the client called them.

/// Stem prefix for canonical input names.
pub const INPUT_PREFIX: &str = "item";

/// Extension used when the upload carries no usable one.
pub const DEFAULT_INPUT_EXTENSION: &str = "jpg";

/// Longest extension kept from an uploaded file name.
const MAX_EXTENSION_LEN: usize = 8;

/// Canonical name for the input at zero-based `index`.
///
/// Convention: `item_{NNN}.{ext}` with a 1-based, zero-padded sequence
/// number. `ext` is the lowercased extension of `original_name` when it is
/// short and alphanumeric, otherwise [`DEFAULT_INPUT_EXTENSION`].
///
/// # Examples
///
/// ```
/// use carscan_core::naming::input_file_name;
///
/// assert_eq!(input_file_name(0, Some("IMG_2041.JPG")), "item_001.jpg");
/// assert_eq!(input_file_name(1, Some("side.png")), "item_002.png");
/// assert_eq!(input_file_name(2, None), "item_003.jpg");
/// assert_eq!(input_file_name(9, Some("../evil.sh/x")), "item_010.jpg");
/// ```
pub fn input_file_name(index: usize, original_name: Option<&str>) -> String {
    let ext = original_name
        .and_then(sanitized_extension)
        .unwrap_or_else(|| DEFAULT_INPUT_EXTENSION.to_string());
    format!("{}.{ext}", input_stem(index))
}

/// Canonical stem (no extension) for the input at zero-based `index`.
pub fn input_stem(index: usize) -> String {
    format!("{INPUT_PREFIX}_{:03}", index + 1)
}

fn sanitized_extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_are_one_based_and_padded() {
        assert_eq!(input_stem(0), "item_001");
        assert_eq!(input_stem(41), "item_042");
        assert_eq!(input_stem(998), "item_999");
    }

    #[test]
    fn wide_sequence_numbers_grow_past_three_digits() {
        assert_eq!(input_stem(1234), "item_1235");
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(input_file_name(0, Some("front.JPEG")), "item_001.jpeg");
    }

    #[test]
    fn missing_or_odd_extensions_fall_back_to_default() {
        assert_eq!(input_file_name(0, Some("noext")), "item_001.jpg");
        assert_eq!(input_file_name(0, Some("trailing.")), "item_001.jpg");
        assert_eq!(input_file_name(0, Some("weird.j p g")), "item_001.jpg");
        assert_eq!(input_file_name(0, Some("long.abcdefghij")), "item_001.jpg");
    }
}
