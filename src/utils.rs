use chrono::Utc;

/// Fixed top-level directory inside the archive holding the package
/// document and all content files
pub(crate) const CONTENT_ROOT: &str = "EPUB";

/// Returns the current UTC time in the `YYYY-MM-DDThh:mm:ssZ` form required
/// by the `dcterms:modified` package property
pub(crate) fn modified_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use crate::utils::modified_timestamp;

    #[test]
    fn test_modified_timestamp_shape() {
        let stamp = modified_timestamp();

        // e.g. 2024-06-01T12:30:05Z
        assert_eq!(stamp.len(), 20);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], "T");
        assert!(stamp.ends_with('Z'));
    }
}
