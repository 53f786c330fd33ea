//! Tests for error types.

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("invalid debounce");
        assert_eq!(err.to_string(), "configuration error: invalid debounce");
    }

    #[test]
    fn test_watcher_error_conversion() {
        let watch_err = WatcherError::WatchFailed {
            path: "/tmp/photos".to_string(),
            reason: "permission denied".to_string(),
        };
        let err: Error = watch_err.into();
        assert!(matches!(err, Error::Watcher(_)));
        assert_eq!(
            err.to_string(),
            "watcher error: failed to watch path '/tmp/photos': permission denied"
        );
    }

    #[test]
    fn test_ocr_error_conversion() {
        let ocr_err = OcrError::EngineUnavailable("no language data".to_string());
        let err: Error = ocr_err.into();
        assert!(matches!(err, Error::Ocr(_)));
    }

    #[test]
    fn test_ocr_error_file_display() {
        let err = OcrError::file("/photos/scan.png", "corrupt image");
        assert_eq!(
            err.to_string(),
            "failed to recognize '/photos/scan.png': corrupt image"
        );
    }

    #[test]
    fn test_ocr_error_fatality() {
        assert!(OcrError::EngineUnavailable("x".to_string()).is_fatal());
        assert!(OcrError::Engine("x".to_string()).is_fatal());
        assert!(!OcrError::file("/a.png", "x").is_fatal());
    }

    #[test]
    fn test_settings_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Settings(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(Error::internal("test error"))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::Internal("something went wrong".to_string());
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("Internal"));
        assert!(debug_str.contains("something went wrong"));
    }
}
