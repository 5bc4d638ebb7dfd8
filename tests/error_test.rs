//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use std::path::Path;
use style_finder::error::StyleFinderError;
use style_finder::scanner;
use tempfile::tempdir;

/// 存在しないフォルダをスキャンした場合
#[test]
fn test_scan_nonexistent_folder() {
    let result = scanner::scan_folder(Path::new("/nonexistent/path/12345"), false);
    assert!(matches!(result, Err(StyleFinderError::FolderNotFound(_))));
}

/// 画像のないフォルダをスキャンした場合
#[test]
fn test_scan_folder_no_images() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("test.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("catalog.json"), "[]").unwrap();

    let result = scanner::scan_folder(dir.path(), true).unwrap();
    assert!(result.is_empty());
}

/// StyleFinderErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        StyleFinderError::Config("テスト設定エラー".to_string()),
        StyleFinderError::ImageDecode("unsupported format".to_string()),
        StyleFinderError::ImageEncode("jpeg".to_string()),
        StyleFinderError::ModelNotFound("resnet50.onnx".to_string()),
        StyleFinderError::Inference("shape".to_string()),
        StyleFinderError::FolderNotFound("/path/to/folder".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty());
        assert!(!err.is_retrieval());
    }
}

#[test]
fn test_file_open_error() {
    let err = StyleFinderError::FileOpen {
        path: "photo.jpg".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
    };

    let display = format!("{}", err);
    assert!(display.contains("photo.jpg"));
    assert!(err.is_retrieval());
}

#[test]
fn test_catalog_error_conversion() {
    let err: StyleFinderError = style_finder_common::Error::NoCandidates.into();
    assert!(matches!(err, StyleFinderError::Catalog(_)));
    assert!(format!("{}", err).contains("カタログエラー"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
    let err: StyleFinderError = io_error.into();
    assert!(matches!(err, StyleFinderError::Io(_)));
}
