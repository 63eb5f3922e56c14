use super::*;
use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::frame::ImageSource;
use crate::test_helpers::jpeg_bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn write_photo(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, jpeg_bytes(40, 30)).unwrap();
    path
}

#[tokio::test]
async fn test_file_capture_loads_photo() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_photo(tmp.path(), "board.jpg");
    let store = TempStore::new(tmp.path().join("app"));

    let capture = PhotoCapture::new(Arc::new(FileCapture::new(Some(source))), store.clone());
    let image = capture.take_photo().await.unwrap();

    assert_eq!(image.dimensions(), (40, 30));
    assert_eq!(
        image.source(),
        &ImageSource::Camera {
            path: tmp.path().join("app").join(CAPTURE_FILE_NAME)
        }
    );
    assert!(store.path().exists());
}

#[tokio::test]
async fn test_missing_source_is_unavailable() {
    let tmp = tempfile::tempdir().unwrap();
    let store = TempStore::new(tmp.path());

    let capture = PhotoCapture::new(Arc::new(FileCapture::new(None)), store.clone());
    assert!(matches!(
        capture.take_photo().await,
        Err(CaptureError::Unavailable { .. })
    ));

    let capture = PhotoCapture::new(
        Arc::new(FileCapture::new(Some(tmp.path().join("nope.jpg")))),
        store,
    );
    assert!(matches!(
        capture.take_photo().await,
        Err(CaptureError::Unavailable { .. })
    ));
}

#[tokio::test]
async fn test_corrupt_capture_is_decode_error() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("broken.jpg");
    std::fs::write(&source, b"definitely not a jpeg").unwrap();

    let capture = PhotoCapture::new(
        Arc::new(FileCapture::new(Some(source))),
        TempStore::new(tmp.path().join("app")),
    );

    assert!(matches!(
        capture.take_photo().await,
        Err(CaptureError::Decode(_))
    ));
}

#[tokio::test]
async fn test_prepare_clears_previous_capture() {
    let tmp = tempfile::tempdir().unwrap();
    let store = TempStore::new(tmp.path().join("nested").join("app"));

    let path = store.prepare().await.unwrap();
    std::fs::write(&path, b"old").unwrap();

    let again = store.prepare().await.unwrap();
    assert_eq!(path, again);
    assert!(!again.exists());
}

#[test]
fn test_command_placeholder_substitution() {
    let capture = CommandCapture::new("libcamera-still -n -o {output}");

    assert_eq!(
        capture.argv(Path::new("/data/app/tmp.jpg")),
        vec!["libcamera-still", "-n", "-o", "/data/app/tmp.jpg"]
    );
}

#[test]
fn test_argv_keeps_output_path_with_spaces_whole() {
    let capture = CommandCapture::new("raspistill  -o {output} -q 100");

    assert_eq!(
        capture.argv(Path::new("/home/me/my photos/tmp.jpg")),
        vec!["raspistill", "-o", "/home/me/my photos/tmp.jpg", "-q", "100"]
    );

    // Quotes are passed through literally
    let quoted = CommandCapture::new("cam \"-o\" {output}");
    assert_eq!(quoted.argv(Path::new("x.jpg"))[1], "\"-o\"");
}

#[test]
fn test_adapter_from_config_prefers_command() {
    let mut config = CaptureConfig {
        app_dir: "./app".to_string(),
        command: Some("fswebcam {output}".to_string()),
        source: Some("board.jpg".to_string()),
    };
    assert_eq!(adapter_from_config(&config).name(), "command");

    config.command = None;
    assert_eq!(adapter_from_config(&config).name(), "file");
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_capture_runs_program() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_photo(tmp.path(), "board.jpg");
    let command = format!("cp {} {{output}}", source.display());

    let capture = PhotoCapture::new(
        Arc::new(CommandCapture::new(command)),
        TempStore::new(tmp.path().join("app")),
    );
    let image = capture.take_photo().await.unwrap();

    assert_eq!(image.dimensions(), (40, 30));
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_failures() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join(CAPTURE_FILE_NAME);

    let failed = CommandCapture::new("false {output}").capture(&target).await;
    assert!(matches!(failed, Err(CaptureError::CommandFailed { .. })));

    let no_photo = CommandCapture::new("true {output}").capture(&target).await;
    assert!(matches!(no_photo, Err(CaptureError::Cancelled)));

    let missing = CommandCapture::new("gocapture-no-such-camera {output}")
        .capture(&target)
        .await;
    assert!(matches!(missing, Err(CaptureError::Unavailable { .. })));
}

#[tokio::test]
async fn test_storage_permission_granted() {
    let tmp = tempfile::tempdir().unwrap();
    let gate = StoragePermission::new(tmp.path().join("private"));

    gate.request().await.unwrap();
    assert!(tmp.path().join("private").is_dir());
}

#[tokio::test]
async fn test_storage_permission_denied_under_file() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();

    let gate = StoragePermission::new(blocker.join("private"));
    assert!(gate.request().await.is_err());
}
