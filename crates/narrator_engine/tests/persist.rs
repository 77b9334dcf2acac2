use std::fs;

use narrator_engine::{ensure_output_dir, AtomicFileWriter, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("book.wav", b"first").unwrap();
    let second = writer.write("book.wav", b"second").unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"second");
}

#[test]
fn nested_file_names_are_rejected() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let err = writer.write("../escape.wav", b"x").unwrap_err();

    assert!(matches!(err, PersistError::FileName(_)));
    assert!(err.to_string().starts_with("\"../escape.wav\" is not a plain file name"));
    assert!(!temp.path().parent().unwrap().join("escape.wav").exists());
}

#[test]
fn output_dir_error_names_the_directory() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("history.ron");
    fs::write(&file_path, "x").unwrap();

    let err = ensure_output_dir(&file_path).unwrap_err();

    assert!(matches!(err, PersistError::OutputDir { .. }));
    let text = err.to_string();
    assert!(text.starts_with("cannot save audio or history into"), "{text}");
    assert!(text.contains("history.ron") && text.ends_with("not a directory"), "{text}");
}

#[test]
fn partial_files_do_not_linger() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    writer.write("book.wav", b"audio").unwrap();

    let names: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("book.wav")]);
}

#[test]
fn no_partial_file_when_dir_is_a_file() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("book.wav", b"data").is_err());
    assert!(!file_path.with_file_name("book.wav").exists());
}
