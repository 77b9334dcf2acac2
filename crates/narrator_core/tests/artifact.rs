use narrator_core::{ArtifactError, ArtifactResolver};

#[test]
fn resolves_server_relative_reference_against_origin() {
    let resolver = ArtifactResolver::new("http://localhost:8000").unwrap();

    let locator = resolver.resolve("/audio/3f2a.wav").unwrap();

    assert_eq!(locator.url.as_str(), "http://localhost:8000/audio/3f2a.wav");
    assert_eq!(locator.file_name, "3f2a.wav");
}

#[test]
fn origin_path_is_ignored() {
    let resolver = ArtifactResolver::new("https://tts.example.com/api/").unwrap();

    let locator = resolver.resolve("/files/job-1.wav").unwrap();

    assert_eq!(locator.url.as_str(), "https://tts.example.com/files/job-1.wav");
}

#[test]
fn file_name_is_percent_decoded() {
    let resolver = ArtifactResolver::new("http://localhost:8000").unwrap();

    let locator = resolver.resolve("/audio/my book.wav").unwrap();

    assert_eq!(locator.url.as_str(), "http://localhost:8000/audio/my%20book.wav");
    assert_eq!(locator.file_name, "my book.wav");
}

#[test]
fn locator_never_leaves_the_service_origin() {
    let resolver = ArtifactResolver::new("https://tts.example.com:8443").unwrap();

    for reference in ["/\\evil.example.com/a.wav", "/audio/%2e%2e/%2e%2e/a.wav"] {
        assert!(resolver.resolve(reference).is_err(), "{reference:?}");
    }
    let locator = resolver.resolve("/audio/a.wav").unwrap();
    assert_eq!(locator.url.host_str(), Some("tts.example.com"));
    assert_eq!(locator.url.port(), Some(8443));
}

#[test]
fn resolution_is_deterministic() {
    let resolver = ArtifactResolver::new("http://localhost:8000").unwrap();
    assert_eq!(
        resolver.resolve("/audio/a.wav"),
        resolver.resolve("/audio/a.wav")
    );
}

#[test]
fn empty_reference_is_rejected() {
    let resolver = ArtifactResolver::new("http://localhost:8000").unwrap();
    assert_eq!(resolver.resolve("  "), Err(ArtifactError::Empty));
}

#[test]
fn malformed_references_are_rejected() {
    let resolver = ArtifactResolver::new("http://localhost:8000").unwrap();

    for reference in [
        "audio/a.wav",
        "//evil.example.com/a.wav",
        "http://evil.example.com/a.wav",
        "/audio/../secrets.wav",
        "/audio/",
        "/\\evil.example.com/a.wav",
        "/\t/evil.example.com/a.wav",
        "/audio/%2e%2e/secret.wav",
        "/audio/%2E./secret.wav",
        "/audio/a%2fb.wav",
    ] {
        assert!(
            matches!(
                resolver.resolve(reference),
                Err(ArtifactError::Malformed { .. })
            ),
            "expected {reference:?} to be malformed"
        );
    }
}

#[test]
fn non_http_origin_is_rejected() {
    assert!(matches!(
        ArtifactResolver::new("file:///tmp"),
        Err(ArtifactError::InvalidOrigin { .. })
    ));
    assert!(ArtifactResolver::new("not a url").is_err());
}
