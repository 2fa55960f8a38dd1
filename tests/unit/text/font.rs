use super::*;

#[test]
fn empty_book_resolves_nothing() {
    let book = FontBook::empty();
    assert!(book.resolve("Arial, sans-serif").is_none());
    assert!(book.resolve("").is_none());
}

#[test]
fn explicit_file_wins_for_every_family() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("face.ttf");
    std::fs::write(&path, b"not-really-a-font").unwrap();

    let book = FontBook::from_file(&path).unwrap();
    let a = book.resolve("Georgia, serif").unwrap();
    let b = book.resolve("Impact").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.as_slice(), b"not-really-a-font");
}

#[test]
fn missing_font_file_is_an_error() {
    let err = FontBook::from_file(Path::new("/definitely/not/here.ttf")).unwrap_err();
    assert!(err.to_string().contains("failed to read font file"));
}
