use std::fs;

use tempfile::TempDir;

use ragline::document::{load_text_files, scan_directory, split_documents, CHUNK_INDEX_KEY};

#[test]
fn missing_file_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("a.txt");
    let missing = tmp.path().join("missing.txt");
    let c = tmp.path().join("c.md");
    fs::write(&a, "alpha").unwrap();
    fs::write(&c, "gamma").unwrap();

    let docs = load_text_files(&[&a, &missing, &c]);

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].source(), Some(a.to_str().unwrap()));
    assert_eq!(docs[0].content(), "alpha");
    assert_eq!(docs[1].source(), Some(c.to_str().unwrap()));
}

#[test]
fn invalid_utf8_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let bad = tmp.path().join("bad.txt");
    let good = tmp.path().join("good.txt");
    fs::write(&bad, [0xff, 0xfe, 0x00]).unwrap();
    fs::write(&good, "fine").unwrap();

    let docs = load_text_files(&[bad, good]);
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].content(), "fine");
}

#[test]
fn scanned_files_load_and_split() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("notes")).unwrap();
    fs::write(tmp.path().join("notes/long.md"), "word ".repeat(300)).unwrap();
    fs::write(tmp.path().join("skip.rs"), "fn main() {}").unwrap();

    let paths = scan_directory(
        tmp.path(),
        &["**/*.md".to_string(), "**/*.txt".to_string()],
        &[],
    )
    .unwrap();
    assert_eq!(paths.len(), 1);

    let docs = load_text_files(&paths);
    let chunks = split_documents(&docs, 200, 50);

    assert!(chunks.len() > 1);
    for (i, chunk) in chunks.iter().enumerate() {
        assert!(chunk.content().chars().count() <= 200);
        assert_eq!(chunk.source(), docs[0].source());
        assert_eq!(
            chunk.metadata().get(CHUNK_INDEX_KEY).map(String::as_str),
            Some(i.to_string().as_str())
        );
    }
}
