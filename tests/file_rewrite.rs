//! In-place rewrite of tags in real files

use std::io::Write;
use tailtag::{TagError, TagFile, TagFileBuilder, TagKind, TagOptions, TagStore};
use tempfile::{tempdir, NamedTempFile};

const AUDIO_LEN: usize = 4096;

fn audio() -> Vec<u8> {
    (0..AUDIO_LEN).map(|i| (i * 7 % 256) as u8).collect()
}

fn file_with(bytes: &[u8]) -> NamedTempFile {
    let mut temp = NamedTempFile::new().unwrap();
    temp.write_all(bytes).unwrap();
    temp.flush().unwrap();
    temp
}

fn open_editable(temp: &NamedTempFile) -> TagFile {
    TagFileBuilder::new()
        .path(temp.path())
        .edit_tags()
        .open()
        .unwrap()
}

fn id3_trailer(title: &str) -> Vec<u8> {
    let mut trailer = vec![0u8; 128];
    trailer[..3].copy_from_slice(b"TAG");
    trailer[3..3 + title.len()].copy_from_slice(title.as_bytes());
    trailer
}

#[test]
fn test_tag_untagged_file() {
    let temp = file_with(&audio());

    let mut file = open_editable(&temp);
    file.set("Title", b"Fresh").unwrap();
    file.save().unwrap();

    let bytes = std::fs::read(temp.path()).unwrap();
    assert_eq!(&bytes[..AUDIO_LEN], &audio()[..]);
    assert_eq!(&bytes[AUDIO_LEN..AUDIO_LEN + 8], b"APETAGEX");
    assert_eq!(&bytes[bytes.len() - 32..bytes.len() - 24], b"APETAGEX");

    let reopened = TagFile::open(temp.path()).unwrap();
    assert_eq!(reopened.get("title"), Some(b"Fresh".to_vec()));
}

#[test]
fn test_shrinking_tag_keeps_file_length() {
    let temp = file_with(&audio());
    let mut file = open_editable(&temp);
    file.set("Comment", &[b'c'; 400]).unwrap();
    file.set("Title", b"Long").unwrap();
    file.save().unwrap();
    let grown = std::fs::metadata(temp.path()).unwrap().len();
    drop(file);

    let mut file = open_editable(&temp);
    assert!(file.remove("Comment"));
    file.save().unwrap();
    drop(file);

    let bytes = std::fs::read(temp.path()).unwrap();
    assert_eq!(bytes.len() as u64, grown);
    assert_eq!(&bytes[..AUDIO_LEN], &audio()[..]);
    // Region vacated by the comment is zero-filled
    assert!(bytes[AUDIO_LEN..AUDIO_LEN + 400].iter().all(|&b| b == 0));

    let reopened = TagFile::open(temp.path()).unwrap();
    assert_eq!(
        reopened.items(),
        vec![("Title".to_string(), b"Long".to_vec())]
    );
}

#[test]
fn test_growing_tag_extends_file() {
    let temp = file_with(&audio());
    let mut file = open_editable(&temp);
    file.set("Title", b"Short").unwrap();
    file.save().unwrap();
    let before = std::fs::metadata(temp.path()).unwrap().len();

    file.set("Lyrics", &[b'l'; 1000]).unwrap();
    file.save().unwrap();
    let after = std::fs::metadata(temp.path()).unwrap().len();
    assert_eq!(after, before + 1000 + 6 + 9);

    // Saving again without edits rewrites the same region
    file.save().unwrap();
    assert_eq!(std::fs::metadata(temp.path()).unwrap().len(), after);
    drop(file);

    let reopened = TagFile::open(temp.path()).unwrap();
    assert_eq!(reopened.item_count(), 2);
    assert_eq!(reopened.get("LYRICS").map(|v| v.len()), Some(1000));
}

#[test]
fn test_legacy_trailer_is_overwritten() {
    let mut bytes = audio();
    bytes.extend_from_slice(&id3_trailer("Legacy Title"));
    let temp = file_with(&bytes);

    let mut file = open_editable(&temp);
    assert_eq!(file.kind(), Some(TagKind::Fixed));
    assert_eq!(file.get("Title"), Some(b"Legacy Title".to_vec()));

    file.set("Title", b"New Title").unwrap();
    file.save().unwrap();
    drop(file);

    let reopened = TagFile::open(temp.path()).unwrap();
    assert_eq!(reopened.kind(), Some(TagKind::Extensible));
    assert_eq!(reopened.get("title"), Some(b"New Title".to_vec()));

    // The new tag is smaller than the trailer; the rest is zero-filled
    let bytes = std::fs::read(temp.path()).unwrap();
    assert_eq!(bytes.len(), AUDIO_LEN + 128);
    assert_eq!(&bytes[..AUDIO_LEN], &audio()[..]);
    assert!(bytes[AUDIO_LEN..AUDIO_LEN + 41].iter().all(|&b| b == 0));
    assert_eq!(&bytes[AUDIO_LEN + 41..AUDIO_LEN + 49], b"APETAGEX");
}

#[test]
fn test_ape_in_front_of_legacy_trailer() {
    let mut store = TagStore::default();
    store.append("Title", b"Stacked").unwrap();

    let mut bytes = audio();
    store.write_to_sink(&mut bytes).unwrap();
    bytes.extend_from_slice(&id3_trailer("Trailer"));
    let total = bytes.len() as u64;
    let temp = file_with(&bytes);

    let mut file = open_editable(&temp);
    assert_eq!(file.store().anchor(), -((total as i64) - AUDIO_LEN as i64));
    file.set("Title", b"S").unwrap();
    file.save().unwrap();
    drop(file);

    // The stacked region is reused; the ID3 trailer is gone
    assert_eq!(std::fs::metadata(temp.path()).unwrap().len(), total);
    let reopened = TagFile::open(temp.path()).unwrap();
    assert_eq!(reopened.kind(), Some(TagKind::Extensible));
    assert_eq!(reopened.get("Title"), Some(b"S".to_vec()));
}

#[test]
fn test_removing_every_item_erases_tag() {
    let temp = file_with(&audio());
    let mut file = open_editable(&temp);
    file.set("Title", b"Temporary").unwrap();
    file.save().unwrap();
    drop(file);

    let mut file = open_editable(&temp);
    assert!(file.remove("title"));
    file.save().unwrap();
    drop(file);

    let reopened = TagFile::open(temp.path()).unwrap();
    assert_eq!(reopened.kind(), None);

    let bytes = std::fs::read(temp.path()).unwrap();
    assert!(bytes[AUDIO_LEN..].iter().all(|&b| b == 0));
}

#[test]
fn test_read_only_open_refuses_save() {
    let temp = file_with(&audio());
    let mut file = TagFile::open(temp.path()).unwrap();
    file.set("Title", b"Nope").unwrap();

    assert!(matches!(file.save(), Err(TagError::EditNotPermitted)));
    assert_eq!(std::fs::metadata(temp.path()).unwrap().len(), AUDIO_LEN as u64);
}

#[test]
fn test_options_from_toml_file() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("tags.toml");
    std::fs::write(&config, "edit_tags = true\nmax_tag_length = 4096\n").unwrap();
    let options = TagOptions::load(&config).unwrap();

    let temp = file_with(&audio());
    let mut file = TagFileBuilder::new()
        .path(temp.path())
        .options(options)
        .open()
        .unwrap();

    assert!(matches!(
        file.set("Blob", &[0u8; 5000]),
        Err(TagError::TagTooLarge { limit: 4096, .. })
    ));
    file.set("Title", b"Fits").unwrap();
    file.save().unwrap();
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let result = TagFile::open(dir.path().join("absent.ape"));
    assert!(matches!(result, Err(TagError::Io(_))));
}
