//! End-to-end tag round trips
//!
//! Builds tags through the public store API, writes them behind some fake
//! audio and loads them back.

use std::io::Cursor;
use tailtag::{
    CopyOutcome, FnSink, StreamAdapter, TagError, TagKind, TagOptions, TagSink, TagStore,
    WriteSink,
};

fn audio() -> Vec<u8> {
    (0..2048u32).map(|i| (i % 251) as u8).collect()
}

/// Audio followed by the tag emitted from `store`
fn encode(store: &mut TagStore) -> Vec<u8> {
    let mut data = audio();
    store.write_to_sink(&mut data).unwrap();
    data
}

fn load(data: Vec<u8>) -> TagStore {
    let mut stream = StreamAdapter::new(Cursor::new(data));
    TagStore::load(&mut stream, TagOptions::default()).unwrap()
}

fn names(store: &TagStore) -> Vec<String> {
    store
        .iter()
        .map(|(name, _)| String::from_utf8_lossy(&name).into_owned())
        .collect()
}

#[test]
fn test_round_trip_preserves_items_and_order() {
    let mut store = TagStore::default();
    store.append("Title", b"Blue in Green").unwrap();
    store.append("Artist", b"Miles Davis").unwrap();
    store.append("Album", b"Kind of Blue").unwrap();
    store.append("Year", b"1959").unwrap();

    let loaded = load(encode(&mut store));

    assert_eq!(loaded.kind(), Some(TagKind::Extensible));
    assert_eq!(loaded.item_count(), 4);
    assert_eq!(names(&loaded), vec!["Title", "Artist", "Album", "Year"]);
    assert_eq!(loaded.get("Album").as_deref(), Some(&b"Kind of Blue"[..]));
    assert_eq!(loaded.ape(), store.ape());
}

#[test]
fn test_append_replaces_and_moves_to_end() {
    let mut store = TagStore::default();
    store.append("Title", b"First").unwrap();
    store.append("Artist", b"Someone").unwrap();
    store.append("TITLE", b"Second").unwrap();

    assert_eq!(store.item_count(), 2);
    assert_eq!(names(&store), vec!["Artist", "TITLE"]);
    assert_eq!(store.get("title").as_deref(), Some(&b"Second"[..]));

    let loaded = load(encode(&mut store));
    assert_eq!(loaded.get("Title").as_deref(), Some(&b"Second"[..]));
    assert_eq!(loaded.ape().unwrap().header.item_count, 2);
}

#[test]
fn test_lookup_is_case_insensitive() {
    let mut store = TagStore::default();
    store.append("ReplayGain_Track_Gain", b"-6.5 dB").unwrap();

    for name in ["replaygain_track_gain", "REPLAYGAIN_TRACK_GAIN", "ReplayGain_Track_Gain"] {
        assert_eq!(store.get(name).as_deref(), Some(&b"-6.5 dB"[..]), "{}", name);
    }
    assert!(store.get("ReplayGain_Album_Gain").is_none());

    assert!(store.delete("REPLAYGAIN_track_GAIN"));
    assert!(store.get("ReplayGain_Track_Gain").is_none());
}

#[test]
fn test_bounded_copy_of_values() {
    let mut store = TagStore::default();
    store.append("Title", b"value").unwrap();

    assert_eq!(store.get_item("Title", None), CopyOutcome::Found(5));

    let mut roomy = [0xAAu8; 16];
    assert_eq!(store.get_item("title", Some(&mut roomy)), CopyOutcome::Found(5));
    assert_eq!(&roomy[..6], b"value\0");

    let mut exact = [0xAAu8; 5];
    assert_eq!(store.get_item("Title", Some(&mut exact)), CopyOutcome::Truncated(4));
    assert_eq!(&exact, b"v...\0");

    let mut tiny = [0xAAu8; 3];
    assert_eq!(store.get_item("Title", Some(&mut tiny)), CopyOutcome::Invalid);
    assert_eq!(tiny[0], 0);

    let mut missing = [0xAAu8; 8];
    assert_eq!(store.get_item("Genre", Some(&mut missing)), CopyOutcome::NotFound);
    assert_eq!(missing[0], 0);
}

#[test]
fn test_indexed_names_follow_edits() {
    let mut store = TagStore::default();
    for (name, value) in [("A", "1"), ("B", "2"), ("C", "3")] {
        store.append(name, value.as_bytes()).unwrap();
    }

    let mut buf = [0u8; 8];
    assert_eq!(store.get_item_indexed(1, Some(&mut buf)), CopyOutcome::Found(1));
    assert_eq!(&buf[..2], b"B\0");
    assert_eq!(store.get_item_indexed(3, Some(&mut buf)), CopyOutcome::NotFound);

    assert!(store.delete("b"));
    assert_eq!(store.get_item_indexed(1, Some(&mut buf)), CopyOutcome::Found(1));
    assert_eq!(&buf[..2], b"C\0");
    assert_eq!(store.get_item_indexed(2, None), CopyOutcome::NotFound);
}

#[test]
fn test_delete_missing_item_reports_false() {
    let mut store = TagStore::default();
    assert!(!store.delete("Title"));

    store.append("Title", b"x").unwrap();
    assert!(!store.delete("Artist"));
    assert_eq!(store.item_count(), 1);
}

#[test]
fn test_deleting_every_item_writes_nothing() {
    let mut store = TagStore::default();
    store.append("Title", b"Gone").unwrap();
    assert!(store.delete("Title"));

    let mut out = Vec::new();
    store.write_to_sink(&mut out).unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_legacy_trailer_read_through_store() {
    let mut trailer = vec![0u8; 128];
    trailer[..3].copy_from_slice(b"TAG");
    trailer[3..13].copy_from_slice(b"Old Title ");
    trailer[33..39].copy_from_slice(b"Artist");
    trailer[93..97].copy_from_slice(b"1999");
    trailer[125] = 0;
    trailer[126] = 7;

    let mut data = audio();
    data.extend_from_slice(&trailer);
    let store = load(data);

    assert_eq!(store.kind(), Some(TagKind::Fixed));
    assert_eq!(store.anchor(), -128);
    assert_eq!(names(&store), vec!["Title", "Artist", "Year", "Track"]);
    assert_eq!(store.get("TITLE").as_deref(), Some(&b"Old Title"[..]));
    assert_eq!(store.get("track").as_deref(), Some(&b"7"[..]));
    assert!(store.get("Album").is_none());
}

#[test]
fn test_append_over_legacy_trailer_starts_ape_tag() {
    let mut trailer = vec![0u8; 128];
    trailer[..3].copy_from_slice(b"TAG");
    trailer[3..8].copy_from_slice(b"Title");

    let mut data = audio();
    data.extend_from_slice(&trailer);
    let mut store = load(data);

    store.append("Artist", b"New").unwrap();
    assert_eq!(store.kind(), Some(TagKind::Extensible));
    assert!(store.get("Title").is_none());
    assert_eq!(store.anchor(), -128);
}

#[test]
fn test_write_through_tag_sink_variants() {
    let mut store = TagStore::default();
    store.append("Title", b"Sinks").unwrap();

    let mut blocks = Vec::new();
    store.write_tag(TagSink::Blocks(&mut blocks)).unwrap();

    let mut collected = Vec::new();
    let mut sink = FnSink(|data: &[u8]| {
        collected.push(data.len());
        true
    });
    store.write_to_sink(&mut sink).unwrap();
    assert_eq!(collected, vec![32, blocks.len() - 64, 32]);

    let mut writer = WriteSink::new(Vec::new());
    store.write_to_sink(&mut writer).unwrap();
    writer.flush().unwrap();
    assert_eq!(writer.into_inner(), blocks);
}

#[test]
fn test_rejecting_sink_sets_error_message() {
    let mut store = TagStore::default();
    store.append("Title", b"x").unwrap();

    let mut sink = FnSink(|_: &[u8]| false);
    assert!(matches!(
        store.write_to_sink(&mut sink),
        Err(TagError::SinkRejected)
    ));
    assert_eq!(
        store.error_message(),
        Some("can't write tag data, disk probably full!")
    );
}

#[test]
fn test_binary_values_survive() {
    let value: Vec<u8> = (0..=255u8).collect();
    let mut store = TagStore::default();
    store.append("Cover Art (Front)", &value).unwrap();

    let loaded = load(encode(&mut store));
    assert_eq!(loaded.get("cover art (front)").as_deref(), Some(&value[..]));
}
