#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use tailtag::{StreamAdapter, TagError, TagOptions, TagStore};

#[derive(Arbitrary, Debug)]
enum Edit {
    Append { name: String, value: Vec<u8> },
    Delete { name: String },
    Save,
}

#[derive(Arbitrary, Debug)]
struct Input {
    initial: Vec<u8>,
    edits: Vec<Edit>,
}

// Edits followed by in-place saves must always reload to the same items.
fuzz_target!(|input: Input| {
    let options = TagOptions::new().edit_tags(true).validate_items(false);
    let mut stream = StreamAdapter::new(Cursor::new(input.initial));
    let mut store = match TagStore::load(&mut stream, options) {
        Ok(store) => store,
        Err(_) => return,
    };

    for edit in input.edits {
        match edit {
            Edit::Append { name, value } => match store.append(&name, &value) {
                Ok(()) => {}
                Err(TagError::TagTooLarge { .. }) => {}
                Err(TagError::InvalidItemName(_)) if name.contains('\0') => {}
                Err(e) => panic!("unexpected append failure: {}", e),
            },
            Edit::Delete { name } => {
                store.delete(&name);
            }
            Edit::Save => {
                if store.write_in_place(&mut stream).is_err() {
                    return;
                }
            }
        }
    }

    if store.write_in_place(&mut stream).is_err() {
        return;
    }

    let expected: Vec<_> = store
        .iter()
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    let reloaded = TagStore::load(&mut stream, options).expect("rewritten tag must reload");
    if store.ape().is_some() {
        let actual: Vec<_> = reloaded
            .iter()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        assert_eq!(actual, expected);
    }
});
