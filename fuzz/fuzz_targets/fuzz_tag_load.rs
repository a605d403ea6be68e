#![no_main]
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use tailtag::{StreamAdapter, TagOptions, TagStore};

// Arbitrary trailing bytes must load or fail cleanly, and every accessor
// on a loaded tag must stay inside its buffers.
fuzz_target!(|data: &[u8]| {
    for validate in [true, false] {
        let mut stream = StreamAdapter::new(Cursor::new(data.to_vec()));
        let options = TagOptions::new().validate_items(validate);
        let store = match TagStore::load(&mut stream, options) {
            Ok(store) => store,
            Err(_) => continue,
        };

        let mut buf = [0u8; 24];
        for index in 0..store.item_count() {
            store.get_item_indexed(index, Some(&mut buf));
            if let Some(name) = store.name_at(index) {
                let name = String::from_utf8_lossy(&name).into_owned();
                store.get_item(&name, Some(&mut buf));
                store.get_item(&name, None);
            }
        }
    }
});
