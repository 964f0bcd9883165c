#![no_main]

use freaky_friday_client::GameStore;
use libfuzzer_sys::fuzz_target;

// Newline-separated messages interleaved with local actions.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut store = GameStore::new();
    for line in text.lines() {
        if let Some(id) = line.strip_prefix("toggle ") {
            if let Ok(id) = id.trim().parse::<i32>() {
                let _ = store.toggle_select(id);
            }
        } else if line == "submit" {
            let _ = store.try_submit();
        } else {
            let _ = store.receive(line);
        }
        let view = store.view();
        if view.is_judge() {
            assert!(view.selection.len() <= 1);
        } else {
            let ids = view.selection.as_slice();
            assert!(ids.iter().all(|&id| view.hand_contains(id)));
        }
    }
});
