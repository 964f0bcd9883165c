#![no_main]

use freaky_friday_client::protocol::{decode, ServerMessage};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The wire enum on its own, including serde_json's UTF-8 handling.
    let _ = serde_json::from_slice::<ServerMessage>(data);

    // The full decode path must classify every input without panicking.
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = decode(s);
    }
});
