#![no_main]

use form_params::{FormParser, Map};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // A small window forces refills on short inputs too.
    let parser = FormParser::new().buffer_size(16).max_header_size(256);

    let mut params = Map::new();
    let _ = parser.parse_multipart("multipart/form-data; boundary=X-BOUNDARY", data, &mut params);
});
