#![no_main]

use form_params::Map;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut params = Map::new();
    form_params::parse_urlencoded(data, &mut params);
});
