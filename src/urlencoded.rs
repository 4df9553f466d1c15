use crate::constants;
use crate::merge::merge_parameter;
use crate::value::{Map, Value};
use encoding_rs::Encoding;

/// Decodes `+` and `%XX` escapes of `buf` in place.
///
/// A single pass moves a read cursor and a write cursor over the same
/// storage, so no second buffer is allocated. A `%` followed by two bytes
/// always consumes them; a byte that is not a hex digit counts as `0`, so
/// `%zz` decodes to `0x00`. A `%` with fewer than two bytes after it is kept
/// as is.
pub fn decode_in_place(buf: &mut Vec<u8>) {
    let len = buf.len();
    let mut read = 0;
    let mut write = 0;

    while read < len {
        let byte = buf[read];

        if byte == constants::PERCENT && read + 2 < len {
            buf[write] = (hex_value(buf[read + 1]) << 4) | hex_value(buf[read + 2]);
            read += 3;
        } else {
            buf[write] = if byte == constants::PLUS { constants::SPACE } else { byte };
            read += 1;
        }

        write += 1;
    }

    buf.truncate(write);
}

/// Percent-decodes `input` into a new buffer. See [`decode_in_place`].
///
/// # Examples
///
/// ```
/// assert_eq!(form_params::percent_decode(b"a%20b+c"), b"a b c");
/// ```
pub fn percent_decode(input: &[u8]) -> Vec<u8> {
    let mut buf = input.to_vec();
    decode_in_place(&mut buf);
    buf
}

fn hex_value(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        b'A'..=b'F' => byte - b'A' + 10,
        _ => 0,
    }
}

/// Splits an `application/x-www-form-urlencoded` body into pairs, decodes
/// them with `encoding` and merges every pair with a non-empty name into
/// `params`.
pub(crate) fn parse_urlencoded(body: &[u8], encoding: &'static Encoding, params: &mut Map) {
    for token in body.split(|&b| b == constants::AMPERSAND) {
        if token.is_empty() {
            continue;
        }

        let (raw_name, raw_value) = match memchr::memchr(constants::EQUALS, token) {
            Some(idx) => (&token[..idx], &token[idx + 1..]),
            None => (token, &[][..]),
        };

        let name = decode_text(raw_name, encoding);
        if name.is_empty() {
            continue;
        }

        let value = decode_text(raw_value, encoding);
        merge_parameter(params, &name, Value::from(value));
    }
}

fn decode_text(raw: &[u8], encoding: &'static Encoding) -> String {
    let mut buf = raw.to_vec();
    decode_in_place(&mut buf);
    let (text, _) = encoding.decode_without_bom_handling(&buf);
    text.into_owned()
}
