pub(crate) const DEFAULT_WHOLE_STREAM_SIZE_LIMIT: u64 = u64::MAX;
pub(crate) const DEFAULT_PER_FIELD_SIZE_LIMIT: u64 = u64::MAX;

pub(crate) const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;
pub(crate) const DEFAULT_MAX_HEADER_SIZE: usize = 8 * 1024;

pub(crate) const MAX_HEADERS: usize = 32;
pub(crate) const BOUNDARY_EXT: &[u8] = b"--";
pub(crate) const CR: u8 = b'\r';
pub(crate) const CRLF: &[u8] = b"\r\n";
pub(crate) const CRLF_CRLF: &[u8] = b"\r\n\r\n";

pub(crate) const AMPERSAND: u8 = b'&';
pub(crate) const EQUALS: u8 = b'=';
pub(crate) const PLUS: u8 = b'+';
pub(crate) const PERCENT: u8 = b'%';
pub(crate) const SPACE: u8 = b' ';
pub(crate) const TAB: u8 = b'\t';

pub(crate) const NAME_KEY: &str = "name";
pub(crate) const FILENAME_KEY: &str = "filename";
pub(crate) const CONTENT_TYPE_KEY: &str = "contentType";
pub(crate) const VALUE_KEY: &str = "value";
