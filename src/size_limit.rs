use crate::constants;
use std::collections::HashMap;

/// Byte limits applied while a body is parsed.
///
/// The whole-stream limit counts every byte pulled from the source; the field
/// limits count the body bytes of a single part. Both default to unlimited.
///
/// See [`Constraints`](crate::Constraints).
#[derive(Debug, Clone)]
pub struct SizeLimit {
    pub(crate) whole_stream: u64,
    pub(crate) per_field: u64,
    pub(crate) field_map: HashMap<String, u64>,
}

impl SizeLimit {
    pub fn new() -> SizeLimit {
        SizeLimit::default()
    }

    /// Caps the number of bytes read from the source.
    pub fn whole_stream(mut self, limit: u64) -> SizeLimit {
        self.whole_stream = limit;
        self
    }

    /// Caps the body size of every part without its own limit.
    pub fn per_field(mut self, limit: u64) -> SizeLimit {
        self.per_field = limit;
        self
    }

    /// Caps the body size of the parts named `field_name`, replacing the
    /// `per_field` limit for them. Useful for text fields, which are always
    /// held in memory.
    pub fn for_field<N: Into<String>>(mut self, field_name: N, limit: u64) -> SizeLimit {
        self.field_map.insert(field_name.into(), limit);
        self
    }

    pub(crate) fn limit_for(&self, field_name: Option<&str>) -> u64 {
        field_name
            .and_then(|name| self.field_map.get(name))
            .copied()
            .unwrap_or(self.per_field)
    }
}

impl Default for SizeLimit {
    fn default() -> Self {
        SizeLimit {
            whole_stream: constants::DEFAULT_WHOLE_STREAM_SIZE_LIMIT,
            per_field: constants::DEFAULT_PER_FIELD_SIZE_LIMIT,
            field_map: HashMap::new(),
        }
    }
}
