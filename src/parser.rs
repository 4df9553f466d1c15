use crate::constants;
use crate::constraints::Constraints;
use crate::multipart::Multipart;
use crate::part::PartDescriptor;
use crate::sink::{self, PartSink, SinkFactory};
use crate::source::ByteSource;
use crate::urlencoded;
use crate::value::Map;
use encoding_rs::{Encoding, UTF_8};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Decodes request bodies into a [`Map`] of parameters.
///
/// A `FormParser` only holds read-only configuration, so one instance can be
/// shared by any number of concurrent parses. Every parse merges into the
/// map it is given, which lets a query string and a body compose into one
/// structure.
///
/// # Examples
///
/// ```
/// use form_params::{FormParser, Map, Value};
///
/// let parser = FormParser::new().encoding("utf-8").buffer_size(4096);
///
/// let mut params = Map::new();
/// parser.parse_urlencoded(b"page=2", &mut params);
///
/// let body = "--X\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nhello\r\n--X--\r\n";
/// parser
///     .parse_body("multipart/form-data; boundary=X", body.as_bytes(), &mut params)
///     .unwrap();
///
/// assert_eq!(params.get("page").and_then(Value::as_str), Some("2"));
/// assert_eq!(params.get("title").and_then(Value::as_str), Some("hello"));
/// ```
#[derive(Clone)]
pub struct FormParser {
    encoding: &'static Encoding,
    buffer_size: usize,
    max_header_size: usize,
    constraints: Constraints,
    sink_factory: Arc<SinkFactory>,
}

impl FormParser {
    pub fn new() -> FormParser {
        FormParser::default()
    }

    /// Sets the charset used to decode text values and part headers.
    /// An unknown label leaves UTF-8 in place.
    pub fn encoding(mut self, label: &str) -> FormParser {
        self.encoding = match Encoding::for_label(label.as_bytes()) {
            Some(encoding) => encoding,
            None => {
                log::warn!("unknown encoding label {:?}, falling back to UTF-8", label);
                UTF_8
            }
        };
        self
    }

    /// Sets the size of the window multipart bodies are read through. It is
    /// raised as needed to hold the boundary.
    pub fn buffer_size(mut self, size: usize) -> FormParser {
        self.buffer_size = size;
        self
    }

    /// Sets the largest header block a multipart part may have.
    pub fn max_header_size(mut self, size: usize) -> FormParser {
        self.max_header_size = size;
        self
    }

    pub fn constraints(mut self, constraints: Constraints) -> FormParser {
        self.constraints = constraints;
        self
    }

    /// Sets the factory creating a [`PartSink`] for every named multipart part.
    ///
    /// The default is [`buffer_sink`](crate::buffer_sink); use
    /// [`temp_file_sink`](crate::temp_file_sink) to spool uploads to disk.
    pub fn sink_factory<F>(mut self, factory: F) -> FormParser
    where
        F: Fn(&PartDescriptor, &'static Encoding) -> crate::Result<Box<dyn PartSink>> + Send + Sync + 'static,
    {
        self.sink_factory = Arc::new(factory);
        self
    }

    pub fn get_encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn get_buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn get_max_header_size(&self) -> usize {
        self.max_header_size
    }

    pub fn get_constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub(crate) fn create_sink(&self, part: &PartDescriptor) -> crate::Result<Box<dyn PartSink>> {
        (self.sink_factory)(part, self.encoding)
    }

    /// Decodes an `application/x-www-form-urlencoded` body (or a query string)
    /// and merges its pairs into `params`.
    pub fn parse_urlencoded(&self, body: &[u8], params: &mut Map) {
        urlencoded::parse_urlencoded(body, self.encoding, params);
    }

    /// Decodes a `multipart/form-data` body read from `source` and merges its
    /// parts into `params`.
    ///
    /// A content type without a `boundary` parameter leaves `params`
    /// untouched. On error, parts merged before the failure stay in `params`.
    pub fn parse_multipart<S: ByteSource>(&self, content_type: &str, mut source: S, params: &mut Map) -> crate::Result<()> {
        let boundary = match boundary_param(content_type) {
            Some(boundary) => boundary,
            None => {
                log::debug!("no multipart boundary in {:?}, nothing to parse", content_type);
                return Ok(());
            }
        };

        Multipart::new(self, &boundary, &mut source, params).run()
    }

    /// Decodes `source` according to `content_type`. Multipart and urlencoded
    /// bodies are merged into `params`; any other body is left unread.
    pub fn parse_body<S: ByteSource>(&self, content_type: &str, mut source: S, params: &mut Map) -> crate::Result<()> {
        if crate::is_multipart(content_type) {
            self.parse_multipart(content_type, source, params)
        } else if crate::is_urlencoded(content_type) {
            let body = self.read_to_end(&mut source)?;
            self.parse_urlencoded(&body, params);
            Ok(())
        } else {
            log::debug!("content type {:?} carries no form parameters", content_type);
            Ok(())
        }
    }

    fn read_to_end<S: ByteSource + ?Sized>(&self, source: &mut S) -> crate::Result<Vec<u8>> {
        let limit = self.constraints.size_limit.whole_stream;
        let mut body = Vec::new();
        let mut chunk = vec![0; self.buffer_size.max(1)];

        loop {
            let read = source
                .read_into(&mut chunk)
                .map_err(|err| crate::Error::StreamReadFailed(err.into()))?;

            if read == 0 {
                return Ok(body);
            }

            if (body.len() + read) as u64 > limit {
                return Err(crate::Error::StreamSizeExceeded { limit });
            }

            body.extend_from_slice(&chunk[..read]);
        }
    }
}

impl Default for FormParser {
    fn default() -> Self {
        FormParser {
            encoding: UTF_8,
            buffer_size: constants::DEFAULT_BUFFER_SIZE,
            max_header_size: constants::DEFAULT_MAX_HEADER_SIZE,
            constraints: Constraints::default(),
            sink_factory: sink::default_sink_factory(),
        }
    }
}

impl Debug for FormParser {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormParser")
            .field("encoding", &self.encoding.name())
            .field("buffer_size", &self.buffer_size)
            .field("max_header_size", &self.max_header_size)
            .field("constraints", &self.constraints)
            .finish_non_exhaustive()
    }
}

/// The `boundary` parameter of `content_type`, if it parses and has one.
fn boundary_param(content_type: &str) -> Option<String> {
    let mime = content_type.parse::<mime::Mime>().ok()?;
    let boundary = mime.get_param(mime::BOUNDARY)?.as_str().to_owned();

    if boundary.is_empty() {
        None
    } else {
        Some(boundary)
    }
}
