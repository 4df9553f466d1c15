use crate::content_disposition::ContentDisposition;
use encoding_rs::Encoding;
use http::header::{self, HeaderMap, HeaderValue};

/// The metadata of one multipart part, available once its header block has
/// been parsed.
///
/// A [`SinkFactory`](crate::SinkFactory) receives the descriptor to decide
/// where the part's body goes.
#[derive(Debug, Clone)]
pub struct PartDescriptor {
    name: Option<String>,
    file_name: Option<String>,
    content_type: Option<String>,
    headers: HeaderMap,
    index: usize,
}

impl PartDescriptor {
    /// Builds a descriptor from parsed part headers. Header values are decoded
    /// with `encoding`.
    pub fn new(headers: HeaderMap, index: usize, encoding: &'static Encoding) -> PartDescriptor {
        let content_disposition = headers
            .get(header::CONTENT_DISPOSITION)
            .map(|val| ContentDisposition::parse(&decode_header_value(val, encoding)))
            .unwrap_or_default();

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .map(|val| decode_header_value(val, encoding).trim().to_owned());

        PartDescriptor {
            name: content_disposition.field_name,
            file_name: content_disposition.file_name,
            content_type,
            headers,
            index,
        }
    }

    /// The `name` parameter of the `Content-Disposition` header.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The `filename` parameter of the `Content-Disposition` header.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// The verbatim `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The `Content-Type` header parsed as a [`mime::Mime`].
    pub fn mime(&self) -> Option<mime::Mime> {
        self.content_type.as_deref().and_then(|val| val.parse::<mime::Mime>().ok())
    }

    /// All headers of the part.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Zero-based position of the part within the body.
    pub fn index(&self) -> usize {
        self.index
    }

    /// A part carrying a `filename` is a file upload.
    pub fn is_file(&self) -> bool {
        self.file_name.is_some()
    }

    /// The encoding to decode this part's text with: the `charset` of its own
    /// `Content-Type` when known, otherwise `default`.
    pub fn text_encoding(&self, default: &'static Encoding) -> &'static Encoding {
        self.mime()
            .and_then(|mime| {
                mime.get_param(mime::CHARSET)
                    .and_then(|charset| Encoding::for_label(charset.as_str().as_bytes()))
            })
            .unwrap_or(default)
    }
}

fn decode_header_value(value: &HeaderValue, encoding: &'static Encoding) -> String {
    let (text, _) = encoding.decode_without_bom_handling(value.as_bytes());
    text.into_owned()
}
