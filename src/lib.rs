//! Decodes HTTP request bodies into nested parameter maps.
//!
//! Both `application/x-www-form-urlencoded` and `multipart/form-data` bodies
//! are supported. Multipart bodies are read incrementally from a pull-based
//! [`ByteSource`] through a bounded window, with each part's body handed to a
//! pluggable [`PartSink`]. Parameter names use the bracket notation
//! (`user[name]`, `tags[]`) to build nested objects and arrays.
//!
//! # Examples
//!
//! ```
//! use form_params::{Map, Value};
//!
//! let body = "--XYZ\r\n\
//!     Content-Disposition: form-data; name=\"tags[]\"\r\n\r\n\
//!     rust\r\n\
//!     --XYZ\r\n\
//!     Content-Disposition: form-data; name=\"tags[]\"\r\n\r\n\
//!     http\r\n\
//!     --XYZ--\r\n";
//!
//! let mut params = Map::new();
//! form_params::parse_multipart("multipart/form-data; boundary=XYZ", body.as_bytes(), &mut params).unwrap();
//!
//! assert_eq!(
//!     params.get("tags"),
//!     Some(&Value::from(vec![Value::from("rust"), Value::from("http")]))
//! );
//! ```

pub use constraints::Constraints;
pub use error::{Error, ErrorKind};
pub use merge::merge_parameter;
pub use parser::FormParser;
pub use part::PartDescriptor;
pub use sink::{buffer_sink, temp_file_sink, temp_file_sink_in, BufferSink, PartSink, SinkFactory, TempFileSink};
pub use size_limit::SizeLimit;
pub use source::{ByteSource, ChunkSource};
pub use urlencoded::percent_decode;
pub use value::{Map, Scalar, Value};

mod buffer;
mod constants;
mod constraints;
mod content_disposition;
mod error;
mod helpers;
mod merge;
mod multipart;
mod parser;
mod part;
mod sink;
mod size_limit;
mod source;
mod state;
mod urlencoded;
mod value;

/// A Result type often returned from methods that can have `form_params` errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Decodes an `application/x-www-form-urlencoded` body with the default
/// [`FormParser`] and merges it into `params`.
pub fn parse_urlencoded(body: &[u8], params: &mut Map) {
    FormParser::default().parse_urlencoded(body, params)
}

/// Decodes a `multipart/form-data` body with the default [`FormParser`] and
/// merges it into `params`.
///
/// See [`FormParser::parse_multipart`].
pub fn parse_multipart<S: ByteSource>(content_type: &str, source: S, params: &mut Map) -> crate::Result<()> {
    FormParser::default().parse_multipart(content_type, source, params)
}

/// Parses the `Content-Type` header to extract the boundary value.
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> crate::Result<String> {
    let m = content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map_err(crate::Error::DecodeContentType)?;

    if !(m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA) {
        return Err(crate::Error::NoMultipart);
    }

    m.get_param(mime::BOUNDARY)
        .map(|name| name.as_str().to_owned())
        .ok_or(crate::Error::NoBoundary)
}

/// Whether `content_type` is `multipart/form-data`.
pub fn is_multipart<T: AsRef<str>>(content_type: T) -> bool {
    content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map(|m| m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA)
        .unwrap_or(false)
}

/// Whether `content_type` is `application/x-www-form-urlencoded`.
pub fn is_urlencoded<T: AsRef<str>>(content_type: T) -> bool {
    content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map(|m| m.type_() == mime::APPLICATION && m.subtype() == mime::WWW_FORM_URLENCODED)
        .unwrap_or(false)
}
