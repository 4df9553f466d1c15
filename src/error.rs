use std::fmt::{self, Debug, Display, Formatter};

use derive_more::Display;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur while decoding a request body into
/// parameters.
#[derive(Display)]
#[non_exhaustive]
pub enum Error {
    /// The `Content-Type` header is not `multipart/form-data`.
    #[display(fmt = "Content-Type is not multipart/form-data")]
    NoMultipart,

    /// Failed to convert the `Content-Type` to [`mime::Mime`] type.
    #[display(fmt = "failed to convert Content-Type to `mime::Mime` type: {}", _0)]
    DecodeContentType(mime::FromStrError),

    /// No boundary found in `Content-Type` header.
    #[display(fmt = "multipart boundary not found in Content-Type")]
    NoBoundary,

    /// Reading from the byte source failed.
    #[display(fmt = "stream read failed: {}", _0)]
    StreamReadFailed(BoxError),

    /// The boundary could not be found where one was required.
    #[display(fmt = "incomplete multipart stream")]
    IncompleteStream,

    /// A boundary was followed by something other than `--` or a line break.
    #[display(fmt = "boundary is not followed by a line break")]
    MalformedBoundary,

    /// A part's header block was not terminated by an empty line.
    #[display(fmt = "headers could not be parsed")]
    IncompleteHeaders,

    /// A part's header block did not fit into the configured maximum size.
    #[display(fmt = "part headers exceeded the maximum size: {} bytes", limit)]
    HeadersTooLarge { limit: usize },

    /// Failed to read headers.
    #[display(fmt = "failed to read headers: {}", _0)]
    ReadHeaderFailed(httparse::Error),

    /// Failed to decode the part's raw header name to
    /// [`HeaderName`](http::header::HeaderName) type.
    #[display(fmt = "failed to decode part's raw header name: {:?} {}", name, cause)]
    DecodeHeaderName { name: String, cause: BoxError },

    /// Failed to decode the part's raw header value to
    /// [`HeaderValue`](http::header::HeaderValue) type.
    #[display(fmt = "failed to decode part's raw header value: {}", cause)]
    DecodeHeaderValue { value: Vec<u8>, cause: BoxError },

    /// An unknown field is detected when
    /// [`Constraints::allowed_fields`](crate::Constraints::allowed_fields) is set.
    #[display(fmt = "unknown field received: {}", "field_name.as_deref().unwrap_or(\"<unknown>\")")]
    UnknownField { field_name: Option<String> },

    /// The incoming field size exceeded the maximum limit.
    #[display(
        fmt = "field '{}' exceeded the maximum size limit: {} bytes",
        "field_name.as_deref().unwrap_or(\"<unknown>\")",
        limit
    )]
    FieldSizeExceeded { limit: u64, field_name: Option<String> },

    /// The incoming stream size exceeded the maximum limit.
    #[display(fmt = "stream size exceeded the maximum limit: {} bytes", limit)]
    StreamSizeExceeded { limit: u64 },

    /// A part sink failed to store or finalize the part's data.
    #[display(fmt = "failed to store part data: {}", _0)]
    SinkFailed(BoxError),
}

/// The broad category an [`Error`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The content type is unusable for the requested operation.
    Configuration,
    /// The byte source failed.
    Stream,
    /// The body does not follow the wire format.
    Parse,
    /// A sink could not store a part.
    Resource,
    /// A configured size or field constraint was violated.
    Limit,
}

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoMultipart | Error::DecodeContentType(_) | Error::NoBoundary => ErrorKind::Configuration,
            Error::StreamReadFailed(_) => ErrorKind::Stream,
            Error::IncompleteStream
            | Error::MalformedBoundary
            | Error::IncompleteHeaders
            | Error::HeadersTooLarge { .. }
            | Error::ReadHeaderFailed(_)
            | Error::DecodeHeaderName { .. }
            | Error::DecodeHeaderValue { .. } => ErrorKind::Parse,
            Error::SinkFailed(_) => ErrorKind::Resource,
            Error::UnknownField { .. } | Error::FieldSizeExceeded { .. } | Error::StreamSizeExceeded { .. } => {
                ErrorKind::Limit
            }
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DecodeContentType(err) => Some(err),
            Error::ReadHeaderFailed(err) => Some(err),
            Error::StreamReadFailed(err) | Error::SinkFailed(err) => Some(err.as_ref()),
            Error::DecodeHeaderName { cause, .. } | Error::DecodeHeaderValue { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::NoBoundary.kind(), ErrorKind::Configuration);
        assert_eq!(Error::IncompleteHeaders.kind(), ErrorKind::Parse);
        assert_eq!(Error::StreamReadFailed("boom".into()).kind(), ErrorKind::Stream);
        assert_eq!(Error::SinkFailed("disk full".into()).kind(), ErrorKind::Resource);
        assert_eq!(Error::StreamSizeExceeded { limit: 1 }.kind(), ErrorKind::Limit);
    }

    #[test]
    fn test_error_display() {
        let err = Error::FieldSizeExceeded {
            limit: 10,
            field_name: None,
        };
        assert_eq!(
            err.to_string(),
            "field '<unknown>' exceeded the maximum size limit: 10 bytes"
        );
        assert_eq!(Error::IncompleteHeaders.to_string(), "headers could not be parsed");
        assert_eq!(
            Error::UnknownField {
                field_name: Some("x".to_owned())
            }
            .to_string(),
            "unknown field received: x"
        );
        assert_eq!(format!("{:?}", Error::NoBoundary), Error::NoBoundary.to_string());
    }
}
