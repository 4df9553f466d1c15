use crate::part::PartDescriptor;
use crate::value::Value;
use bytes::BytesMut;
use encoding_rs::Encoding;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// A consumer of one part's body bytes.
///
/// The parser calls [`write`](PartSink::write) with consecutive slices of the
/// body and [`close`](PartSink::close) once the closing boundary was found.
/// A sink that is dropped without being closed belongs to a failed parse and
/// must release whatever it holds.
pub trait PartSink {
    fn write(&mut self, bytes: &[u8]) -> crate::Result<()>;

    /// Finalizes the part and returns the value merged into the parameters.
    fn close(self: Box<Self>) -> crate::Result<Value>;
}

/// Creates the sink for a part from its descriptor and the configured text
/// encoding.
pub type SinkFactory =
    dyn Fn(&PartDescriptor, &'static Encoding) -> crate::Result<Box<dyn PartSink>> + Send + Sync;

pub(crate) fn default_sink_factory() -> Arc<SinkFactory> {
    Arc::new(buffer_sink)
}

/// A [`SinkFactory`] keeping every part in memory.
pub fn buffer_sink(part: &PartDescriptor, encoding: &'static Encoding) -> crate::Result<Box<dyn PartSink>> {
    Ok(Box::new(BufferSink::new(part, encoding)))
}

/// A [`SinkFactory`] spooling file uploads to temporary files in the system
/// temporary directory and keeping other parts in memory.
pub fn temp_file_sink(part: &PartDescriptor, encoding: &'static Encoding) -> crate::Result<Box<dyn PartSink>> {
    if part.is_file() {
        Ok(Box::new(TempFileSink::new()?))
    } else {
        buffer_sink(part, encoding)
    }
}

/// Like [`temp_file_sink`], with the temporary files created in `dir`.
pub fn temp_file_sink_in<P: Into<PathBuf>>(
    dir: P,
) -> impl Fn(&PartDescriptor, &'static Encoding) -> crate::Result<Box<dyn PartSink>> + Send + Sync + 'static {
    let dir = dir.into();
    move |part: &PartDescriptor, encoding: &'static Encoding| -> crate::Result<Box<dyn PartSink>> {
        if part.is_file() {
            Ok(Box::new(TempFileSink::new_in(&dir)?))
        } else {
            buffer_sink(part, encoding)
        }
    }
}

/// Accumulates a part in memory.
///
/// Closes to the raw bytes for file uploads and to decoded text otherwise.
pub struct BufferSink {
    buf: BytesMut,
    is_file: bool,
    encoding: &'static Encoding,
}

impl BufferSink {
    pub fn new(part: &PartDescriptor, encoding: &'static Encoding) -> BufferSink {
        BufferSink {
            buf: BytesMut::new(),
            is_file: part.is_file(),
            encoding: part.text_encoding(encoding),
        }
    }
}

impl PartSink for BufferSink {
    fn write(&mut self, bytes: &[u8]) -> crate::Result<()> {
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn close(self: Box<Self>) -> crate::Result<Value> {
        if self.is_file {
            return Ok(Value::from(self.buf.freeze()));
        }

        let (text, _) = self.encoding.decode_without_bom_handling(&self.buf);
        Ok(Value::from(text.into_owned()))
    }
}

/// Writes a file upload to a newly created temporary file.
///
/// Closes to the path of the file, which from then on belongs to the caller.
/// An unclosed sink deletes its file when dropped.
pub struct TempFileSink {
    file: BufWriter<NamedTempFile>,
}

impl TempFileSink {
    pub fn new() -> crate::Result<TempFileSink> {
        TempFileSink::new_in(std::env::temp_dir())
    }

    pub fn new_in<P: AsRef<Path>>(dir: P) -> crate::Result<TempFileSink> {
        let file = tempfile::Builder::new()
            .prefix("upload-")
            .tempfile_in(dir)
            .map_err(|err| crate::Error::SinkFailed(err.into()))?;

        log::debug!("spooling upload to {}", file.path().display());

        Ok(TempFileSink {
            file: BufWriter::new(file),
        })
    }
}

impl PartSink for TempFileSink {
    fn write(&mut self, bytes: &[u8]) -> crate::Result<()> {
        self.file
            .write_all(bytes)
            .map_err(|err| crate::Error::SinkFailed(err.into()))
    }

    fn close(self: Box<Self>) -> crate::Result<Value> {
        let file = self
            .file
            .into_inner()
            .map_err(|err| crate::Error::SinkFailed(err.into_error().into()))?;

        let path = file
            .into_temp_path()
            .keep()
            .map_err(|err| crate::Error::SinkFailed(err.into()))?;

        Ok(Value::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_8, WINDOWS_1252};
    use http::header::{HeaderMap, HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};

    fn part(disposition: &str, content_type: Option<&str>) -> PartDescriptor {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_DISPOSITION, HeaderValue::from_str(disposition).unwrap());
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        }
        PartDescriptor::new(headers, 0, UTF_8)
    }

    fn fill(mut sink: Box<dyn PartSink>, chunks: &[&[u8]]) -> Value {
        for chunk in chunks {
            sink.write(chunk).unwrap();
        }
        sink.close().unwrap()
    }

    #[test]
    fn test_buffer_sink_text() {
        let field = part("form-data; name=\"title\"", None);
        let sink = buffer_sink(&field, UTF_8).unwrap();
        assert_eq!(fill(sink, &[b"hel", b"lo"]), Value::from("hello"));
    }

    #[test]
    fn test_buffer_sink_decodes_with_encoding() {
        let field = part("form-data; name=\"title\"", None);
        let sink = buffer_sink(&field, WINDOWS_1252).unwrap();
        assert_eq!(fill(sink, &[b"caf\xe9"]), Value::from("café"));

        let field = part("form-data; name=\"title\"", Some("text/plain; charset=utf-8"));
        let sink = buffer_sink(&field, WINDOWS_1252).unwrap();
        assert_eq!(fill(sink, &["café".as_bytes()]), Value::from("café"));
    }

    #[test]
    fn test_buffer_sink_file_is_binary() {
        let upload = part("form-data; name=\"upload\"; filename=\"a.bin\"", None);
        let sink = buffer_sink(&upload, UTF_8).unwrap();
        assert_eq!(
            fill(sink, &[b"\x00\xff", b"\r\n"]),
            Value::from(bytes::Bytes::from_static(b"\x00\xff\r\n"))
        );
    }

    #[test]
    fn test_temp_file_sink() {
        let upload = part("form-data; name=\"upload\"; filename=\"a.txt\"", None);
        let sink = temp_file_sink(&upload, UTF_8).unwrap();
        let value = fill(sink, &[b"da", b"ta"]);

        let path = value.as_path().unwrap().to_owned();
        assert_eq!(std::fs::read(&path).unwrap(), b"data");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_temp_file_sink_delegates_text_fields() {
        let field = part("form-data; name=\"title\"", None);
        let sink = temp_file_sink(&field, UTF_8).unwrap();
        assert_eq!(fill(sink, &[b"hello"]), Value::from("hello"));
    }

    #[test]
    fn test_temp_file_sink_removed_when_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = TempFileSink::new_in(dir.path()).unwrap();
        sink.write(b"partial").unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        drop(sink);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_temp_file_sink_in() {
        let dir = tempfile::tempdir().unwrap();
        let factory = temp_file_sink_in(dir.path());

        let upload = part("form-data; name=\"upload\"; filename=\"a.txt\"", None);
        let value = fill(factory(&upload, UTF_8).unwrap(), &[b"data"]);

        let path = value.as_path().unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(std::fs::read(path).unwrap(), b"data");
    }
}
