use bytes::{Buf, Bytes};
use std::io::{self, Read};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A pull-based producer of request body bytes.
///
/// `read_into` copies up to `buf.len()` bytes into `buf` and returns how many
/// were written. `Ok(0)` marks the end of the stream. The parser never owns
/// the source beyond a single parse call and never closes it.
///
/// Every [`std::io::Read`] is a `ByteSource`, so a `&[u8]`, a file or a
/// socket can be handed to the parser directly.
pub trait ByteSource {
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<R: Read + ?Sized> ByteSource for R {
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }
}

/// Adapts an iterator of body chunks into a [`ByteSource`].
///
/// This is the blocking counterpart of a body stream: each item is either a
/// chunk of bytes or the error that ended the stream.
///
/// # Examples
///
/// ```
/// use form_params::{ChunkSource, Map};
///
/// let chunks = vec!["--X\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n", "1\r\n--X--"];
/// let source = ChunkSource::new(chunks.into_iter().map(Ok::<_, std::io::Error>));
///
/// let mut params = Map::new();
/// form_params::parse_multipart("multipart/form-data; boundary=X", source, &mut params).unwrap();
/// assert_eq!(params.get("a").and_then(|v| v.as_str()), Some("1"));
/// ```
pub struct ChunkSource<I> {
    chunks: I,
    current: Bytes,
}

impl<I, O, E> ChunkSource<I>
where
    I: Iterator<Item = Result<O, E>>,
    O: Into<Bytes>,
    E: Into<BoxError>,
{
    pub fn new(chunks: I) -> Self {
        ChunkSource {
            chunks,
            current: Bytes::new(),
        }
    }
}

impl<I, O, E> Read for ChunkSource<I>
where
    I: Iterator<Item = Result<O, E>>,
    O: Into<Bytes>,
    E: Into<BoxError>,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while !self.current.has_remaining() {
            match self.chunks.next() {
                Some(Ok(chunk)) => self.current = chunk.into(),
                Some(Err(err)) => return Err(io::Error::new(io::ErrorKind::Other, err.into())),
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.current.remaining());
        self.current.copy_to_slice(&mut buf[..n]);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_source_spans_chunks() {
        let chunks = vec![Ok::<_, io::Error>("ab"), Ok(""), Ok("cde")];
        let mut source = ChunkSource::new(chunks.into_iter());

        let mut buf = [0u8; 4];
        assert_eq!(source.read_into(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ab");
        assert_eq!(source.read_into(&mut buf[..2]).unwrap(), 2);
        assert_eq!(&buf[..2], b"cd");
        assert_eq!(source.read_into(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'e');
        assert_eq!(source.read_into(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_chunk_source_error() {
        let chunks = vec![Ok("ab"), Err("connection reset")];
        let mut source = ChunkSource::new(chunks.into_iter());

        let mut buf = [0u8; 8];
        assert_eq!(source.read_into(&mut buf).unwrap(), 2);
        let err = source.read_into(&mut buf).unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn test_slice_is_a_byte_source() {
        let mut source: &[u8] = b"hello";
        let mut buf = [0u8; 3];
        assert_eq!(source.read_into(&mut buf).unwrap(), 3);
        assert_eq!(source.read_into(&mut buf).unwrap(), 2);
        assert_eq!(source.read_into(&mut buf).unwrap(), 0);
    }
}
