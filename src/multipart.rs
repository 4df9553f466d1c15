use crate::buffer::{BodyScan, WorkBuffer};
use crate::constants;
use crate::helpers;
use crate::merge::merge_parameter;
use crate::parser::FormParser;
use crate::part::PartDescriptor;
use crate::source::ByteSource;
use crate::state::{CurrentPart, MultipartState, StreamingStage};
use crate::value::{Map, Value};
use http::HeaderMap;

/// Drives one `multipart/form-data` parse from a [`ByteSource`] into a
/// parameter map.
///
/// Stages run `SeekingBoundary -> ReadingTransportPadding -> ParsingHeaders ->
/// StreamingBody` and back to `SeekingBoundary` for every part, until the
/// final `--boundary--` moves the parse to `Done`.
pub(crate) struct Multipart<'a, S: ?Sized> {
    config: &'a FormParser,
    source: &'a mut S,
    params: &'a mut Map,
    state: MultipartState,
}

impl<'a, S: ByteSource + ?Sized> Multipart<'a, S> {
    pub fn new(config: &'a FormParser, boundary: &str, source: &'a mut S, params: &'a mut Map) -> Self {
        let mut boundary_bytes = constants::BOUNDARY_EXT.to_vec();
        boundary_bytes.extend_from_slice(boundary.as_bytes());

        let mut delimiter = constants::CRLF.to_vec();
        delimiter.extend_from_slice(&boundary_bytes);

        // The delimiter and the two bytes after it must always fit.
        let capacity = config.get_buffer_size().max(delimiter.len() + 2);

        let state = MultipartState {
            buffer: WorkBuffer::new(capacity, config.get_constraints().size_limit.whole_stream),
            boundary: boundary_bytes,
            delimiter,
            stage: StreamingStage::SeekingBoundary,
            next_part_idx: 0,
            curr_part: None,
        };

        Multipart {
            config,
            source,
            params,
            state,
        }
    }

    pub fn run(mut self) -> crate::Result<()> {
        self.state.buffer.refill(self.source, true)?;

        loop {
            match self.state.stage {
                StreamingStage::SeekingBoundary => self.seek_boundary()?,
                StreamingStage::ReadingTransportPadding => self.read_transport_padding()?,
                StreamingStage::ParsingHeaders => self.parse_headers()?,
                StreamingStage::StreamingBody => self.stream_body()?,
                StreamingStage::Done => return Ok(()),
            }
        }
    }

    /// Reads more bytes, returning `false` once nothing more arrives.
    fn pull(&mut self) -> crate::Result<bool> {
        if self.state.buffer.is_eof() {
            return Ok(false);
        }

        let read = self.state.buffer.refill(self.source, false)?;
        Ok(read > 0)
    }

    fn seek_boundary(&mut self) -> crate::Result<()> {
        let boundary_len = self.state.boundary.len();

        loop {
            let buffer = &mut self.state.buffer;

            match buffer.find(&self.state.boundary) {
                Some(idx) if idx + boundary_len + constants::BOUNDARY_EXT.len() <= buffer.limit() => {
                    let after = idx + boundary_len;

                    if buffer.slice(after, after + constants::BOUNDARY_EXT.len()) == constants::BOUNDARY_EXT {
                        log::debug!("final boundary reached after {} parts", self.state.next_part_idx);
                        self.state.stage = StreamingStage::Done;
                    } else {
                        buffer.set_position(after);
                        self.state.stage = StreamingStage::ReadingTransportPadding;
                    }

                    return Ok(());
                }
                // The two bytes telling a final boundary apart are not here yet.
                Some(idx) => buffer.set_position(idx),
                None => {
                    // Keep a tail long enough to hold the start of a boundary.
                    let keep = (boundary_len + 1).min(buffer.remaining());
                    buffer.set_position(buffer.limit() - keep);
                }
            }

            if !self.pull()? {
                return Err(crate::Error::IncompleteStream);
            }
        }
    }

    fn read_transport_padding(&mut self) -> crate::Result<()> {
        loop {
            let buffer = &mut self.state.buffer;

            let padding = buffer
                .unconsumed()
                .iter()
                .take_while(|&&b| b == constants::SPACE || b == constants::TAB)
                .count();
            buffer.advance(padding);

            match buffer.unconsumed() {
                [] => {}
                [constants::CR] => {}
                [constants::CR, b'\n', ..] => {
                    // The line break stays: the header search starts on it.
                    self.state.stage = StreamingStage::ParsingHeaders;
                    return Ok(());
                }
                _ => return Err(crate::Error::MalformedBoundary),
            }

            if !self.pull()? {
                return Err(crate::Error::IncompleteStream);
            }
        }
    }

    fn parse_headers(&mut self) -> crate::Result<()> {
        let max_header_size = self.config.get_max_header_size();

        loop {
            let buffer = &mut self.state.buffer;

            if let Some(idx) = buffer.find(constants::CRLF_CRLF) {
                let start = buffer.position() + constants::CRLF.len();
                if idx.saturating_sub(start) > max_header_size {
                    return Err(crate::Error::HeadersTooLarge { limit: max_header_size });
                }

                let end = idx + constants::CRLF.len();
                let headers = helpers::parse_header_block(buffer.slice(start, end.max(start)))?;

                buffer.set_position(idx + constants::CRLF_CRLF.len());
                self.begin_part(headers)?;
                self.state.stage = StreamingStage::StreamingBody;
                return Ok(());
            }

            if buffer.is_eof() {
                return Err(crate::Error::IncompleteHeaders);
            }

            buffer.compact();
            if buffer.is_full() {
                let capacity = buffer.capacity();
                if capacity >= max_header_size {
                    return Err(crate::Error::HeadersTooLarge { limit: max_header_size });
                }
                buffer.grow((capacity * 2).min(max_header_size));
            }

            if !self.pull()? {
                return Err(crate::Error::IncompleteHeaders);
            }
        }
    }

    fn begin_part(&mut self, headers: HeaderMap) -> crate::Result<()> {
        let config = self.config;
        let encoding = config.get_encoding();
        let constraints = config.get_constraints();

        let index = self.state.next_part_idx;
        self.state.next_part_idx += 1;

        let descriptor = PartDescriptor::new(headers, index, encoding);

        if !constraints.is_it_allowed(descriptor.name()) {
            return Err(crate::Error::UnknownField {
                field_name: descriptor.name().map(str::to_owned),
            });
        }

        let sink = match descriptor.name() {
            Some(_) => Some(config.create_sink(&descriptor)?),
            None => {
                log::debug!("part {} has no name, discarding its body", index);
                None
            }
        };

        log::debug!(
            "reading part {}: name={:?} filename={:?}",
            index,
            descriptor.name(),
            descriptor.file_name()
        );

        self.state.curr_part = Some(CurrentPart {
            size_limit: constraints.size_limit.limit_for(descriptor.name()),
            size_counter: 0,
            descriptor,
            sink,
        });

        Ok(())
    }

    fn stream_body(&mut self) -> crate::Result<()> {
        loop {
            match self.state.buffer.scan_body(&self.state.delimiter) {
                BodyScan::Delimiter(idx) => {
                    write_body(&mut self.state.buffer, self.state.curr_part.as_mut(), idx)?;
                    // Step over the CRLF so the boundary search starts on `--`.
                    self.state.buffer.advance(constants::CRLF.len());
                    self.finish_part()?;
                    self.state.stage = StreamingStage::SeekingBoundary;
                    return Ok(());
                }
                BodyScan::Partial(end) => {
                    write_body(&mut self.state.buffer, self.state.curr_part.as_mut(), end)?;

                    if !self.pull()? {
                        return Err(crate::Error::IncompleteStream);
                    }
                }
            }
        }
    }

    fn finish_part(&mut self) -> crate::Result<()> {
        let CurrentPart { descriptor, sink, .. } = match self.state.curr_part.take() {
            Some(part) => part,
            None => return Ok(()),
        };

        let (name, sink) = match (descriptor.name(), sink) {
            (Some(name), Some(sink)) => (name, sink),
            _ => return Ok(()),
        };

        let value = sink.close()?;

        let value = if descriptor.is_file() {
            Value::Object(file_object(&descriptor, value))
        } else {
            value
        };

        merge_parameter(self.params, name, value);
        log::debug!("merged part {} into `{}`", descriptor.index(), name);

        Ok(())
    }
}

/// Hands the body bytes up to `end` to the part's sink and consumes them.
fn write_body(buffer: &mut WorkBuffer, part: Option<&mut CurrentPart>, end: usize) -> crate::Result<()> {
    let start = buffer.position();
    if end <= start {
        return Ok(());
    }

    if let Some(part) = part {
        part.size_counter += (end - start) as u64;
        if part.size_counter > part.size_limit {
            return Err(crate::Error::FieldSizeExceeded {
                limit: part.size_limit,
                field_name: part.descriptor.name().map(str::to_owned),
            });
        }

        if let Some(sink) = part.sink.as_mut() {
            sink.write(buffer.slice(start, end))?;
        }
    }

    buffer.set_position(end);
    Ok(())
}

fn file_object(descriptor: &PartDescriptor, value: Value) -> Map {
    let mut file = Map::new();

    if let Some(name) = descriptor.name() {
        file.insert(constants::NAME_KEY, Value::from(name));
    }
    if let Some(file_name) = descriptor.file_name() {
        file.insert(constants::FILENAME_KEY, Value::from(file_name));
    }
    if let Some(content_type) = descriptor.content_type() {
        file.insert(constants::CONTENT_TYPE_KEY, Value::from(content_type));
    }
    file.insert(constants::VALUE_KEY, value);

    file
}
