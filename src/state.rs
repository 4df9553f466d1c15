use crate::buffer::WorkBuffer;
use crate::part::PartDescriptor;
use crate::sink::PartSink;

pub(crate) struct MultipartState {
    pub(crate) buffer: WorkBuffer,
    /// `--` followed by the boundary token.
    pub(crate) boundary: Vec<u8>,
    /// CRLF followed by `boundary`, which ends every part body.
    pub(crate) delimiter: Vec<u8>,
    pub(crate) stage: StreamingStage,
    pub(crate) next_part_idx: usize,
    pub(crate) curr_part: Option<CurrentPart>,
}

pub(crate) struct CurrentPart {
    pub(crate) descriptor: PartDescriptor,
    /// `None` for parts without a name, whose body is discarded.
    pub(crate) sink: Option<Box<dyn PartSink>>,
    pub(crate) size_limit: u64,
    pub(crate) size_counter: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreamingStage {
    SeekingBoundary,
    ReadingTransportPadding,
    ParsingHeaders,
    StreamingBody,
    Done,
}
