mod annotator;
mod chunk_divider;
mod segment_producer;

pub use annotator::{Annotator, AnnotatorError};
pub use chunk_divider::{ChunkDivider, Window};
pub use segment_producer::SegmentProducer;

pub use segment_protocol::{
    Segment, SegmentKind, CAPABILITIES_HEADER, CONTENT_TYPE_LPCM, TERMINATOR_HEADER,
};
