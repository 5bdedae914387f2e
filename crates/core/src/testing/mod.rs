//! Mock collaborators for testing.

mod mock_extractor;
mod mock_transport;

pub use mock_extractor::MockExtractor;
pub use mock_transport::{MockTransport, RecordedChunk, RecordedPublish};
