pub mod dimensions;
pub mod normalize;
pub mod orchestrator;

pub use dimensions::Dimension;
pub use normalize::{normalize, DimensionReport, SpecialistOutput};
pub use orchestrator::{locate_document, mock_verdict, Evaluation, Orchestrator};
