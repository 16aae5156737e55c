pub mod pipeline;
pub mod source;

pub use pipeline::{load_items, run_batch, write_rows, BatchItem, BatchRow};
pub use source::GenerationSource;
