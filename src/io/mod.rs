pub mod output;
pub mod walker;

pub use output::{write_units, WriteSummary, GENERATED_MARKER};
pub use walker::{find_source_files, FileWalker};
