pub mod analyze;
pub mod model;

// Re-export commonly used types/functions for consumers
pub use analyze::{analyze_entries, Analysis, Block, Edge, EdgeKind, Report};
pub use model::{is_mapped, load_raw_bin, read_u32, read_u8, Image, Segment};
