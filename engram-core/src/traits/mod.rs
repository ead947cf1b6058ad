pub mod pattern_sink;
pub mod write_policy;

pub use pattern_sink::IPatternSink;
pub use write_policy::{IWritePolicy, PolicyVerdict};
