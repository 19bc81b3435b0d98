pub mod config;
pub mod profiler;
pub mod writing;

// Re-export specific items for convenient access
pub use config::TracerConfig;
pub use profiler::{ChromeTracer, Tracer, TracerKind, TracerRegistry};
pub use writing::{FileWriter, MemoryWriter, Writer};
