//! Byte-level text buffer: the storage and motion primitives everything else in the
//! workspace is built on. No Unicode segmentation, no multi-window layout -- see the
//! crate's Non-goals. A buffer is a sequence of raw bytes; a "character" is a byte.

pub mod buffer;
pub mod byte;
pub mod error;
pub mod marks;
pub mod motion;
pub mod region_stats;

pub use buffer::{Buffer, BufferId, DeleteResult, InsertResult, Side, WindowSize};
pub use error::RuntimeCheckFailure;
pub use marks::{MarkId, MarkTable, WeakMarkId};
pub use region_stats::RegionStats;
