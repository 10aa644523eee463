pub mod allocator;
pub mod api;
pub mod assets;
pub mod chunk;
pub mod error;
pub mod memory;
pub mod model;
pub mod records;
pub mod time;
pub mod value;

pub use allocator::{
    CyclicAllocator, DEFAULT_OWNER_USER_IDS, DEFAULT_OWNER_VIDEO_IDS, DrawnKey, KeyRange,
};
pub use api::*;
pub use assets::AssetResolver;
pub use chunk::ChunkRunner;
pub use error::{SeedError, SeedResult};
pub use memory::MemoryStore;
pub use model::*;
pub use records::*;
pub use crate::time::Timestamp;
pub use value::Patch;
