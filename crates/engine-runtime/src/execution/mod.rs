pub mod executor;
pub mod metadata;
pub mod replicate;
pub mod shard;
pub mod staging;
pub mod stats;
