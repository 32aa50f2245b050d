pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Daemon, Dataset, Health, Init, Peers, Profile, Query, Version};
