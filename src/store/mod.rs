pub mod factory;
pub mod memory;
pub mod redis;
mod traits;


pub use self::factory::open_store;
pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;
pub use self::traits::*;
