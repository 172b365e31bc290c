pub mod digest;
pub mod key_lock;
pub mod logging;

pub use digest::content_hash;
pub use key_lock::KeyLocks;
pub use logging::init_tracing;
