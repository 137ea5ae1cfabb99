//! Small concurrency and unit-conversion primitives shared by every
//! ingestion crate. Nothing here is business logic — it is the re-usable
//! plumbing §5/§9 call out: a cancellable-sleep helper, a process-global
//! address-lock registry, a "not found" retry-with-backoff loop, and the
//! hard-coded decimal conventions §4.2/§9 say must be preserved verbatim.

pub mod cancel;
pub mod decimals;
pub mod lock_registry;
pub mod retry;

pub use cancel::sleep_cancellable;
pub use lock_registry::AddressLockRegistry;
pub use retry::{is_not_found, retry_with_backoff, BackoffConfig};
