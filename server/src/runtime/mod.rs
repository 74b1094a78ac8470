//! Long-running background tasks: the precomputer worker pool, the outbox
//! publisher, and the hold janitor. All of them stop on the shared
//! shutdown broadcast.

pub mod consumer;
pub mod janitor;
pub mod outbox;

pub use consumer::spawn_precompute_workers;
pub use janitor::spawn_hold_janitor;
pub use outbox::spawn_outbox_publisher;
