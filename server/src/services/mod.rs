//! Orchestration services behind the HTTP handlers and the consumer
//! runtime. Each module owns one workload: admin ingest, passenger search,
//! booking, and journey precomputation.

pub mod booking;
pub mod ingest;
pub mod precompute;
pub mod search;
