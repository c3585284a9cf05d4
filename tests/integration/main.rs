//! End-to-end pipeline tests: universe -> scan -> pack -> report -> publish.
//!
//! Everything runs against in-memory fakes under paused Tokio time, so
//! the pacing delays cost nothing.

mod mock_source;
mod scan_pipeline;
