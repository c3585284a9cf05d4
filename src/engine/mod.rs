//! Core engine: the scan -> classify -> pack -> publish cycle.

pub mod indicators;
pub mod classifier;
pub mod scanner;
pub mod packer;
pub mod report;
pub mod cycle;
pub mod scheduler;
