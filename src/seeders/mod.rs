//! Demo data for a fresh catalog, run with `catalog-admin seed`

mod catalog;

pub use catalog::{seed_catalog, SeedSummary};
