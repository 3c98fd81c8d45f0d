//! nidx - a concurrent, persistent names index
//!
//! Resolves parsed scientific names (name, rank, authorship) to stable
//! integer identities, inserting unseen names on demand.
//!
//! - [`model`]: names, index records and match results
//! - [`normalizer`]: ASCII folding and the coarse lookup key
//! - [`authorship`]: fuzzy author comparison
//! - [`storage`]: checksummed record files shared by journal and mirror
//! - [`store`]: in-memory and memory-mapped index stores
//! - [`mirror`]: the authoritative durable copy of all names
//! - [`index`]: matching and insert orchestration
//! - [`matching`]: batch pipeline over datasets, sectors and the archive

pub mod authorship;
pub mod cli;
pub mod config;
pub mod index;
pub mod matching;
pub mod mirror;
pub mod model;
pub mod normalizer;
pub mod storage;
pub mod store;
