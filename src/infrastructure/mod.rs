//! Adapters implementing the domain ports: registration tables and the
//! payment provider.

pub mod csv_file;
pub mod http;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod stripe;
pub mod table_service;
