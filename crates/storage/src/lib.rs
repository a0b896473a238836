//! Storage abstractions for the aerosol gridding services.
//!
//! Provides an S3 client for reading Level 2 granules from the archive
//! bucket with temporary credentials.

pub mod object_store;

pub use self::object_store::{ObjectStorage, ObjectStorageConfig};
