//! Object storage for published videos: the [`Storage`] trait, an S3
//! implementation and a local-filesystem one, plus key derivation.
//!
//! # Key layout
//!
//! Published videos live under `{class_dir}/{random}.{ext}` where `class_dir`
//! is the aspect class directory (`landscape`, `portrait` or `other`),
//! `random` is 32 random bytes hex-encoded and `ext` is the media subtype.
//! Keys must not contain `..` or a leading `/`. Key derivation is centralized
//! in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Everything callers need, re-exported at the crate root.
pub use clipdock_core::StorageBackend;
pub use factory::create_storage;
pub use keys::derive_storage_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
