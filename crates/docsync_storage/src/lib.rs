//! # docsync storage
//!
//! Byte-store backends for docsync.
//!
//! Backends are **opaque byte stores**: they append and read bytes and know
//! nothing about revisions, attachments or documents. The attachment
//! pipeline in `docsync_core` writes incoming attachment content into a
//! backend while it is staged, and the durable store commits it into
//! another one.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - tests and memory-only staging
//! - [`TempFileBackend`] - a file that is deleted when the backend is dropped
//!
//! ## Example
//!
//! ```rust
//! use docsync_storage::{StorageBackend, InMemoryBackend};
//! use std::io::Read;
//!
//! let mut backend = InMemoryBackend::new();
//! backend.append(b"hello ").unwrap();
//! backend.append(b"world").unwrap();
//!
//! let mut text = String::new();
//! backend.reader().read_to_string(&mut text).unwrap();
//! assert_eq!(text, "hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;
mod temp;

pub use backend::{BackendReader, StorageBackend, DEFAULT_CHUNK_SIZE};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryBackend;
pub use temp::TempFileBackend;
