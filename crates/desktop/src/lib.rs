//! `wardrobe-desktop`
//!
//! **Responsibility:** local wardrobe client with durable storage.
//!
//! This crate provides:
//! - Key/value storage backends (SQLite file, in-memory) with versioned writes
//! - The persistence adapter (load at startup, write-through on change)
//! - Upload decoding into storable image payloads
//! - The `WardrobeApp` service and the `wardrobe` command-line front end

pub mod app;
pub mod cli;
pub mod config;
pub mod decode;
pub mod persistence;
pub mod store;

pub use app::{AddItemsReport, WardrobeApp};
pub use config::WardrobeConfig;
pub use decode::{DataUrlDecoder, DecodeError, FileDecoder, UploadFile};
pub use persistence::{Persistence, PersistenceHealth, FITS_KEY, INVENTORY_KEY};
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreError};
