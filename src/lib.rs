//! Blocking and async helpers over an object storage service: listing,
//! copying, moving and deleting objects, and transferring single files or
//! whole folders between the local filesystem and a bucket.

pub mod adapters;
pub mod client;
pub mod config;
pub mod logging;
pub mod model;
pub mod util;

pub use adapters::ObjectBackend;
pub use client::ObjectStoreClient;
pub use model::error::{BackendError, Error, Result};
pub use model::object::Operation;
pub use util::object::Provider;
