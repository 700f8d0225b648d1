//! Increment a named counter held in a key-value store.
//!
//! [IncrementHandler] takes the request produced by an HTTP trigger, checks
//! that it names a counter and carries an integer `incrementBy`, applies the
//! increment through the storage engine's atomic update and answers with the
//! new count. Every failure is turned into a JSON error response.

pub mod config;
pub mod error;
pub mod handler;
pub mod store;
pub mod wire;

pub use config::{HandlerConfig, MessageStyle};
pub use error::{ErrorKind, HandlerError, StoreError};
pub use handler::{coerce_integer, Handler, HandlerResult, IncrementCommand, IncrementHandler};
pub use store::{Key, MemoryStore, StorageEngine, Table, UpdateOutput};
pub use wire::{format_error_response, ErrorBody, Request, Response, SuccessBody};
