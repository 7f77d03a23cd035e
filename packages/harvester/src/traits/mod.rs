//! Core trait abstractions.
//!
//! - [`transport::Transport`]: outbound HTTP
//! - [`store::KeyValueStore`], [`store::Dataset`]: storage collaborators

pub mod store;
pub mod transport;

pub use store::{Dataset, KeyValueStore};
pub use transport::{HttpRequest, HttpResponse, Transport};
