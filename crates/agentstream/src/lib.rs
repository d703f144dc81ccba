//! HTTP streaming client for the remote agent service.
//!
//! Requests are posted to `<base_url>/<strategy>/stream`; the response body
//! is a sequence of `data: <json>` lines folded into the run's transcript.

pub mod client;
pub mod credentials;
pub mod decoder;
pub mod folder;

pub use client::{ClientConfig, HttpStreamingClient};
pub use credentials::{default_credentials_path, load_token};
pub use decoder::EventLineDecoder;
pub use folder::{Fold, StreamFolder};
