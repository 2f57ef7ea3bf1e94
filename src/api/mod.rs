//! Client for the PPLIP HTTP API
//!
//! `ApiClient` sends requests and renews the access token when the server
//! rejects it. The endpoint modules map each operation onto a verb and path.

pub mod attraction;
pub mod board;
mod client;
mod envelope;
mod error;
mod refresh;
pub mod review;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::ApiClient;
pub use error::ApiError;
pub use transport::ApiRequest;

#[cfg(test)]
pub use envelope::Envelope;
#[cfg(test)]
pub use transport::Method;
