//! Communication with the GreenChoice question service
//!
//! `client` owns the HTTP side (`POST /question`, `GET /`) behind the
//! [`Transport`] trait; `normalize` turns whatever came back into a
//! canonical [`Reply`].

pub mod client;
pub mod normalize;

pub use client::{HttpTransport, QuestionRequest, RawResponse, Transport};
pub use normalize::{normalize, Reply};

#[cfg(test)]
pub use client::MockTransport;
