//! Authenticated adapter for the external evaluation service.

mod client;
mod schema;
mod token;

pub use client::EvaluationClient;
pub use token::CredentialProvider;
