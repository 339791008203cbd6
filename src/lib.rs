//! HomeLLM: advocacy email drafting and document analysis.
//!
//! The server side is a stateless proxy ([`routes`]) in front of the
//! generation API ([`anthropic`]). The client side ([`orchestrator`]) builds
//! prompts, encodes attachments, calls the proxy and parses the results.

pub mod anthropic;
pub mod client;
pub mod config;
pub mod encoder;
pub mod export;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod regulations;
pub mod retry;
pub mod routes;
pub mod store;
pub mod urgency;
pub mod validation;

#[cfg(test)]
mod tests;
