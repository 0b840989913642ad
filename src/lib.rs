//! Question answering over a fixed, pre-indexed encyclopedia corpus.
//!
//! A question is embedded, matched against the corpus through a vector-store RPC,
//! turned into a cited context block and answered by a generative model that is
//! told to use nothing but that context.

pub mod client;
pub mod core;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
