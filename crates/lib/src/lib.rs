//! replystat core library: chat history ingestion and chatbot response-time
//! analysis, used by the CLI.

pub mod analysis;
pub mod config;
pub mod filter;
pub mod init;
pub mod normalize;
pub mod overview;
pub mod pairing;
pub mod sources;
pub mod stats;
pub mod workhours;
