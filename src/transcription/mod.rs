pub mod client;

pub use client::TranscriptionClient;
