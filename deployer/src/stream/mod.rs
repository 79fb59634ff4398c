//! Deployment log stream decoding
//!
//! Raw response chunks flow through [`decoder::ChunkDecoder`],
//! [`framer::EventFramer`] and [`classifier::Classifier`]; [`pipeline::LogPipeline`]
//! wires the three together for one session.

pub mod classifier;
pub mod decoder;
pub mod framer;
pub mod pipeline;
