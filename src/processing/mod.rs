//! Pair selection, ranking, metadata parsing and the batch pipeline

pub mod pairing;
pub mod ranking;
pub mod parser;
pub mod telemetry;
pub mod pipeline;

pub use pairing::{ImagePair, PairSelector};
pub use ranking::{reciprocal_rank_fusion, RankFuser, RankedPair};
pub use pipeline::{GeolocationPipeline, GeolocationReport};
pub use telemetry::{TagMapTelemetryReader, TelemetryReader};
