pub mod config;
pub mod enrich;
pub mod errors;
pub mod fetch;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod xmltv;
