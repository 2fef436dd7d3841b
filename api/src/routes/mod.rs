pub mod answer;
pub mod health;
pub mod ingest;
pub mod quality;
pub mod sources;
