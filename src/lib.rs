pub mod aggregate;
pub mod builder;
pub mod cli;
pub mod config;
pub mod enrich;
pub mod error;
pub mod ingest;
pub mod methods;
pub mod model;
pub mod parsers;
pub mod pipeline;
pub mod resolve;
pub mod scanner;
pub mod tree;
