// Library exports so integration tests can use potholed modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod oracle;
pub mod posts;
pub mod routes;
pub mod severity;
pub mod state;
pub mod storage;
