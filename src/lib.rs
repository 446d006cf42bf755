pub use error::Error;
pub mod cache;
pub mod command;
pub mod conf;
pub mod containment;
pub mod db;
pub mod error;
pub mod overpass;
pub mod provider;
pub mod rest;
pub mod zone;

pub type Result<T, E = Error> = std::result::Result<T, E>;
