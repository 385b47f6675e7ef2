// Library for tests to access modules

pub mod config;
pub mod host_reader;
pub mod models;
pub mod rates;
pub mod routes;
pub mod sampler;
pub mod summary;
pub mod usage_repo;
pub mod window;
