pub mod analytics;
pub mod audit;
pub mod domain;
pub mod error;
pub mod policy;
pub mod sensitive;
