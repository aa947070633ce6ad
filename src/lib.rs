// src/lib.rs

pub mod config;
pub mod domain;
pub mod error;
pub mod extractor;
pub mod lifecycle;
pub mod service;
pub mod test_utils;

pub use config::EngineConfig;
pub use domain::models::AnalysisResult;
pub use error::{AppError, Result};
pub use service::SiteAnalyzer;
