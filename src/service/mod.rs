pub mod advisor;
pub mod analyzer;
pub mod classifier;
pub mod gemini;
pub mod http;
pub mod keywords;
pub mod scoring;
pub mod telemetry;

pub use advisor::{AdvisoryInput, AdvisorySynthesizer};
pub use analyzer::SiteAnalyzer;
pub use gemini::{GeminiClient, GenerativeProvider};
pub use keywords::KeywordSuggester;
pub use telemetry::{LatencyProbe, PerformanceAdapter, PerformanceProvider};
