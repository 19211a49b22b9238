//! deepcheck-media: deepfake analysis core. Frame extraction, model gateway,
//! result parsing, mock analysis, and the pipeline that ties them together.

pub mod error;
pub mod frames;
pub mod gemini;
pub mod mock;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod types;

pub use error::{AnalysisError, FrameError, ParseError};
pub use pipeline::{AnalysisPipeline, Analyzer};
