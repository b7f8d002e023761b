//! The contract between the web form and whatever produces the answer.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use async_trait::async_trait;
use thiserror::Error;

/// The inputs a pipeline run receives.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KickoffInputs {
    pub symptoms: String,
    pub medical_history: String,
}

impl KickoffInputs {
    /// The inputs keyed by the names task templates use.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("symptoms".to_owned(), self.symptoms.clone()),
            ("medical_history".to_owned(), self.medical_history.clone()),
        ])
    }
}

/// Whatever a pipeline hands back.
///
/// Nothing about the shape is guaranteed, so every variant can be turned
/// into text by [`normalize`](crate::report::normalize).
pub enum PipelineResult {
    /// Plain text.
    Text(String),
    /// An ordered list of parts, one per line.
    Sequence(Vec<String>),
    /// A fixed group of parts, joined by spaces.
    Composite(Vec<String>),
    /// Anything else that can display itself.
    Other(Box<dyn Display + Send + Sync>),
}

impl fmt::Debug for PipelineResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Sequence(parts) => {
                f.debug_tuple("Sequence").field(parts).finish()
            }
            Self::Composite(parts) => {
                f.debug_tuple("Composite").field(parts).finish()
            }
            Self::Other(value) => {
                f.debug_tuple("Other").field(&value.to_string()).finish()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("crew run failed: {0}")]
    Crew(#[from] carecrew_core::Error),
}

/// Turns patient inputs into recommendations.
///
/// A run is attempted once; failures are reported, never retried.
#[async_trait]
pub trait Pipeline: Send + Sync + 'static {
    async fn kickoff(
        &self,
        inputs: &KickoffInputs,
    ) -> Result<PipelineResult, PipelineError>;
}
