//! Solution verification
//!
//! Traces user code against the session's problem via the reasoning
//! capability. Always produces a well-formed report: upstream failures
//! degrade to an `error`-status verdict rather than an API error.

use serde::{Deserialize, Serialize};
use tracing::warn;

use s2s_common::models::ProblemMeta;

use crate::prompts;
use crate::services::Reasoner;

const MAX_DESCRIPTION_CHARS: usize = 2000;

/// One traced test case
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyCase {
    #[serde(default)]
    pub passed: bool,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub expected: String,
    #[serde(default)]
    pub actual: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Verification verdict
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyReport {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub results: Vec<VerifyCase>,
    #[serde(default)]
    pub feedback: String,
}

impl VerifyReport {
    fn error(summary: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            summary: summary.into(),
            results: Vec::new(),
            feedback: feedback.into(),
        }
    }
}

/// Verify a code solution against its problem.
pub async fn verify_code(
    reasoner: &dyn Reasoner,
    code: &str,
    language: &str,
    problem: &ProblemMeta,
    problem_title: &str,
) -> VerifyReport {
    if code.trim().is_empty() {
        return VerifyReport::error("No code provided.", "Write your solution code and try again.");
    }

    let title = if !problem_title.is_empty() {
        problem_title
    } else if !problem.title.is_empty() {
        &problem.title
    } else {
        "Unknown"
    };

    let description: String = problem.description.chars().take(MAX_DESCRIPTION_CHARS).collect();
    let examples = prompts::format_examples(&problem.examples);

    let user_msg = format!(
        "Problem: {title}\n\
         Description: {description}\n\
         {examples}\n\
         \n\
         Language: {language}\n\
         Code:\n\
         ```\n\
         {code}\n\
         ```\n\
         \n\
         Verify this solution. Trace through each test case carefully.",
    );

    match reasoner.reason(prompts::VERIFY_PROMPT, &user_msg, None).await {
        Ok(raw) => match serde_json::from_str::<VerifyReport>(&raw) {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "malformed verification reply");
                degraded_report(&e.to_string())
            }
        },
        Err(e) => {
            warn!(error = %e, "verification call failed");
            degraded_report(&e.to_string())
        }
    }
}

fn degraded_report(error: &str) -> VerifyReport {
    let brief: String = error.chars().take(100).collect();
    VerifyReport::error(
        format!("Verification failed: {}", brief),
        "Try again in a moment.",
    )
}
