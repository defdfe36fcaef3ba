//! Tiered problem metadata resolution
//!
//! Resolution order for a problem number: structured GraphQL lookup,
//! then the unstructured fallback API (when a slug is known), then the
//! persistent cache. Freeform problem text bypasses all tiers and wraps
//! the text verbatim. Each network tier has its own timeout and treats
//! transport errors, non-2xx responses, and missing fields as tier
//! failure, falling through to the next tier.

use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{debug, warn};

use s2s_common::models::ProblemMeta;

use crate::config::CoachConfig;
use crate::db::problem_cache;
use crate::services::slug_table;

const GRAPHQL_TIMEOUT: Duration = Duration::from_secs(8);
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(5);

const FIND_SLUG_QUERY: &str = r#"
query problemsetQuestionList($filters: QuestionListFilterInput) {
  problemsetQuestionList: questionList(categorySlug: "", limit: 5, skip: 0, filters: $filters) {
    questions: data {
      frontendQuestionId: questionFrontendId
      title
      titleSlug
      difficulty
      topicTags { name }
    }
  }
}"#;

const QUESTION_DETAIL_QUERY: &str = r#"
query questionData($titleSlug: String!) {
  question(titleSlug: $titleSlug) {
    questionFrontendId
    title
    titleSlug
    content
    difficulty
    topicTags { name }
    exampleTestcaseList
  }
}"#;

#[derive(Debug, Deserialize)]
struct DetailResponse {
    data: Option<DetailData>,
}

#[derive(Debug, Deserialize)]
struct DetailData {
    question: Option<QuestionDetail>,
}

#[derive(Debug, Deserialize)]
struct QuestionDetail {
    #[serde(default)]
    title: String,
    content: Option<String>,
    #[serde(default)]
    difficulty: String,
    #[serde(rename = "topicTags", default)]
    topic_tags: Vec<TagName>,
    #[serde(rename = "exampleTestcaseList", default)]
    example_testcase_list: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TagName {
    name: String,
}

/// Tiered, cached problem metadata resolver
pub struct ProblemResolver {
    http: reqwest::Client,
    db: SqlitePool,
    graphql_url: String,
    fallback_url: String,
}

impl ProblemResolver {
    pub fn new(db: SqlitePool, config: &CoachConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("Mozilla/5.0")
            .build()
            .unwrap_or_default();

        Self {
            http,
            db,
            graphql_url: config.leetcode_graphql_url.clone(),
            fallback_url: config.problem_api_url.clone(),
        }
    }

    /// Resolve problem metadata from an external id and/or freeform text.
    ///
    /// Freeform text wins: it is wrapped verbatim with no network call
    /// and no cache write. With neither input (or an id that normalizes
    /// to nothing), resolution yields `None`.
    pub async fn resolve(
        &self,
        lc_id: Option<&str>,
        problem_text: Option<&str>,
    ) -> Option<ProblemMeta> {
        if let Some(text) = problem_text.filter(|t| !t.trim().is_empty()) {
            return Some(ProblemMeta {
                title: "Custom Problem".to_string(),
                description: text.to_string(),
                ..Default::default()
            });
        }

        let lc_num = normalize_lc_id(lc_id?)?;

        let slug = self.resolve_slug(&lc_num).await;

        if let Some(slug) = &slug {
            // Tier 1: structured detail lookup
            if let Some(problem) = self.fetch_details(slug).await {
                self.cache_put(&lc_num, &problem).await;
                return Some(problem);
            }

            // Tier 2: unstructured fallback lookup
            if let Some(problem) = self.fetch_fallback(slug).await {
                self.cache_put(&lc_num, &problem).await;
                return Some(problem);
            }
        }

        // Tier 3: persistent cache
        match problem_cache::get(&self.db, &lc_num).await {
            Ok(found) => found,
            Err(e) => {
                warn!(lc_num = %lc_num, error = %e, "problem cache lookup failed");
                None
            }
        }
    }

    /// Resolve the stable slug for a problem number: static table first,
    /// then a keyword search against the structured endpoint.
    async fn resolve_slug(&self, lc_num: &str) -> Option<String> {
        if let Some(slug) = lc_num.parse::<u32>().ok().and_then(slug_table::slug_for) {
            return Some(slug.to_string());
        }

        let body = json!({
            "query": FIND_SLUG_QUERY,
            "variables": {"filters": {"searchKeywords": lc_num}},
        });

        let response = self
            .http
            .post(&self.graphql_url)
            .header("Referer", "https://leetcode.com")
            .timeout(GRAPHQL_TIMEOUT)
            .json(&body)
            .send()
            .await;

        let value: Value = match response {
            Ok(resp) if resp.status().is_success() => resp.json().await.ok()?,
            Ok(resp) => {
                debug!(status = %resp.status(), "slug search returned non-success");
                return None;
            }
            Err(e) => {
                debug!(error = %e, "slug search request failed");
                return None;
            }
        };

        let questions = value
            .pointer("/data/problemsetQuestionList/questions")?
            .as_array()?;

        // Prefer an exact id match, else take the first result
        for q in questions {
            let id = q.get("frontendQuestionId");
            let matches = match id {
                Some(Value::String(s)) => s == lc_num,
                Some(Value::Number(n)) => n.to_string() == lc_num,
                _ => false,
            };
            if matches {
                return q.get("titleSlug")?.as_str().map(str::to_string);
            }
        }

        questions
            .first()
            .and_then(|q| q.get("titleSlug"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Tier 1: full details from the structured endpoint.
    /// Requires non-empty content to count as success.
    async fn fetch_details(&self, slug: &str) -> Option<ProblemMeta> {
        let body = json!({
            "query": QUESTION_DETAIL_QUERY,
            "variables": {"titleSlug": slug},
        });

        let response = self
            .http
            .post(&self.graphql_url)
            .header("Referer", "https://leetcode.com")
            .timeout(GRAPHQL_TIMEOUT)
            .json(&body)
            .send()
            .await;

        let parsed: DetailResponse = match response {
            Ok(resp) if resp.status().is_success() => resp.json().await.ok()?,
            Ok(resp) => {
                debug!(status = %resp.status(), slug = %slug, "detail fetch returned non-success");
                return None;
            }
            Err(e) => {
                debug!(error = %e, slug = %slug, "detail fetch request failed");
                return None;
            }
        };

        let question = parsed.data?.question?;
        let content = question.content.filter(|c| !c.is_empty())?;

        Some(ProblemMeta {
            title: question.title,
            description: content,
            difficulty: question.difficulty,
            constraints: Vec::new(),
            examples: question.example_testcase_list,
            topic_tags: question.topic_tags.into_iter().map(|t| t.name).collect(),
        })
    }

    /// Tier 2: unstructured fallback lookup by slug
    async fn fetch_fallback(&self, slug: &str) -> Option<ProblemMeta> {
        let url = format!("{}/select", self.fallback_url);

        let response = self
            .http
            .get(&url)
            .query(&[("titleSlug", slug)])
            .timeout(FALLBACK_TIMEOUT)
            .send()
            .await;

        let value: Value = match response {
            Ok(resp) if resp.status().is_success() => resp.json().await.ok()?,
            _ => return None,
        };

        let has_content = value
            .get("questionTitle")
            .or_else(|| value.get("content"))
            .and_then(Value::as_str)
            .map(|s| !s.is_empty())
            .unwrap_or(false);
        if !has_content {
            return None;
        }

        Some(normalize_raw(&value))
    }

    async fn cache_put(&self, lc_num: &str, problem: &ProblemMeta) {
        if let Err(e) = problem_cache::put(&self.db, lc_num, problem).await {
            warn!(lc_num = %lc_num, error = %e, "problem cache write failed");
        }
    }
}

/// Normalize an external problem id: strip whitespace and leading
/// zeros. An id that normalizes to nothing resolves to nothing.
fn normalize_lc_id(lc_id: &str) -> Option<String> {
    let normalized = lc_id.trim().trim_start_matches('0');
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

/// Normalize a foreign-shaped record (fallback API, legacy cache
/// entries) into the common metadata schema.
pub(crate) fn normalize_raw(raw: &Value) -> ProblemMeta {
    let text = |keys: &[&str]| -> String {
        keys.iter()
            .filter_map(|k| raw.get(k))
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string()
    };

    let list = |keys: &[&str]| -> Vec<Value> {
        keys.iter()
            .filter_map(|k| raw.get(k))
            .filter_map(Value::as_array)
            .next()
            .cloned()
            .unwrap_or_default()
    };

    let topic_tags = list(&["topicTags"])
        .iter()
        .map(|t| match t {
            Value::Object(obj) => obj
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            other => other.as_str().unwrap_or_default().to_string(),
        })
        .collect();

    ProblemMeta {
        title: text(&["questionTitle", "title"]),
        description: text(&["content", "description"]),
        difficulty: text(&["difficulty"]),
        constraints: list(&["constraints"])
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        examples: list(&["examples", "exampleTestcases"]),
        topic_tags,
    }
}
