//! Wire models for the content-pipeline backend.
//!
//! This module defines the data structures exchanged with the backend REST API:
//! - [`NewsItem`]: A scraped news entry shown in the news panel
//! - [`Article`]: An LLM-drafted article with its cover and figure prompts
//! - [`Draft`]: A read-only projection of a draft staged on the WeChat platform
//! - [`BackendConfig`]: The configuration object round-tripped by the config panel
//! - Request bodies and the small outcome structs returned by mutating endpoints
//!
//! Every field the backend may omit carries `#[serde(default)]` so that a
//! sparse payload never fails to decode.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scraped news entry.
///
/// Only `id` and `title` are guaranteed; everything else depends on the
/// scraper that produced the item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Backend-assigned identifier, stable across list reloads.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Short abstract scraped alongside the headline.
    #[serde(default)]
    pub summary: String,
    /// Name of the site the item came from (e.g. `AIBase`).
    #[serde(default)]
    pub source: String,
    /// Link to the original story.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Publication time as reported by the source, free-form.
    #[serde(default)]
    pub published_at: Option<String>,
    /// View counter when the source exposes one.
    #[serde(default)]
    pub views: Option<u64>,
}

/// Body of `GET /api/news/list`.
#[derive(Debug, Default, Deserialize)]
pub struct NewsList {
    #[serde(default)]
    pub items: Vec<NewsItem>,
    #[serde(default)]
    pub total: usize,
}

/// Which site(s) a scrape should hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeSource {
    Aibase,
    Aibot,
    All,
}

impl fmt::Display for ScrapeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScrapeSource::Aibase => "aibase",
            ScrapeSource::Aibot => "aibot",
            ScrapeSource::All => "all",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize)]
pub struct ScrapeRequest {
    pub source: ScrapeSource,
    pub max_count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScrapeOutcome {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub news_count: usize,
}

/// Lifecycle of an article.
///
/// Unknown values coming from a newer backend are preserved in
/// [`ArticleStatus::Other`] and displayed verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArticleStatus {
    /// Local draft, not yet processed by the LLM.
    #[default]
    Draft,
    /// Content produced by the LLM.
    Generated,
    /// Pushed to the WeChat draft box.
    Uploaded,
    /// Published to followers.
    Published,
    Other(String),
}

impl ArticleStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Generated => "generated",
            ArticleStatus::Uploaded => "uploaded",
            ArticleStatus::Published => "published",
            ArticleStatus::Other(s) => s,
        }
    }

    /// Human-readable label shown on article cards.
    pub fn status_text(&self) -> &str {
        status_text(self.as_str())
    }
}

impl From<String> for ArticleStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "draft" => ArticleStatus::Draft,
            "generated" => ArticleStatus::Generated,
            "uploaded" => ArticleStatus::Uploaded,
            "published" => ArticleStatus::Published,
            _ => ArticleStatus::Other(s),
        }
    }
}

impl From<ArticleStatus> for String {
    fn from(status: ArticleStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Map a raw status value to its display label.
///
/// Unknown values are returned unchanged.
pub fn status_text(status: &str) -> &str {
    match status {
        "draft" => "草稿",
        "generated" => "已生成",
        "uploaded" => "已上传",
        "published" => "已发布",
        other => other,
    }
}

/// An article drafted by the backend's LLM pipeline.
///
/// `content` is rich HTML produced by the backend and is the only field
/// rendered as markup; every other string is treated as plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub status: ArticleStatus,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub cover_prompt: Option<String>,
    /// One prompt per inline figure; figure `n` uses entry `n - 1`.
    #[serde(default)]
    pub figure_prompt_list: Vec<String>,
    #[serde(default)]
    pub figure_urls: Vec<String>,
    /// Ids of the news items the article was generated from.
    #[serde(default)]
    pub source_news: Vec<String>,
    #[serde(default)]
    pub wechat_media_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Article {
    /// Stored prompt for a 1-based figure index, if any.
    pub fn figure_prompt(&self, index: u32) -> Option<&str> {
        let idx = usize::try_from(index).ok()?.checked_sub(1)?;
        self.figure_prompt_list
            .get(idx)
            .map(String::as_str)
            .filter(|p| !p.is_empty())
    }
}

/// Body of `GET /api/articles/list`.
#[derive(Debug, Default, Deserialize)]
pub struct ArticleList {
    #[serde(default)]
    pub items: Vec<Article>,
    #[serde(default)]
    pub total: usize,
}

/// Fields the preview modal lets the user edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleUpdate {
    pub title: String,
    pub digest: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub news_ids: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateOutcome {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub article: Option<Article>,
}

#[derive(Debug, Serialize)]
pub struct ArticleRef<'a> {
    pub article_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImagesOutcome {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub figure_count: usize,
}

/// Kind of image addressed by a regeneration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Cover,
    Figure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegenerateImageRequest {
    pub article_id: String,
    pub image_type: ImageType,
    /// 1-based, only meaningful for figures.
    pub figure_index: Option<u32>,
    pub prompt: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegenerateImageOutcome {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A draft staged in the WeChat draft box.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Draft {
    pub media_id: String,
    /// Unix timestamp in seconds.
    #[serde(default)]
    pub update_time: i64,
    #[serde(default)]
    pub content: DraftContent,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DraftContent {
    #[serde(default)]
    pub news_item: Vec<DraftNewsItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DraftNewsItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub digest: String,
}

impl Draft {
    /// Title of the first article in the draft, the only one the console shows.
    pub fn title(&self) -> Option<&str> {
        self.content
            .news_item
            .first()
            .map(|n| n.title.as_str())
            .filter(|t| !t.is_empty())
    }

    pub fn updated_at(&self) -> Option<DateTime<Local>> {
        Local.timestamp_opt(self.update_time, 0).single()
    }
}

/// Body of `GET /api/wechat/draft/list`.
#[derive(Debug, Default, Deserialize)]
pub struct DraftList {
    #[serde(default)]
    pub item: Vec<Draft>,
    #[serde(default)]
    pub total_count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct DraftPushOutcome {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub media_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PublishOutcome {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub publish_id: String,
}

/// Handle on a publish job the backend runs asynchronously.
///
/// The backend only acknowledges submission; `publish_id` is what the
/// platform uses to report the final result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishHandle {
    pub media_id: String,
    pub publish_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindRequest {
    pub app_id: String,
    pub app_secret: String,
    pub account_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct BindOutcome {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub account_name: String,
}

/// Body of `GET /api/wechat/status`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WechatStatus {
    #[serde(default)]
    pub bound: bool,
    /// Whether the backend could obtain an access token with the bound credentials.
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Configuration round-tripped by the config panel.
///
/// `wechat` is a masked, read-only view; credentials are changed through
/// the bind flow, never through `PUT /api/config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default, skip_serializing)]
    pub wechat: Option<WechatConfigView>,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WechatConfigView {
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub app_secret: String,
    #[serde(default)]
    pub configured: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_base: String,
    #[serde(default)]
    pub model: String,
    /// `None` is sent as `null`, which the backend treats as "keep current".
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u64>,
    /// The backend returns this masked; it is only sent when the user typed a new one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub default_prompt_prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Five-field cron expression for the automatic scrape-generate-upload run.
    #[serde(default)]
    pub auto_cron: String,
    #[serde(default)]
    pub enabled: bool,
}

/// A job registered in the backend scheduler.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SchedulerJob {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub next_run_time: Option<String>,
    #[serde(default)]
    pub pending: bool,
}

/// One entry of the scheduler's bounded action log.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskRecord {
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SchedulerJobs {
    #[serde(default)]
    pub jobs: Vec<SchedulerJob>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SchedulerHistory {
    #[serde(default)]
    pub history: Vec<TaskRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Health {
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_known_values() {
        assert_eq!(status_text("draft"), "草稿");
        assert_eq!(status_text("generated"), "已生成");
        assert_eq!(status_text("uploaded"), "已上传");
        assert_eq!(status_text("published"), "已发布");
    }

    #[test]
    fn test_status_text_passthrough() {
        assert_eq!(status_text("archived"), "archived");
        assert_eq!(status_text(""), "");
        assert_eq!(
            ArticleStatus::from("scheduled".to_string()).status_text(),
            "scheduled"
        );
    }

    #[test]
    fn test_article_deserialization_with_sparse_fields() {
        let json = r#"{
            "id": "a1",
            "title": "模型发布",
            "content": "<p>hi</p>",
            "status": "generated",
            "figure_prompt_list": ["a robot", "a chart"]
        }"#;

        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.status, ArticleStatus::Generated);
        assert_eq!(article.digest, "");
        assert!(article.cover_url.is_none());
        assert_eq!(article.figure_prompt(2), Some("a chart"));
        assert_eq!(article.figure_prompt(0), None);
        assert_eq!(article.figure_prompt(3), None);
    }

    #[test]
    fn test_unknown_status_survives_serialization() {
        let json = r#"{"id": "a1", "title": "t", "status": "archived"}"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.status, ArticleStatus::Other("archived".into()));

        let back = serde_json::to_value(&article).unwrap();
        assert_eq!(back["status"], "archived");
    }

    #[test]
    fn test_draft_title_and_time() {
        let json = r#"{
            "media_id": "m1",
            "update_time": 1700000000,
            "content": {"news_item": [{"title": "第一篇"}, {"title": "第二篇"}]}
        }"#;
        let draft: Draft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.title(), Some("第一篇"));
        assert!(draft.updated_at().is_some());

        let bare: Draft = serde_json::from_str(r#"{"media_id": "m2"}"#).unwrap();
        assert_eq!(bare.title(), None);
    }

    #[test]
    fn test_config_serialization_skips_wechat_and_empty_key() {
        let config = BackendConfig {
            wechat: Some(WechatConfigView {
                app_id: "wx12****".into(),
                app_secret: "****".into(),
                configured: true,
            }),
            llm: LlmConfig {
                api_base: "https://llm.example/v1".into(),
                model: "m".into(),
                temperature: None,
                max_tokens: Some(2048),
                api_key: None,
            },
            ..Default::default()
        };

        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("wechat").is_none());
        assert!(json["llm"].get("api_key").is_none());
        assert!(json["llm"]["temperature"].is_null());
        assert_eq!(json["llm"]["max_tokens"], 2048);
    }

    #[test]
    fn test_scrape_request_wire_format() {
        let req = ScrapeRequest {
            source: ScrapeSource::All,
            max_count: 10,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"source":"all","max_count":10}"#);
    }
}
