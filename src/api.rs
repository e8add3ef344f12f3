//! HTTP access to the content-pipeline backend.
//!
//! # Architecture
//!
//! - [`Backend`]: the seam the dashboard talks through, one method per endpoint
//! - [`ApiClient`]: the `reqwest` implementation used by the binary
//!
//! # Response Handling
//!
//! The backend reports failure in the body, not in the status line. A body is a
//! failure when it carries `"success": false`, or when it carries a `detail`
//! field and no `success` flag at all (the shape of the backend's exception
//! handler). The HTTP status code is never consulted.
//!
//! There is no retry and, unless configured, no timeout: every failed call is
//! terminal for the action that issued it.

use crate::error::{ConsoleError, Result};
use crate::models::{
    Article, ArticleList, ArticleRef, ArticleUpdate, BackendConfig, BindOutcome, BindRequest,
    DraftList, DraftPushOutcome, GenerateOutcome, GenerateRequest, Health, ImagesOutcome, NewsItem,
    NewsList, PublishOutcome, RegenerateImageOutcome, RegenerateImageRequest, SchedulerHistory,
    SchedulerJob, SchedulerJobs, ScrapeOutcome, ScrapeRequest, ScrapeSource, TaskRecord,
    WechatStatus,
};
use crate::utils::truncate_for_log;
use reqwest::{Client, Method, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Every backend operation the console can trigger.
///
/// Path arguments (`id`, `media_id`) are raw values; implementations are
/// responsible for encoding them.
#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn list_news(&self) -> Result<Vec<NewsItem>>;
    async fn scrape_news(&self, source: ScrapeSource, max_count: usize) -> Result<ScrapeOutcome>;
    async fn delete_news(&self, id: &str) -> Result<()>;

    async fn list_articles(&self) -> Result<Vec<Article>>;
    async fn get_article(&self, id: &str) -> Result<Article>;
    async fn update_article(&self, id: &str, update: &ArticleUpdate) -> Result<()>;
    async fn generate_article(&self, news_ids: &[String]) -> Result<GenerateOutcome>;
    async fn regenerate_article(&self, id: &str) -> Result<()>;
    async fn generate_images(&self, article_id: &str) -> Result<ImagesOutcome>;
    async fn regenerate_image(&self, req: &RegenerateImageRequest)
    -> Result<RegenerateImageOutcome>;
    async fn fetch_cover(&self, article_id: &str) -> Result<Vec<u8>>;
    async fn fetch_figure(&self, article_id: &str, index: u32) -> Result<Vec<u8>>;
    async fn delete_article(&self, id: &str) -> Result<()>;

    async fn bind_account(&self, req: &BindRequest) -> Result<BindOutcome>;
    async fn wechat_status(&self) -> Result<WechatStatus>;
    async fn list_drafts(&self) -> Result<DraftList>;
    async fn upload_draft(&self, article_id: &str) -> Result<DraftPushOutcome>;
    async fn update_draft(&self, article_id: &str) -> Result<DraftPushOutcome>;
    async fn publish_draft(&self, media_id: &str) -> Result<PublishOutcome>;
    async fn delete_draft(&self, media_id: &str) -> Result<()>;

    async fn get_config(&self) -> Result<BackendConfig>;
    async fn put_config(&self, config: &BackendConfig) -> Result<()>;
    async fn scheduler_jobs(&self) -> Result<Vec<SchedulerJob>>;
    async fn scheduler_history(&self, limit: usize) -> Result<Vec<TaskRecord>>;
    async fn health(&self) -> Result<Health>;
}

/// Body of endpoints that only acknowledge.
#[derive(Debug, Default, Deserialize)]
struct Ack {
    #[serde(default)]
    message: String,
}

/// `reqwest`-backed [`Backend`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: String,
}

impl ApiClient {
    /// Build a client for `base` (e.g. `http://127.0.0.1:8000`).
    ///
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(base: &str, timeout: Option<Duration>) -> Result<Self> {
        // Validate early so a typo fails before the first action.
        let parsed = Url::parse(base)?;
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            http: builder.build()?,
            base: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}{}", self.base, path))?)
    }

    #[instrument(level = "info", skip_all, fields(%method, %path))]
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let t0 = Instant::now();
        let mut req = self.http.request(method, self.url(path)?);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let res = match req.send().await {
            Ok(resp) => resp.text().await.map_err(ConsoleError::from),
            Err(e) => Err(e.into()),
        };
        let dt = t0.elapsed();

        let text = match res {
            Ok(text) => text,
            Err(e) => {
                warn!(elapsed_ms = dt.as_millis(), error = %e, "Request failed");
                return Err(e);
            }
        };
        debug!(body = %truncate_for_log(&text, 300), "Response body");

        match decode_body(&text) {
            Ok(value) => {
                info!(elapsed_ms = dt.as_millis(), "Request succeeded");
                Ok(value)
            }
            Err(e) => {
                warn!(elapsed_ms = dt.as_millis(), error = %e, "Backend reported failure");
                Err(e)
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::GET, path, None).await
    }

    async fn with_body<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.send(method, path, Some(body)).await
    }

    /// GET an image; a JSON body instead of bytes is the backend's error shape.
    #[instrument(level = "info", skip_all, fields(%path))]
    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self.http.get(self.url(path)?).send().await?;
        let is_json = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let text = resp.text().await?;
            let _: Value = decode_body(&text)?;
            return Err(ConsoleError::application("响应不是图片"));
        }

        let bytes = resp.bytes().await?;
        info!(bytes = bytes.len(), "Fetched image");
        Ok(bytes.to_vec())
    }
}

/// Encode a single path segment.
fn seg(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Parse a response body, turning a failure envelope into [`ConsoleError::Application`].
pub(crate) fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T> {
    let value: Value = serde_json::from_str(text)?;
    check_envelope(&value)?;
    Ok(serde_json::from_value(value)?)
}

fn check_envelope(body: &Value) -> Result<()> {
    let Some(obj) = body.as_object() else {
        return Ok(());
    };
    let failed = match obj.get("success") {
        Some(Value::Bool(ok)) => !ok,
        Some(_) => false,
        None => obj.contains_key("detail"),
    };
    if !failed {
        return Ok(());
    }

    let detail = match obj.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        // Request validation errors arrive as a list of {loc, msg, type}.
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(|i| i.get("msg").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("; "),
        )
        .filter(|s| !s.is_empty()),
        Some(other) if !other.is_null() => Some(other.to_string()),
        _ => None,
    };
    let detail = detail
        .or_else(|| {
            obj.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "操作失败".to_string());
    Err(ConsoleError::application(detail))
}

impl Backend for ApiClient {
    async fn list_news(&self) -> Result<Vec<NewsItem>> {
        let list: NewsList = self.get("/api/news/list").await?;
        Ok(list.items)
    }

    async fn scrape_news(&self, source: ScrapeSource, max_count: usize) -> Result<ScrapeOutcome> {
        let req = ScrapeRequest { source, max_count };
        self.with_body(Method::POST, "/api/news/scrape", &req).await
    }

    async fn delete_news(&self, id: &str) -> Result<()> {
        let _: Ack = self
            .send(Method::DELETE, &format!("/api/news/{}", seg(id)), None)
            .await?;
        Ok(())
    }

    async fn list_articles(&self) -> Result<Vec<Article>> {
        let list: ArticleList = self.get("/api/articles/list").await?;
        Ok(list.items)
    }

    async fn get_article(&self, id: &str) -> Result<Article> {
        self.get(&format!("/api/articles/{}", seg(id))).await
    }

    async fn update_article(&self, id: &str, update: &ArticleUpdate) -> Result<()> {
        let _: Ack = self
            .with_body(Method::PUT, &format!("/api/articles/{}", seg(id)), update)
            .await?;
        Ok(())
    }

    async fn generate_article(&self, news_ids: &[String]) -> Result<GenerateOutcome> {
        let req = GenerateRequest { news_ids };
        self.with_body(Method::POST, "/api/articles/generate", &req)
            .await
    }

    async fn regenerate_article(&self, id: &str) -> Result<()> {
        let ack: Ack = self
            .send(
                Method::POST,
                &format!("/api/articles/{}/regenerate", seg(id)),
                None,
            )
            .await?;
        debug!(message = %ack.message, "Regenerate acknowledged");
        Ok(())
    }

    async fn generate_images(&self, article_id: &str) -> Result<ImagesOutcome> {
        let req = ArticleRef { article_id };
        self.with_body(Method::POST, "/api/articles/generate-images", &req)
            .await
    }

    async fn regenerate_image(
        &self,
        req: &RegenerateImageRequest,
    ) -> Result<RegenerateImageOutcome> {
        self.with_body(Method::POST, "/api/articles/regenerate-image", req)
            .await
    }

    async fn fetch_cover(&self, article_id: &str) -> Result<Vec<u8>> {
        self.get_bytes(&format!("/api/articles/cover/{}", seg(article_id)))
            .await
    }

    async fn fetch_figure(&self, article_id: &str, index: u32) -> Result<Vec<u8>> {
        self.get_bytes(&format!("/api/articles/figure/{}/{}", seg(article_id), index))
            .await
    }

    async fn delete_article(&self, id: &str) -> Result<()> {
        let _: Ack = self
            .send(Method::DELETE, &format!("/api/articles/{}", seg(id)), None)
            .await?;
        Ok(())
    }

    async fn bind_account(&self, req: &BindRequest) -> Result<BindOutcome> {
        self.with_body(Method::POST, "/api/wechat/bind", req).await
    }

    async fn wechat_status(&self) -> Result<WechatStatus> {
        self.get("/api/wechat/status").await
    }

    async fn list_drafts(&self) -> Result<DraftList> {
        self.get("/api/wechat/draft/list").await
    }

    async fn upload_draft(&self, article_id: &str) -> Result<DraftPushOutcome> {
        let req = ArticleRef { article_id };
        self.with_body(Method::POST, "/api/wechat/draft/upload", &req)
            .await
    }

    async fn update_draft(&self, article_id: &str) -> Result<DraftPushOutcome> {
        let req = ArticleRef { article_id };
        self.with_body(Method::PUT, "/api/wechat/draft/update", &req)
            .await
    }

    async fn publish_draft(&self, media_id: &str) -> Result<PublishOutcome> {
        self.send(
            Method::POST,
            &format!("/api/wechat/draft/{}/publish", seg(media_id)),
            None,
        )
        .await
    }

    async fn delete_draft(&self, media_id: &str) -> Result<()> {
        let _: Ack = self
            .send(
                Method::DELETE,
                &format!("/api/wechat/draft/{}", seg(media_id)),
                None,
            )
            .await?;
        Ok(())
    }

    async fn get_config(&self) -> Result<BackendConfig> {
        self.get("/api/config").await
    }

    async fn put_config(&self, config: &BackendConfig) -> Result<()> {
        let _: Ack = self.with_body(Method::PUT, "/api/config", config).await?;
        Ok(())
    }

    async fn scheduler_jobs(&self) -> Result<Vec<SchedulerJob>> {
        let jobs: SchedulerJobs = self.get("/api/config/scheduler/jobs").await?;
        Ok(jobs.jobs)
    }

    async fn scheduler_history(&self, limit: usize) -> Result<Vec<TaskRecord>> {
        let history: SchedulerHistory = self
            .get(&format!("/api/config/scheduler/history?limit={limit}"))
            .await?;
        Ok(history.history)
    }

    async fn health(&self) -> Result<Health> {
        self.get("/health").await
    }
}
