//! HTTP-level tests for `ApiClient` against a mocked backend.
//!
//! Covers:
//! - request bodies for scrape, config save and image regeneration
//! - the response envelope: `success:false`, bare `detail`, HTTP status ignored
//! - transport failures
//! - image downloads and their JSON error shape

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use newsroom_console::api::{ApiClient, Backend};
use newsroom_console::error::ConsoleError;
use newsroom_console::models::{
    BackendConfig, ImageConfig, ImageType, LlmConfig, RegenerateImageRequest, SchedulerConfig,
    ScrapeSource,
};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri(), None).expect("mock server uri is valid")
}

#[tokio::test]
async fn test_list_news_reads_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/news/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "n1", "title": "OpenAI 发布新模型", "summary": "摘要", "source": "aibase"},
                {"id": "n2", "title": "芯片新闻", "source": "aibot", "views": 1200}
            ],
            "total": 2
        })))
        .mount(&server)
        .await;

    let news = client(&server).list_news().await.unwrap();
    assert_eq!(news.len(), 2);
    assert_eq!(news[0].title, "OpenAI 发布新模型");
    assert_eq!(news[1].views, Some(1200));
    assert_eq!(news[1].summary, "");
}

#[tokio::test]
async fn test_scrape_sends_source_and_max_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/news/scrape"))
        .and(body_json(json!({"source": "all", "max_count": 10})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "message": "成功抓取 7 条新闻", "news_count": 7
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server)
        .scrape_news(ScrapeSource::All, 10)
        .await
        .unwrap();
    assert_eq!(outcome.news_count, 7);
}

#[tokio::test]
async fn test_success_false_is_application_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/articles/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "detail": "LLM 服务不可用"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .generate_article(&["n1".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Application { ref detail } if detail == "LLM 服务不可用"));
}

#[tokio::test]
async fn test_http_status_is_not_inspected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "文章不存在"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/wechat/status"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "bound": true, "valid": false, "account_name": "AI 日报", "error": "token 获取失败"
        })))
        .mount(&server)
        .await;

    let api = client(&server);
    let err = api.get_article("missing").await.unwrap_err();
    assert_eq!(err.to_string(), "文章不存在");

    let status = api.wechat_status().await.unwrap();
    assert!(status.bound);
    assert!(!status.valid);
}

#[tokio::test]
async fn test_transport_failure() {
    // Reserve a free port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let api = ApiClient::new(&format!("http://{addr}"), None).unwrap();

    let err = api.list_articles().await.unwrap_err();
    assert!(matches!(err, ConsoleError::Transport(_)));
}

#[tokio::test]
async fn test_path_segments_are_escaped() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/wechat/draft/a%2Fb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).delete_draft("a/b").await.unwrap();
}

#[tokio::test]
async fn test_regenerate_image_request_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/articles/regenerate-image"))
        .and(body_json(json!({
            "article_id": "a1",
            "image_type": "figure",
            "figure_index": 2,
            "prompt": "蓝色电路板"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "插图2重新生成成功",
            "image_url": "/api/articles/figure/a1/2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let req = RegenerateImageRequest {
        article_id: "a1".into(),
        image_type: ImageType::Figure,
        figure_index: Some(2),
        prompt: "蓝色电路板".into(),
    };
    let outcome = client(&server).regenerate_image(&req).await.unwrap();
    assert_eq!(outcome.image_url.as_deref(), Some("/api/articles/figure/a1/2"));
}

#[tokio::test]
async fn test_put_config_sends_nulls_and_omits_key() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/config"))
        .and(body_json(json!({
            "llm": {"api_base": "https://llm.example/v1", "model": "gpt-4o", "temperature": null, "max_tokens": null},
            "image": {"api_url": "", "default_prompt_prefix": ""},
            "scheduler": {"auto_cron": "0 8 * * *", "enabled": false}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "message": "配置已更新"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = BackendConfig {
        wechat: None,
        llm: LlmConfig {
            api_base: "https://llm.example/v1".into(),
            model: "gpt-4o".into(),
            temperature: None,
            max_tokens: None,
            api_key: None,
        },
        image: ImageConfig::default(),
        scheduler: SchedulerConfig {
            auto_cron: "0 8 * * *".into(),
            enabled: false,
        },
    };
    client(&server).put_config(&config).await.unwrap();
}

#[tokio::test]
async fn test_scheduler_history_passes_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config/scheduler/history"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "history": [
                {"job_id": "auto_pipeline", "action": "scrape", "detail": "抓取 10 条", "timestamp": "2026-10-16T08:00:00"}
            ]
        })))
        .mount(&server)
        .await;

    let history = client(&server).scheduler_history(5).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, "scrape");
}

#[tokio::test]
async fn test_fetch_figure_bytes_and_json_error() {
    let server = MockServer::start().await;
    let png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a];
    Mock::given(method("GET"))
        .and(path("/api/articles/figure/a1/1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(png.clone(), "image/png"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/articles/figure/a1/9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "插图不存在"})))
        .mount(&server)
        .await;

    let api = client(&server);
    assert_eq!(api.fetch_figure("a1", 1).await.unwrap(), png);

    let err = api.fetch_figure("a1", 9).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Application { ref detail } if detail == "插图不存在"));
}
