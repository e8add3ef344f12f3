//! Pure render functions.
//!
//! Each function reads [`UiState`] (or a piece of it) by reference and
//! returns terminal text. Backend strings only reach the output through
//! [`crate::markup`].

use crate::markup::{self, ImageSlot, plain};
use crate::models::{
    Article, BackendConfig, Draft, NewsItem, SchedulerJob, TaskRecord, WechatStatus,
};
use crate::state::{ArticleEditor, DraftsView, Page, RegenerateState, UiState};
use crate::toast::{ToastManager, ToastPhase};
use crate::utils::{format_unix_time, mask_secret};
use itertools::Itertools;
use std::time::Instant;

const SUMMARY_CHARS: usize = 80;

fn shorten(s: &str, max_chars: usize) -> String {
    let s = plain(s);
    if s.chars().count() <= max_chars {
        return s.into_owned();
    }
    let head: String = s.chars().take(max_chars).collect();
    format!("{head}…")
}

pub fn page_header(state: &UiState) -> String {
    let tabs = [Page::News, Page::Articles, Page::Drafts, Page::Config]
        .iter()
        .map(|p| {
            if *p == state.page {
                format!("[{}]", p.label())
            } else {
                format!(" {} ", p.label())
            }
        })
        .join(" ");
    format!("== AI公众号控制台 ==\n{tabs}")
}

/// Blocking indicator line, if an action is in flight.
pub fn loading(state: &UiState) -> Option<String> {
    state
        .loading
        .as_deref()
        .map(|msg| format!("⏳ {}", plain(msg)))
}

/// Count badge next to the "generate" button.
pub fn selection_badge(state: &UiState) -> String {
    format!("已选择 {} 条", state.selection.len())
}

/// One row of the news list.
pub fn news_row(item: &NewsItem, selected: bool) -> String {
    let mark = if selected { "[x]" } else { "[ ]" };
    let mut meta = vec![plain(&item.source).into_owned()];
    if let Some(at) = item.published_at.as_deref().filter(|s| !s.is_empty()) {
        meta.push(plain(at).into_owned());
    }
    if let Some(views) = item.views {
        meta.push(format!("{views} 阅读"));
    }

    let mut row = format!(
        "{mark} {}  ({})\n    id: {}",
        plain(&item.title),
        meta.iter().filter(|m| !m.is_empty()).join(" · "),
        plain(&item.id)
    );
    if !item.summary.is_empty() {
        row.push_str("\n    ");
        row.push_str(&shorten(&item.summary, SUMMARY_CHARS));
    }
    row
}

pub fn news_list(state: &UiState) -> String {
    if state.news.is_empty() {
        return "暂无新闻，请先抓取".to_string();
    }
    let rows = state
        .news
        .iter()
        .map(|n| news_row(n, state.selection.contains(&n.id)))
        .join("\n");
    format!("{rows}\n{}", selection_badge(state))
}

pub fn article_card(article: &Article) -> String {
    let mut card = format!(
        "• {}  [{}]\n    id: {}",
        plain(&article.title),
        article.status.status_text(),
        plain(&article.id)
    );
    if !article.digest.is_empty() {
        card.push_str("\n    ");
        card.push_str(&shorten(&article.digest, SUMMARY_CHARS));
    }
    let mut meta = Vec::new();
    if let Some(at) = article.updated_at.as_deref().or(article.created_at.as_deref()) {
        meta.push(format!("更新于 {}", plain(at)));
    }
    if article.cover_url.is_some() {
        meta.push("已有封面".to_string());
    }
    if let Some(media_id) = article.wechat_media_id.as_deref() {
        meta.push(format!("草稿 {}", plain(media_id)));
    }
    if !meta.is_empty() {
        card.push_str("\n    ");
        card.push_str(&meta.join(" · "));
    }
    card
}

pub fn article_list(state: &UiState) -> String {
    if state.articles.is_empty() {
        return "暂无文章".to_string();
    }
    state.articles.iter().map(article_card).join("\n")
}

/// Rendered preview plus the image slots it displays.
///
/// The caller wires `slots` into the editor once this returns; the preview
/// is complete at that point.
#[derive(Debug, Clone)]
pub struct PreviewView {
    pub body: String,
    pub slots: Vec<ImageSlot>,
}

pub fn article_preview(editor: &ArticleEditor) -> PreviewView {
    let article = &editor.article;
    let slots = markup::image_slots(article);

    let mut body = format!(
        "标题: {}\n摘要: {}\n作者: {}  状态: {}\n",
        plain(&editor.title),
        plain(&editor.digest),
        plain(&article.author),
        article.status.status_text()
    );
    if editor.is_dirty() {
        body.push_str("(有未保存的修改)\n");
    }
    body.push_str("----\n");
    body.push_str(&markup::rich_to_text(&article.content));

    if !slots.is_empty() {
        body.push_str("\n----\n可重新生成的图片:");
        for slot in &slots {
            body.push_str(&format!(
                "\n  {}: {}",
                slot.target.label(),
                slot.prompt.as_deref().map(plain).unwrap_or_default()
            ));
        }
    }

    PreviewView { body, slots }
}

pub fn image_regenerate_form(state: &UiState) -> Option<String> {
    match &state.image_regenerate {
        RegenerateState::Idle => None,
        RegenerateState::PromptOpen { target, prompt } => Some(format!(
            "重新生成{}\n提示词: {}",
            target.label(),
            plain(prompt)
        )),
        RegenerateState::Submitting { target, .. } => {
            Some(format!("正在重新生成{}…", target.label()))
        }
    }
}

pub fn draft_row(draft: &Draft) -> String {
    format!(
        "• {}\n    media_id: {}  更新于 {}",
        draft.title().map(plain).unwrap_or("无标题".into()),
        plain(&draft.media_id),
        format_unix_time(draft.update_time)
    )
}

pub fn draft_list(state: &UiState) -> String {
    match &state.drafts {
        DraftsView::NotLoaded => "草稿箱未加载".to_string(),
        DraftsView::Unavailable(reason) => {
            format!("无法获取草稿列表（{}），请先绑定公众号", plain(reason))
        }
        DraftsView::Loaded(drafts) if drafts.is_empty() => "草稿箱为空".to_string(),
        DraftsView::Loaded(drafts) => drafts.iter().map(draft_row).join("\n"),
    }
}

pub fn wechat_status(status: &WechatStatus) -> String {
    if !status.bound {
        return "● 未绑定公众号".to_string();
    }
    let name = plain(&status.account_name);
    if status.valid {
        let app_id = status.app_id.as_deref().map(plain).unwrap_or_default();
        format!("● 已绑定: {name} ({app_id})")
    } else {
        let err = status.error.as_deref().map(plain).unwrap_or_default();
        format!("● 已绑定但凭证无效: {name} {err}").trim_end().to_string()
    }
}

pub fn config_view(config: &BackendConfig) -> String {
    let llm = &config.llm;
    let opt = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    let mut out = String::new();

    if let Some(wechat) = &config.wechat {
        out.push_str(&format!(
            "[wechat]\n  app_id: {}\n  configured: {}\n",
            plain(&wechat.app_id),
            wechat.configured
        ));
    }
    out.push_str(&format!(
        "[llm]\n  api_base: {}\n  model: {}\n  temperature: {}\n  max_tokens: {}\n  api_key: {}\n",
        plain(&llm.api_base),
        plain(&llm.model),
        opt(llm.temperature.map(|t| t.to_string())),
        opt(llm.max_tokens.map(|t| t.to_string())),
        // The backend masks it already; mask again in case it did not.
        opt(llm.api_key.as_deref().map(|k| mask_secret(&plain(k), 4)))
    ));
    out.push_str(&format!(
        "[image]\n  api_url: {}\n  default_prompt_prefix: {}\n",
        plain(&config.image.api_url),
        plain(&config.image.default_prompt_prefix)
    ));
    out.push_str(&format!(
        "[scheduler]\n  auto_cron: {}\n  enabled: {}",
        plain(&config.scheduler.auto_cron),
        config.scheduler.enabled
    ));
    out
}

pub fn scheduler_jobs(jobs: &[SchedulerJob]) -> String {
    if jobs.is_empty() {
        return "没有定时任务".to_string();
    }
    jobs.iter()
        .map(|j| {
            format!(
                "• {} ({})  下次运行: {}{}",
                plain(&j.id),
                plain(&j.name),
                j.next_run_time.as_deref().map(plain).unwrap_or("-".into()),
                if j.pending { "  [pending]" } else { "" }
            )
        })
        .join("\n")
}

pub fn task_history(history: &[TaskRecord]) -> String {
    if history.is_empty() {
        return "暂无任务记录".to_string();
    }
    history
        .iter()
        .map(|r| {
            format!(
                "{}  {}  {}  {}",
                plain(&r.timestamp),
                plain(&r.job_id),
                plain(&r.action),
                plain(&r.detail)
            )
        })
        .join("\n")
}

pub fn toasts(toasts: &ToastManager, now: Instant) -> String {
    toasts
        .visible(now)
        .map(|(t, phase)| {
            let line = format!("{} {}", t.kind.icon(), t.message);
            match phase {
                ToastPhase::Fading => format!("({line})"),
                _ => line,
            }
        })
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleStatus;

    fn item(id: &str, title: &str) -> NewsItem {
        NewsItem {
            id: id.into(),
            title: title.into(),
            summary: "摘要".into(),
            source: "AIBase".into(),
            url: None,
            published_at: Some("2小时前".into()),
            views: Some(1200),
        }
    }

    #[test]
    fn test_news_row_marks_selection_and_escapes() {
        let row = news_row(&item("n1", "\x1b[31m标题\x1b[0m"), true);
        assert!(row.starts_with("[x] 标题  (AIBase · 2小时前 · 1200 阅读)"));
        assert!(!row.contains('\x1b'));

        let row = news_row(&item("n1", "标题"), false);
        assert!(row.starts_with("[ ] "));
    }

    #[test]
    fn test_badge_matches_selection() {
        let mut state = UiState::default();
        state.set_news(vec![item("a", "A"), item("b", "B")]);
        state.toggle_select("b");
        assert_eq!(selection_badge(&state), "已选择 1 条");
        assert!(news_list(&state).ends_with("已选择 1 条"));
    }

    #[test]
    fn test_empty_lists() {
        let state = UiState::default();
        assert_eq!(news_list(&state), "暂无新闻，请先抓取");
        assert_eq!(article_list(&state), "暂无文章");
        assert_eq!(draft_list(&state), "草稿箱未加载");
    }

    #[test]
    fn test_article_card_shows_status_text() {
        let article: Article = serde_json::from_value(serde_json::json!({
            "id": "a1", "title": "标题", "status": "uploaded",
            "wechat_media_id": "m-9", "digest": "d"
        }))
        .unwrap();
        let card = article_card(&article);
        assert!(card.contains("[已上传]"));
        assert!(card.contains("草稿 m-9"));
        assert_eq!(article.status, ArticleStatus::Uploaded);
    }

    #[test]
    fn test_preview_returns_slots_and_text() {
        let article: Article = serde_json::from_value(serde_json::json!({
            "id": "a1", "title": "T", "author": "AI助手",
            "content": "<p>正文</p><p><img src=\"/api/articles/figure/a1/1\"></p>",
            "figure_prompt_list": ["机器人"]
        }))
        .unwrap();
        let mut editor = ArticleEditor::new(article);
        editor.title = "T2".into();

        let view = article_preview(&editor);
        assert_eq!(view.slots.len(), 1);
        assert!(view.body.contains("标题: T2"));
        assert!(view.body.contains("(有未保存的修改)"));
        assert!(view.body.contains("正文\n[插图1]"));
        assert!(view.body.contains("插图1: 机器人"));
    }

    #[test]
    fn test_draft_placeholder_when_unavailable() {
        let state = UiState {
            drafts: DraftsView::Unavailable("公众号未配置".into()),
            ..Default::default()
        };
        assert!(draft_list(&state).contains("请先绑定公众号"));
    }

    #[test]
    fn test_wechat_status_variants() {
        assert_eq!(wechat_status(&WechatStatus::default()), "● 未绑定公众号");
        let ok = WechatStatus {
            bound: true,
            valid: true,
            app_id: Some("wx123456***".into()),
            account_name: "AI日报".into(),
            error: None,
        };
        assert_eq!(wechat_status(&ok), "● 已绑定: AI日报 (wx123456***)");
        let bad = WechatStatus {
            valid: false,
            error: Some("invalid appsecret".into()),
            ..ok
        };
        assert!(wechat_status(&bad).contains("凭证无效"));
    }

    #[test]
    fn test_shorten_counts_chars() {
        assert_eq!(shorten("一二三四五", 3), "一二三…");
        assert_eq!(shorten("abc", 3), "abc");
    }
}
