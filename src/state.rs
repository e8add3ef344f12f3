//! UI state owned by the dashboard.
//!
//! All transient state lives in [`UiState`] and is handed to the render
//! functions by reference. Nothing here performs I/O.

use crate::error::{ConsoleError, Result};
use crate::markup::ImageSlot;
use crate::models::{
    Article, ArticleUpdate, BackendConfig, Draft, ImageType, NewsItem, PublishHandle, WechatStatus,
};
use std::collections::HashSet;

/// Publish handles kept for display; older ones are dropped.
pub const MAX_PENDING_PUBLISHES: usize = 20;

/// Top-level panel being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Page {
    #[default]
    News,
    Articles,
    Drafts,
    Config,
}

impl Page {
    pub fn label(&self) -> &'static str {
        match self {
            Page::News => "热点新闻",
            Page::Articles => "文章管理",
            Page::Drafts => "草稿箱",
            Page::Config => "系统配置",
        }
    }
}

/// Ids of the news items ticked in the news panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: HashSet<String>,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Flip membership, returning whether `id` is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    fn retain(&mut self, keep: impl Fn(&str) -> bool) {
        self.ids.retain(|id| keep(id));
    }
}

/// Image addressed by the regeneration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageTarget {
    Cover,
    /// 1-based figure index as it appears in the figure URL.
    Figure(u32),
}

impl ImageTarget {
    pub fn image_type(&self) -> ImageType {
        match self {
            ImageTarget::Cover => ImageType::Cover,
            ImageTarget::Figure(_) => ImageType::Figure,
        }
    }

    pub fn figure_index(&self) -> Option<u32> {
        match self {
            ImageTarget::Cover => None,
            ImageTarget::Figure(n) => Some(*n),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ImageTarget::Cover => "封面".to_string(),
            ImageTarget::Figure(n) => format!("插图{n}"),
        }
    }
}

/// Image regeneration flow: `Idle → PromptOpen → Submitting → Idle`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RegenerateState {
    #[default]
    Idle,
    PromptOpen { target: ImageTarget, prompt: String },
    Submitting { target: ImageTarget, prompt: String },
}

impl RegenerateState {
    pub fn target(&self) -> Option<ImageTarget> {
        match self {
            RegenerateState::Idle => None,
            RegenerateState::PromptOpen { target, .. }
            | RegenerateState::Submitting { target, .. } => Some(*target),
        }
    }
}

/// Article open in the preview modal, with the user's pending edits.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleEditor {
    pub article: Article,
    pub title: String,
    pub digest: String,
    /// Regenerable images, wired once the preview has been rendered.
    pub images: Vec<ImageSlot>,
}

impl ArticleEditor {
    pub fn new(article: Article) -> Self {
        Self {
            title: article.title.clone(),
            digest: article.digest.clone(),
            article,
            images: Vec::new(),
        }
    }

    pub fn update(&self) -> ArticleUpdate {
        ArticleUpdate {
            title: self.title.clone(),
            digest: self.digest.clone(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.title != self.article.title || self.digest != self.article.digest
    }

    pub fn slot(&self, target: ImageTarget) -> Option<&ImageSlot> {
        self.images.iter().find(|s| s.target == target)
    }
}

/// What the draft panel currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DraftsView {
    #[default]
    NotLoaded,
    /// Account unbound or list unavailable; holds the reason shown in the placeholder.
    Unavailable(String),
    Loaded(Vec<Draft>),
}

/// Everything the dashboard renders.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub page: Page,
    pub news: Vec<NewsItem>,
    pub selection: Selection,
    pub articles: Vec<Article>,
    pub drafts: DraftsView,
    pub current_article: Option<ArticleEditor>,
    pub image_regenerate: RegenerateState,
    pub config: Option<BackendConfig>,
    pub wechat: Option<WechatStatus>,
    /// Message of the blocking loading indicator, when one is up.
    pub loading: Option<String>,
    /// Publish jobs submitted this session, most recent last.
    pub pending_publishes: Vec<PublishHandle>,
}

impl UiState {
    /// Replace the rendered news list, dropping selected ids that are gone.
    pub fn set_news(&mut self, news: Vec<NewsItem>) {
        let ids: HashSet<&str> = news.iter().map(|n| n.id.as_str()).collect();
        self.selection.retain(|id| ids.contains(id));
        self.news = news;
    }

    fn is_rendered(&self, id: &str) -> bool {
        self.news.iter().any(|n| n.id == id)
    }

    /// Flip selection of a rendered news item.
    ///
    /// Returns `None` when `id` is not in the current list.
    pub fn toggle_select(&mut self, id: &str) -> Option<bool> {
        if !self.is_rendered(id) {
            return None;
        }
        Some(self.selection.toggle(id))
    }

    /// Clear the selection if every rendered item is selected, otherwise
    /// select every rendered item.
    pub fn toggle_select_all(&mut self) {
        if self.selection.len() == self.news.len() {
            self.selection.clear();
        } else {
            for item in &self.news {
                self.selection.ids.insert(item.id.clone());
            }
        }
    }

    /// Selected ids in the order they appear in the list.
    pub fn selected_ids(&self) -> Vec<String> {
        self.news
            .iter()
            .filter(|n| self.selection.contains(&n.id))
            .map(|n| n.id.clone())
            .collect()
    }

    /// Enter `PromptOpen` for `target`, returning the pre-filled prompt.
    pub fn open_image_regenerate(&mut self, target: ImageTarget) -> Result<String> {
        let editor = self
            .current_article
            .as_ref()
            .ok_or_else(|| ConsoleError::validation("请先打开文章预览"))?;
        let slot = editor
            .slot(target)
            .ok_or_else(|| ConsoleError::validation(format!("文章中没有{}", target.label())))?;

        let prompt = slot.prompt.clone().unwrap_or_default();
        self.image_regenerate = RegenerateState::PromptOpen {
            target,
            prompt: prompt.clone(),
        };
        Ok(prompt)
    }

    /// Move `PromptOpen → Submitting` with the user's prompt.
    ///
    /// A blank prompt is rejected and the state is left untouched.
    pub fn begin_image_submit(&mut self, prompt: &str) -> Result<(ImageTarget, String)> {
        let RegenerateState::PromptOpen { target, .. } = self.image_regenerate else {
            return Err(ConsoleError::validation("没有待重新生成的图片"));
        };
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ConsoleError::validation("请输入提示词"));
        }
        self.image_regenerate = RegenerateState::Submitting {
            target,
            prompt: prompt.to_string(),
        };
        Ok((target, prompt.to_string()))
    }

    pub fn reset_image_regenerate(&mut self) {
        self.image_regenerate = RegenerateState::Idle;
    }

    /// Remember a submitted publish, keeping the most recent
    /// [`MAX_PENDING_PUBLISHES`].
    pub fn record_publish(&mut self, handle: PublishHandle) {
        self.pending_publishes.push(handle);
        let excess = self
            .pending_publishes
            .len()
            .saturating_sub(MAX_PENDING_PUBLISHES);
        self.pending_publishes.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn news(ids: &[&str]) -> Vec<NewsItem> {
        ids.iter()
            .map(|id| NewsItem {
                id: id.to_string(),
                title: format!("news {id}"),
                summary: String::new(),
                source: "AIBase".into(),
                url: None,
                published_at: None,
                views: None,
            })
            .collect()
    }

    fn state_with(ids: &[&str]) -> UiState {
        let mut state = UiState::default();
        state.set_news(news(ids));
        state
    }

    #[test]
    fn test_toggle_select_tracks_cardinality() {
        let mut state = state_with(&["a", "b", "c"]);
        let ops = ["a", "b", "a", "c", "c", "b", "a"];
        let mut expected = HashSet::new();
        for id in ops {
            let now = state.toggle_select(id).unwrap();
            if !expected.remove(id) {
                expected.insert(id);
            }
            assert_eq!(now, expected.contains(id));
            assert_eq!(state.selection.len(), expected.len());
        }
    }

    #[test]
    fn test_toggle_select_unknown_id_is_ignored() {
        let mut state = state_with(&["a"]);
        assert_eq!(state.toggle_select("zzz"), None);
        assert!(state.selection.is_empty());
    }

    #[test]
    fn test_toggle_select_all_scenario() {
        let mut state = state_with(&["a", "b"]);
        state.toggle_select("a");

        state.toggle_select_all();
        assert_eq!(state.selected_ids(), vec!["a", "b"]);

        state.toggle_select_all();
        assert!(state.selection.is_empty());
    }

    #[test]
    fn test_toggle_select_all_from_full_and_empty() {
        let ids = ["n1", "n2", "n3", "n4"];
        let mut state = state_with(&ids);
        for id in ids {
            state.toggle_select(id);
        }
        state.toggle_select_all();
        assert!(state.selection.is_empty());

        state.toggle_select_all();
        assert_eq!(state.selection.len(), ids.len());
    }

    #[test]
    fn test_toggle_select_all_on_empty_list() {
        let mut state = UiState::default();
        state.toggle_select_all();
        assert!(state.selection.is_empty());
    }

    #[test]
    fn test_set_news_prunes_missing_ids() {
        let mut state = state_with(&["a", "b", "c"]);
        state.toggle_select("a");
        state.toggle_select("c");

        state.set_news(news(&["c", "d"]));
        assert_eq!(state.selected_ids(), vec!["c"]);
        assert_eq!(state.selection.len(), 1);
    }

    #[test]
    fn test_selected_ids_follow_list_order() {
        let mut state = state_with(&["x", "y", "z"]);
        state.toggle_select("z");
        state.toggle_select("x");
        assert_eq!(state.selected_ids(), vec!["x", "z"]);
    }

    fn state_with_preview() -> UiState {
        let article: Article = serde_json::from_value(serde_json::json!({
            "id": "a1",
            "title": "t",
            "cover_url": "cover.png",
            "cover_prompt": "蓝色科技背景",
            "figure_prompt_list": ["机器人"],
            "content": "<img src=\"/api/articles/figure/a1/1\">"
        }))
        .unwrap();
        let mut editor = ArticleEditor::new(article);
        editor.images = crate::markup::image_slots(&editor.article);
        UiState {
            current_article: Some(editor),
            ..Default::default()
        }
    }

    #[test]
    fn test_open_image_regenerate_prefills_prompt() {
        let mut state = state_with_preview();
        assert_eq!(
            state.open_image_regenerate(ImageTarget::Figure(1)).unwrap(),
            "机器人"
        );
        assert_eq!(
            state.open_image_regenerate(ImageTarget::Cover).unwrap(),
            "蓝色科技背景"
        );
        assert_eq!(state.image_regenerate.target(), Some(ImageTarget::Cover));
    }

    #[test]
    fn test_open_image_regenerate_requires_preview_and_slot() {
        let mut state = UiState::default();
        assert!(state.open_image_regenerate(ImageTarget::Cover).is_err());

        let mut state = state_with_preview();
        assert!(state.open_image_regenerate(ImageTarget::Figure(7)).is_err());
        assert_eq!(state.image_regenerate, RegenerateState::Idle);
    }

    #[test]
    fn test_blank_prompt_leaves_state_unchanged() {
        let mut state = state_with_preview();
        state.open_image_regenerate(ImageTarget::Figure(1)).unwrap();
        let before = state.image_regenerate.clone();

        for blank in ["", "   ", "\n\t"] {
            let err = state.begin_image_submit(blank).unwrap_err();
            assert!(matches!(err, ConsoleError::Validation(_)));
            assert_eq!(state.image_regenerate, before);
        }
    }

    #[test]
    fn test_begin_submit_moves_to_submitting() {
        let mut state = state_with_preview();
        state.open_image_regenerate(ImageTarget::Cover).unwrap();
        let (target, prompt) = state.begin_image_submit("  新提示词 ").unwrap();
        assert_eq!(target, ImageTarget::Cover);
        assert_eq!(prompt, "新提示词");
        assert!(matches!(
            state.image_regenerate,
            RegenerateState::Submitting { .. }
        ));

        // A second submit while one is in flight is rejected.
        assert!(state.begin_image_submit("again").is_err());
    }

    #[test]
    fn test_editor_dirty_tracking() {
        let state = state_with_preview();
        let mut editor = state.current_article.unwrap();
        assert!(!editor.is_dirty());
        editor.digest = "新摘要".into();
        assert!(editor.is_dirty());
        assert_eq!(editor.update().digest, "新摘要");
    }

    #[test]
    fn test_record_publish_is_bounded() {
        let mut state = UiState::default();
        for i in 0..MAX_PENDING_PUBLISHES + 3 {
            state.record_publish(PublishHandle {
                media_id: format!("m{i}"),
                publish_id: format!("p{i}"),
            });
        }
        assert_eq!(state.pending_publishes.len(), MAX_PENDING_PUBLISHES);
        assert_eq!(state.pending_publishes[0].media_id, "m3");
        assert_eq!(
            state.pending_publishes.last().unwrap().publish_id,
            format!("p{}", MAX_PENDING_PUBLISHES + 2)
        );
    }
}
