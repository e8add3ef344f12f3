//! The dashboard controller.
//!
//! [`Dashboard`] owns the UI state, the toast stack and the modal set, and
//! talks to the backend through a [`Backend`]. Panel operations live in
//! [`crate::panels`]; this module holds construction, page switching, the
//! full-screen render and the shared failure path.
//!
//! Actions run one at a time through `&mut self`. Nothing is retried: a
//! failed action leaves a toast and returns the error.

use crate::api::Backend;
use crate::confirm::Confirm;
use crate::error::{ConsoleError, Result};
use crate::modal::{Modal, ModalManager};
use crate::render;
use crate::settings::Settings;
use crate::state::{Page, UiState};
use crate::toast::ToastManager;
use std::time::Instant;
use tracing::{debug, info, instrument};

pub struct Dashboard<B, C> {
    pub(crate) backend: B,
    pub(crate) confirm: C,
    pub state: UiState,
    pub toasts: ToastManager,
    pub modals: ModalManager,
    pub(crate) scrape_max_count: usize,
}

impl<B: Backend, C: Confirm> Dashboard<B, C> {
    pub fn new(backend: B, confirm: C, settings: &Settings) -> Self {
        Self {
            backend,
            confirm,
            state: UiState::default(),
            toasts: ToastManager::new(settings.toast_ttl()),
            modals: ModalManager::default(),
            scrape_max_count: settings.scrape_max_count,
        }
    }

    /// Initial load: the news list and the account status, concurrently.
    #[instrument(level = "info", skip_all)]
    pub async fn bootstrap(&mut self) -> Result<()> {
        let (news, status) =
            futures::join!(self.backend.list_news(), self.backend.wechat_status());

        match status {
            Ok(status) => self.state.wechat = Some(status),
            Err(e) => {
                // The news list is the primary view; a status failure only warns.
                self.toasts.error(format!("获取公众号状态失败: {e}"));
            }
        }
        match news {
            Ok(news) => {
                info!(count = news.len(), "Loaded news");
                self.state.set_news(news);
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Switch panel and load what it shows.
    pub async fn show_page(&mut self, page: Page) -> Result<()> {
        debug!(?page, "Switching page");
        self.state.page = page;
        match page {
            Page::News => self.load_news().await,
            Page::Articles => self.load_articles().await,
            Page::Drafts => self.load_drafts().await,
            Page::Config => {
                self.load_config().await?;
                self.refresh_wechat_status().await
            }
        }
    }

    /// Full screen for the current page, modals and toasts included.
    pub fn render(&self) -> String {
        self.render_at(Instant::now())
    }

    pub fn render_at(&self, now: Instant) -> String {
        let state = &self.state;
        let mut sections = vec![render::page_header(state)];
        if let Some(loading) = render::loading(state) {
            sections.push(loading);
        }

        let body = match state.page {
            Page::News => render::news_list(state),
            Page::Articles => render::article_list(state),
            Page::Drafts => render::draft_list(state),
            Page::Config => {
                let mut parts = Vec::new();
                if let Some(status) = &state.wechat {
                    parts.push(render::wechat_status(status));
                }
                if let Some(config) = &state.config {
                    parts.push(render::config_view(config));
                }
                parts.join("\n")
            }
        };
        sections.push(body);

        if self.modals.is_open(Modal::ArticlePreview) {
            if let Some(editor) = &state.current_article {
                sections.push(format!(
                    "[文章预览]\n{}",
                    render::article_preview(editor).body
                ));
            }
        }
        if self.modals.is_open(Modal::ImageRegenerate) {
            if let Some(form) = render::image_regenerate_form(state) {
                sections.push(format!("[重新生成图片]\n{form}"));
            }
        }

        let toasts = render::toasts(&self.toasts, now);
        if !toasts.is_empty() {
            sections.push(toasts);
        }
        sections.join("\n\n")
    }

    /// Surface `err` as a toast and hand it back.
    pub(crate) fn fail<T>(&mut self, err: ConsoleError) -> Result<T> {
        match &err {
            ConsoleError::Declined => {
                self.toasts.info("已取消");
            }
            _ => {
                self.toasts.error(err.to_string());
            }
        }
        Err(err)
    }

    /// Ask before a destructive action.
    pub(crate) fn require_confirmation(&mut self, prompt: &str) -> Result<()> {
        if self.confirm.confirm(prompt) {
            Ok(())
        } else {
            info!(prompt, "Confirmation declined");
            self.fail(ConsoleError::Declined)
        }
    }

    pub(crate) fn begin_loading(&mut self, msg: impl Into<String>) {
        self.state.loading = Some(msg.into());
    }

    pub(crate) fn end_loading(&mut self) {
        self.state.loading = None;
    }
}
