//! News panel: list, scrape, multi-select.

use crate::api::Backend;
use crate::confirm::Confirm;
use crate::dashboard::Dashboard;
use crate::error::Result;
use crate::models::ScrapeSource;
use crate::render;
use tracing::{info, instrument};

/// Output of a single-row toggle: the re-rendered row and count badge.
#[derive(Debug, Clone, PartialEq)]
pub struct RowUpdate {
    pub row: String,
    pub badge: String,
}

impl<B: Backend, C: Confirm> Dashboard<B, C> {
    #[instrument(level = "info", skip_all)]
    pub async fn load_news(&mut self) -> Result<()> {
        match self.backend.list_news().await {
            Ok(news) => {
                info!(count = news.len(), "Loaded news");
                self.state.set_news(news);
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Ask the backend to scrape `source`, then reload the list.
    ///
    /// Returns the number of items the backend reported.
    #[instrument(level = "info", skip_all, fields(%source))]
    pub async fn scrape(&mut self, source: ScrapeSource) -> Result<usize> {
        self.begin_loading(format!("正在抓取 {source} 新闻…"));
        let res = self
            .backend
            .scrape_news(source, self.scrape_max_count)
            .await;
        self.end_loading();

        let outcome = match res {
            Ok(outcome) => outcome,
            Err(e) => return self.fail(e),
        };
        info!(count = outcome.news_count, "Scrape finished");
        if outcome.message.is_empty() {
            self.toasts
                .success(format!("成功抓取 {} 条新闻", outcome.news_count));
        } else {
            self.toasts.success(&outcome.message);
        }
        self.load_news().await?;
        Ok(outcome.news_count)
    }

    /// Flip one item and re-render only its row and the badge.
    ///
    /// Returns `None` for an id that is not in the rendered list.
    pub fn toggle_select(&mut self, id: &str) -> Option<RowUpdate> {
        let selected = self.state.toggle_select(id)?;
        let item = self.state.news.iter().find(|n| n.id == id)?;
        Some(RowUpdate {
            row: render::news_row(item, selected),
            badge: render::selection_badge(&self.state),
        })
    }

    /// Select every rendered item, or clear when all are already selected.
    pub fn toggle_select_all(&mut self) -> String {
        self.state.toggle_select_all();
        render::news_list(&self.state)
    }

    #[instrument(level = "info", skip_all, fields(%id))]
    pub async fn delete_news(&mut self, id: &str) -> Result<()> {
        self.require_confirmation("确定要删除这条新闻吗？")?;
        if let Err(e) = self.backend.delete_news(id).await {
            return self.fail(e);
        }
        self.toasts.success("删除成功");
        self.load_news().await
    }
}
