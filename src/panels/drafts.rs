//! Draft-box panel.

use crate::api::Backend;
use crate::confirm::Confirm;
use crate::dashboard::Dashboard;
use crate::error::{ConsoleError, Result};
use crate::models::PublishHandle;
use crate::state::DraftsView;
use tracing::{info, instrument, warn};

impl<B: Backend, C: Confirm> Dashboard<B, C> {
    /// Load the remote draft box.
    ///
    /// The backend rejects this when no account is bound; that case is shown
    /// as a placeholder in the list rather than as a failure.
    #[instrument(level = "info", skip_all)]
    pub async fn load_drafts(&mut self) -> Result<()> {
        match self.backend.list_drafts().await {
            Ok(list) => {
                info!(
                    count = list.item.len(),
                    total = list.total_count,
                    "Loaded drafts"
                );
                self.state.drafts = DraftsView::Loaded(list.item);
                Ok(())
            }
            Err(ConsoleError::Application { detail }) => {
                warn!(%detail, "Draft box unavailable");
                self.state.drafts = DraftsView::Unavailable(detail);
                Ok(())
            }
            Err(e) => {
                self.state.drafts = DraftsView::Unavailable(e.to_string());
                self.fail(e)
            }
        }
    }

    /// Publish a draft to all followers.
    ///
    /// Publishing is asynchronous on the WeChat side; the returned handle is
    /// also kept in `state.pending_publishes`.
    #[instrument(level = "info", skip_all, fields(%media_id))]
    pub async fn publish(&mut self, media_id: &str) -> Result<PublishHandle> {
        self.require_confirmation("确定要发布该草稿吗？发布后将推送给所有关注者。")?;

        self.begin_loading("正在提交发布…");
        let res = self.backend.publish_draft(media_id).await;
        self.end_loading();

        let outcome = match res {
            Ok(outcome) => outcome,
            Err(e) => return self.fail(e),
        };
        let handle = PublishHandle {
            media_id: media_id.to_string(),
            publish_id: outcome.publish_id,
        };
        info!(publish_id = %handle.publish_id, "Publish submitted");
        self.state.record_publish(handle.clone());
        self.toasts.success(if outcome.message.is_empty() {
            "发布任务已提交"
        } else {
            outcome.message.as_str()
        });
        Ok(handle)
    }

    #[instrument(level = "info", skip_all, fields(%media_id))]
    pub async fn delete_draft(&mut self, media_id: &str) -> Result<()> {
        self.require_confirmation("确定要删除这个草稿吗？")?;
        if let Err(e) = self.backend.delete_draft(media_id).await {
            return self.fail(e);
        }
        self.toasts.success("删除成功");
        self.load_drafts().await
    }
}
