//! Article panel: list, generate, preview/edit, image regeneration, draft push.

use crate::api::Backend;
use crate::confirm::Confirm;
use crate::dashboard::Dashboard;
use crate::error::{ConsoleError, Result};
use crate::modal::Modal;
use crate::models::{Article, RegenerateImageRequest};
use crate::render;
use crate::state::{ArticleEditor, ImageTarget, Page};
use crate::utils::ensure_writable_dir;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

impl<B: Backend, C: Confirm> Dashboard<B, C> {
    #[instrument(level = "info", skip_all)]
    pub async fn load_articles(&mut self) -> Result<()> {
        match self.backend.list_articles().await {
            Ok(articles) => {
                info!(count = articles.len(), "Loaded articles");
                self.state.articles = articles;
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Generate an article from the selected news.
    ///
    /// On success the selection is cleared and the Articles page is shown.
    /// On failure the selection is left as it was.
    #[instrument(level = "info", skip_all)]
    pub async fn generate(&mut self) -> Result<Option<Article>> {
        let ids = self.state.selected_ids();
        if ids.is_empty() {
            return self.fail(ConsoleError::validation("请先选择新闻"));
        }

        info!(count = ids.len(), "Generating article");
        self.begin_loading(format!("AI 正在根据 {} 条新闻生成文章…", ids.len()));
        let res = self.backend.generate_article(&ids).await;
        self.end_loading();

        let outcome = match res {
            Ok(outcome) => outcome,
            Err(e) => return self.fail(e),
        };
        self.state.selection.clear();
        self.state.page = Page::Articles;
        self.toasts.success(if outcome.message.is_empty() {
            "文章生成成功"
        } else {
            outcome.message.as_str()
        });
        // The article exists now; a failed list refresh is only a toast.
        let _ = self.load_articles().await;
        Ok(outcome.article)
    }

    /// Open the preview modal for `id`.
    ///
    /// The image slots are wired from the rendered view before this
    /// returns, so they are usable immediately. Switching to another
    /// article closes any open regeneration form.
    #[instrument(level = "info", skip_all, fields(%id))]
    pub async fn preview(&mut self, id: &str) -> Result<String> {
        let article = match self.backend.get_article(id).await {
            Ok(article) => article,
            Err(e) => return self.fail(e),
        };

        let switched = self
            .state
            .current_article
            .as_ref()
            .is_some_and(|e| e.article.id != article.id);
        if switched {
            // A pending regeneration targets the article being replaced.
            self.cancel_image_regenerate();
        }

        let mut editor = ArticleEditor::new(article);
        let view = render::article_preview(&editor);
        editor.images = view.slots;
        info!(images = editor.images.len(), "Preview rendered");

        self.state.current_article = Some(editor);
        self.modals.open(Modal::ArticlePreview);
        Ok(view.body)
    }

    pub fn close_preview(&mut self) {
        self.modals.close(Modal::ArticlePreview);
        self.modals.close(Modal::ImageRegenerate);
        self.state.current_article = None;
        self.state.reset_image_regenerate();
    }

    fn editor_mut(&mut self) -> Result<&mut ArticleEditor> {
        self.state
            .current_article
            .as_mut()
            .ok_or_else(|| ConsoleError::validation("请先打开文章预览"))
    }

    fn current_article_id(&mut self) -> Result<String> {
        match self.state.current_article.as_ref() {
            Some(editor) => Ok(editor.article.id.clone()),
            None => self.fail(ConsoleError::validation("请先打开文章预览")),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<()> {
        self.editor_mut()?.title = title.into();
        Ok(())
    }

    pub fn set_digest(&mut self, digest: impl Into<String>) -> Result<()> {
        self.editor_mut()?.digest = digest.into();
        Ok(())
    }

    /// Persist the edited title and digest of the open article.
    #[instrument(level = "info", skip_all)]
    pub async fn save(&mut self) -> Result<()> {
        let id = self.current_article_id()?;
        let update = match self.state.current_article.as_ref() {
            Some(editor) => editor.update(),
            None => return self.fail(ConsoleError::validation("请先打开文章预览")),
        };

        if let Err(e) = self.backend.update_article(&id, &update).await {
            return self.fail(e);
        }
        if let Some(editor) = self.state.current_article.as_mut() {
            editor.article.title = update.title;
            editor.article.digest = update.digest;
        }
        self.toasts.success("保存成功");
        let _ = self.load_articles().await;
        Ok(())
    }

    /// Overwrite the open article's content with a fresh generation.
    #[instrument(level = "info", skip_all)]
    pub async fn regenerate(&mut self) -> Result<String> {
        let id = self.current_article_id()?;
        self.require_confirmation("确定要重新生成文章内容吗？当前内容将被覆盖。")?;

        self.begin_loading("AI 正在重新生成文章…");
        let res = self.backend.regenerate_article(&id).await;
        self.end_loading();
        if let Err(e) = res {
            return self.fail(e);
        }

        self.toasts.success("文章重新生成成功");
        let body = self.preview(&id).await?;
        let _ = self.load_articles().await;
        Ok(body)
    }

    /// Request cover and figure generation for `id`.
    #[instrument(level = "info", skip_all, fields(%id))]
    pub async fn generate_images(&mut self, id: &str) -> Result<usize> {
        self.begin_loading("正在生成封面和插图，可能需要几分钟…");
        let res = self.backend.generate_images(id).await;
        self.end_loading();

        let outcome = match res {
            Ok(outcome) => outcome,
            Err(e) => return self.fail(e),
        };
        if outcome.message.is_empty() {
            self.toasts
                .success(format!("成功生成封面图和{}张插图", outcome.figure_count));
        } else {
            self.toasts.success(&outcome.message);
        }

        let previewing = self
            .state
            .current_article
            .as_ref()
            .is_some_and(|e| e.article.id == id);
        if previewing {
            let _ = self.preview(id).await;
        }
        let _ = self.load_articles().await;
        Ok(outcome.figure_count)
    }

    /// Open the regeneration form for one image of the open article.
    ///
    /// Returns the stored prompt used to pre-fill the form.
    pub fn open_image_regenerate(&mut self, target: ImageTarget) -> Result<String> {
        match self.state.open_image_regenerate(target) {
            Ok(prompt) => {
                self.modals.open(Modal::ImageRegenerate);
                Ok(prompt)
            }
            Err(e) => self.fail(e),
        }
    }

    pub fn cancel_image_regenerate(&mut self) {
        self.state.reset_image_regenerate();
        self.modals.close(Modal::ImageRegenerate);
    }

    /// Submit the regeneration form.
    ///
    /// A blank prompt is rejected locally and leaves the form open and the
    /// target untouched. Otherwise the flow returns to idle whatever the
    /// outcome; on success the preview and the list are refreshed.
    #[instrument(level = "info", skip_all)]
    pub async fn submit_image_regenerate(&mut self, prompt: &str) -> Result<()> {
        let (target, prompt) = match self.state.begin_image_submit(prompt) {
            Ok(submission) => submission,
            Err(e) => return self.fail(e),
        };
        let article_id = match self.state.current_article.as_ref() {
            Some(editor) => editor.article.id.clone(),
            None => {
                self.state.reset_image_regenerate();
                return self.fail(ConsoleError::validation("请先打开文章预览"));
            }
        };

        let req = RegenerateImageRequest {
            article_id: article_id.clone(),
            image_type: target.image_type(),
            figure_index: target.figure_index(),
            prompt,
        };
        self.begin_loading(format!("正在重新生成{}…", target.label()));
        let res = self.backend.regenerate_image(&req).await;
        self.end_loading();
        self.cancel_image_regenerate();

        let outcome = match res {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, target = %target.label(), "Image regeneration failed");
                return self.fail(e);
            }
        };
        self.toasts.success(if outcome.message.is_empty() {
            "图片重新生成成功"
        } else {
            outcome.message.as_str()
        });
        let _ = self.preview(&article_id).await;
        let _ = self.load_articles().await;
        Ok(())
    }

    /// Push an article to the WeChat draft box, replacing its previous draft
    /// when it already has one.
    #[instrument(level = "info", skip_all, fields(%article_id))]
    pub async fn push_draft(&mut self, article_id: &str) -> Result<String> {
        let known = self
            .state
            .articles
            .iter()
            .find(|a| a.id == article_id)
            .map(|a| a.wechat_media_id.is_some());
        let has_draft = match known {
            Some(has) => has,
            None => match self.backend.get_article(article_id).await {
                Ok(article) => article.wechat_media_id.is_some(),
                Err(e) => return self.fail(e),
            },
        };

        self.begin_loading("正在上传到草稿箱…");
        let res = if has_draft {
            self.backend.update_draft(article_id).await
        } else {
            self.backend.upload_draft(article_id).await
        };
        self.end_loading();

        let outcome = match res {
            Ok(outcome) => outcome,
            Err(e) => return self.fail(e),
        };
        info!(media_id = %outcome.media_id, updated = has_draft, "Draft pushed");
        self.toasts.success(if has_draft {
            "草稿更新成功"
        } else {
            "草稿上传成功"
        });
        let _ = self.load_articles().await;
        Ok(outcome.media_id)
    }

    #[instrument(level = "info", skip_all, fields(%id))]
    pub async fn delete_article(&mut self, id: &str) -> Result<()> {
        self.require_confirmation("确定要删除这篇文章吗？")?;
        if let Err(e) = self.backend.delete_article(id).await {
            return self.fail(e);
        }
        let previewing = self
            .state
            .current_article
            .as_ref()
            .is_some_and(|e| e.article.id == id);
        if previewing {
            self.close_preview();
        }
        self.toasts.success("删除成功");
        self.load_articles().await
    }

    /// Download one image of an article to `dest`.
    #[instrument(level = "info", skip_all, fields(%article_id, dest = %dest.display()))]
    pub async fn download_image(
        &mut self,
        article_id: &str,
        target: ImageTarget,
        dest: &Path,
    ) -> Result<PathBuf> {
        let res = match target {
            ImageTarget::Cover => self.backend.fetch_cover(article_id).await,
            ImageTarget::Figure(n) => self.backend.fetch_figure(article_id, n).await,
        };
        let bytes = match res {
            Ok(bytes) => bytes,
            Err(e) => return self.fail(e),
        };

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = ensure_writable_dir(parent).await {
                return self.fail(e.into());
            }
        }
        if let Err(e) = tokio::fs::write(dest, &bytes).await {
            return self.fail(e.into());
        }
        info!(bytes = bytes.len(), "Saved image");
        self.toasts
            .success(format!("{}已保存到 {}", target.label(), dest.display()));
        Ok(dest.to_path_buf())
    }
}
