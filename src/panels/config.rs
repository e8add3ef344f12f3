//! Configuration panel: backend config, account binding, scheduler.
//!
//! The backend config is edited through [`ConfigForm`], whose fields are all
//! strings the way a form holds them. Numeric fields that are empty or do
//! not parse become `null` on save instead of being rejected here.

use crate::api::Backend;
use crate::confirm::Confirm;
use crate::dashboard::Dashboard;
use crate::error::{ConsoleError, Result};
use crate::modal::Modal;
use crate::models::{
    BackendConfig, BindRequest, Health, ImageConfig, LlmConfig, SchedulerConfig, SchedulerJob,
    TaskRecord, WechatStatus,
};
use crate::utils::{parse_optional_f64, parse_optional_u64};
use tracing::{info, instrument};

/// Editable view of [`BackendConfig`].
///
/// `api_key` starts empty; the backend only ever returns it masked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigForm {
    pub llm_api_base: String,
    pub llm_model: String,
    pub llm_temperature: String,
    pub llm_max_tokens: String,
    pub llm_api_key: String,
    pub image_api_url: String,
    pub image_prompt_prefix: String,
    pub scheduler_cron: String,
    pub scheduler_enabled: bool,
}

impl ConfigForm {
    pub fn from_config(config: &BackendConfig) -> Self {
        let opt = |v: Option<String>| v.unwrap_or_default();
        Self {
            llm_api_base: config.llm.api_base.clone(),
            llm_model: config.llm.model.clone(),
            llm_temperature: opt(config.llm.temperature.map(|t| t.to_string())),
            llm_max_tokens: opt(config.llm.max_tokens.map(|t| t.to_string())),
            llm_api_key: String::new(),
            image_api_url: config.image.api_url.clone(),
            image_prompt_prefix: config.image.default_prompt_prefix.clone(),
            scheduler_cron: config.scheduler.auto_cron.clone(),
            scheduler_enabled: config.scheduler.enabled,
        }
    }

    pub fn to_config(&self) -> BackendConfig {
        let key = self.llm_api_key.trim();
        BackendConfig {
            wechat: None,
            llm: LlmConfig {
                api_base: self.llm_api_base.trim().to_string(),
                model: self.llm_model.trim().to_string(),
                temperature: parse_optional_f64(&self.llm_temperature),
                max_tokens: parse_optional_u64(&self.llm_max_tokens),
                api_key: (!key.is_empty()).then(|| key.to_string()),
            },
            image: ImageConfig {
                api_url: self.image_api_url.trim().to_string(),
                default_prompt_prefix: self.image_prompt_prefix.clone(),
            },
            scheduler: SchedulerConfig {
                auto_cron: self.scheduler_cron.trim().to_string(),
                enabled: self.scheduler_enabled,
            },
        }
    }

    /// Set a field by its dotted key, e.g. `llm.temperature`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.to_string();
        match key {
            "llm.api_base" => self.llm_api_base = value,
            "llm.model" => self.llm_model = value,
            "llm.temperature" => self.llm_temperature = value,
            "llm.max_tokens" => self.llm_max_tokens = value,
            "llm.api_key" => self.llm_api_key = value,
            "image.api_url" => self.image_api_url = value,
            "image.default_prompt_prefix" => self.image_prompt_prefix = value,
            "scheduler.auto_cron" => self.scheduler_cron = value,
            "scheduler.enabled" => {
                self.scheduler_enabled = matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "true" | "1" | "yes" | "on"
                )
            }
            other => return Err(ConsoleError::validation(format!("未知配置项: {other}"))),
        }
        Ok(())
    }
}

/// The account binding form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindForm {
    pub app_id: String,
    pub app_secret: String,
    pub account_name: String,
}

impl BindForm {
    /// All three fields are required.
    pub fn validate(&self) -> Result<BindRequest> {
        let app_id = self.app_id.trim();
        let app_secret = self.app_secret.trim();
        let account_name = self.account_name.trim();
        if app_id.is_empty() || app_secret.is_empty() || account_name.is_empty() {
            return Err(ConsoleError::validation("请填写完整的公众号信息"));
        }
        Ok(BindRequest {
            app_id: app_id.to_string(),
            app_secret: app_secret.to_string(),
            account_name: account_name.to_string(),
        })
    }
}

impl<B: Backend, C: Confirm> Dashboard<B, C> {
    #[instrument(level = "info", skip_all)]
    pub async fn load_config(&mut self) -> Result<ConfigForm> {
        match self.backend.get_config().await {
            Ok(config) => {
                let form = ConfigForm::from_config(&config);
                self.state.config = Some(config);
                Ok(form)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Write the whole config back. Last write wins.
    #[instrument(level = "info", skip_all)]
    pub async fn save_config(&mut self, form: &ConfigForm) -> Result<()> {
        let config = form.to_config();
        info!(
            key_changed = config.llm.api_key.is_some(),
            "Saving backend config"
        );
        if let Err(e) = self.backend.put_config(&config).await {
            return self.fail(e);
        }
        self.toasts.success("配置已保存");
        // Reload so the view shows what the backend kept.
        let _ = self.load_config().await;
        Ok(())
    }

    pub fn open_bind_account(&mut self) {
        self.modals.open(Modal::BindAccount);
    }

    /// Bind WeChat credentials, then check the status once.
    ///
    /// Incomplete forms are rejected before any request is sent.
    #[instrument(level = "info", skip_all)]
    pub async fn bind_account(&mut self, form: &BindForm) -> Result<()> {
        let req = match form.validate() {
            Ok(req) => req,
            Err(e) => return self.fail(e),
        };

        self.begin_loading("正在绑定公众号…");
        let res = self.backend.bind_account(&req).await;
        self.end_loading();

        let outcome = match res {
            Ok(outcome) => outcome,
            Err(e) => return self.fail(e),
        };
        info!(account = %outcome.account_name, "Account bound");
        self.modals.close(Modal::BindAccount);
        self.toasts.success(if outcome.message.is_empty() {
            "公众号绑定成功"
        } else {
            outcome.message.as_str()
        });
        self.refresh_wechat_status().await
    }

    #[instrument(level = "info", skip_all)]
    pub async fn refresh_wechat_status(&mut self) -> Result<()> {
        match self.backend.wechat_status().await {
            Ok(status) => {
                info!(bound = status.bound, valid = status.valid, "Account status");
                self.state.wechat = Some(status);
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    pub fn wechat_status(&self) -> Option<&WechatStatus> {
        self.state.wechat.as_ref()
    }

    pub async fn scheduler_jobs(&mut self) -> Result<Vec<SchedulerJob>> {
        match self.backend.scheduler_jobs().await {
            Ok(jobs) => Ok(jobs),
            Err(e) => self.fail(e),
        }
    }

    pub async fn scheduler_history(&mut self, limit: usize) -> Result<Vec<TaskRecord>> {
        match self.backend.scheduler_history(limit).await {
            Ok(history) => Ok(history),
            Err(e) => self.fail(e),
        }
    }

    pub async fn health(&mut self) -> Result<Health> {
        match self.backend.health().await {
            Ok(health) => Ok(health),
            Err(e) => self.fail(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BackendConfig {
        BackendConfig {
            wechat: None,
            llm: LlmConfig {
                api_base: "https://llm.example/v1".into(),
                model: "gpt-4o".into(),
                temperature: Some(0.7),
                max_tokens: Some(4000),
                api_key: Some("sk-a****wxyz".into()),
            },
            image: ImageConfig {
                api_url: "https://img.example".into(),
                default_prompt_prefix: "科技风格，".into(),
            },
            scheduler: SchedulerConfig {
                auto_cron: "0 8 * * *".into(),
                enabled: true,
            },
        }
    }

    #[test]
    fn test_form_never_carries_masked_key() {
        let form = ConfigForm::from_config(&sample());
        assert_eq!(form.llm_api_key, "");
        assert_eq!(form.llm_temperature, "0.7");
        assert_eq!(form.to_config().llm.api_key, None);
    }

    #[test]
    fn test_unparsable_numbers_become_null() {
        let mut form = ConfigForm::from_config(&sample());
        form.llm_temperature = "hot".into();
        form.llm_max_tokens = "".into();

        let config = form.to_config();
        assert_eq!(config.llm.temperature, None);
        assert_eq!(config.llm.max_tokens, None);

        let json = serde_json::to_value(&config).unwrap();
        assert!(json["llm"]["temperature"].is_null());
        assert!(json["llm"]["max_tokens"].is_null());
        assert!(json["llm"].get("api_key").is_none());
    }

    #[test]
    fn test_set_by_key() {
        let mut form = ConfigForm::default();
        form.set("llm.api_key", "sk-new").unwrap();
        form.set("scheduler.enabled", "true").unwrap();
        assert_eq!(form.to_config().llm.api_key.as_deref(), Some("sk-new"));
        assert!(form.scheduler_enabled);
        assert!(matches!(
            form.set("llm.nope", "x"),
            Err(ConsoleError::Validation(_))
        ));
    }

    #[test]
    fn test_bind_form_requires_all_fields() {
        let form = BindForm {
            app_id: "wx123".into(),
            app_secret: "  ".into(),
            account_name: "AI 日报".into(),
        };
        assert!(matches!(form.validate(), Err(ConsoleError::Validation(_))));

        let form = BindForm {
            app_secret: " secret ".into(),
            ..form
        };
        let req = form.validate().unwrap();
        assert_eq!(req.app_secret, "secret");
    }
}
