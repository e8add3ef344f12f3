//! # Newsroom Console
//!
//! Operator console for an AI content pipeline backend. The backend scrapes
//! tech news, drafts WeChat articles with an LLM, generates cover and figure
//! images, and manages the WeChat draft box. This crate is the client side:
//! it holds the transient UI state and turns each operator action into one
//! or more REST calls.
//!
//! ## Layout
//!
//! - [`api`]: the [`Backend`](api::Backend) trait and its HTTP implementation
//! - [`dashboard`]: the controller that owns state, toasts and modals
//! - [`panels`]: per-panel operations (news, articles, drafts, config)
//! - [`render`]: pure text rendering of the current state
//! - [`state`], [`toast`], [`modal`]: client-side state machines
//! - [`markup`]: escaping and article HTML handling
//! - [`settings`], [`cli`]: client configuration and command line
//!
//! ## Example
//!
//! ```no_run
//! use newsroom_console::{api::ApiClient, confirm::AssumeYes, dashboard::Dashboard, settings::Settings};
//!
//! # async fn run() -> newsroom_console::error::Result<()> {
//! let settings = Settings::default();
//! let client = ApiClient::new(&settings.api_base, settings.request_timeout())?;
//! let mut dash = Dashboard::new(client, AssumeYes, &settings);
//! dash.bootstrap().await?;
//! println!("{}", dash.render());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod confirm;
pub mod dashboard;
pub mod error;
pub mod markup;
pub mod modal;
pub mod models;
pub mod panels;
pub mod render;
pub mod settings;
pub mod state;
pub mod toast;
pub mod utils;
