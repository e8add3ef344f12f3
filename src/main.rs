//! # Newsroom Console
//!
//! Command-line front end of the dashboard. Each invocation runs one
//! operator action against the backend, prints the resulting view on
//! stdout and the toasts it raised on stderr.
//!
//! ## Usage
//!
//! ```sh
//! newsroom_console dashboard
//! newsroom_console --yes drafts publish MEDIA_ID
//! ```

use clap::Parser;
use newsroom_console::api::{ApiClient, Backend};
use newsroom_console::cli::{
    ArticleCommand, Cli, Command, ConfigCommand, DraftCommand, NewsCommand, SchedulerCommand,
    WechatCommand,
};
use newsroom_console::confirm::{AssumeYes, Confirm, StdinConfirm};
use newsroom_console::dashboard::Dashboard;
use newsroom_console::error::Result;
use newsroom_console::panels::config::BindForm;
use newsroom_console::render;
use newsroom_console::settings::Settings;
use newsroom_console::state::{ImageTarget, Page};
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

#[tokio::main]
#[instrument]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args.api_base, ?args.config, yes = args.yes, "Parsed CLI arguments");

    let settings = Settings::load(args.config.as_deref())?.with_api_base(args.api_base.clone());
    let client = ApiClient::new(&settings.api_base, settings.request_timeout())?;
    info!(api_base = %client.base(), "Backend client ready");

    let res = if args.yes {
        execute(Dashboard::new(client, AssumeYes, &settings), args.command).await
    } else {
        execute(Dashboard::new(client, StdinConfirm, &settings), args.command).await
    };

    let elapsed = start_time.elapsed();
    match res {
        Ok(()) => {
            info!(elapsed_ms = elapsed.as_millis() as u64, "Done");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, elapsed_ms = elapsed.as_millis() as u64, "Action failed");
            Err(e.into())
        }
    }
}

/// Run one command and flush its output and toasts, failed or not.
async fn execute<B: Backend, C: Confirm>(
    mut dash: Dashboard<B, C>,
    command: Command,
) -> Result<()> {
    let res = dispatch(&mut dash, command).await;
    if let Ok(out) = &res {
        if !out.is_empty() {
            println!("{out}");
        }
    }
    for toast in dash.toasts.drain() {
        eprintln!("{} {}", toast.kind.icon(), toast.message);
    }
    res.map(|_| ())
}

async fn dispatch<B: Backend, C: Confirm>(
    dash: &mut Dashboard<B, C>,
    command: Command,
) -> Result<String> {
    match command {
        Command::Dashboard => {
            dash.bootstrap().await?;
            Ok(dash.render())
        }
        Command::Health => {
            let health = dash.health().await?;
            Ok(format!("status: {}", health.status))
        }
        Command::News(cmd) => news(dash, cmd).await,
        Command::Articles(cmd) => articles(dash, cmd).await,
        Command::Drafts(cmd) => drafts(dash, cmd).await,
        Command::Config(cmd) => config(dash, cmd).await,
        Command::Wechat(cmd) => wechat(dash, cmd).await,
        Command::Scheduler(SchedulerCommand::Jobs) => {
            let jobs = dash.scheduler_jobs().await?;
            Ok(render::scheduler_jobs(&jobs))
        }
        Command::Scheduler(SchedulerCommand::History { limit }) => {
            let history = dash.scheduler_history(limit).await?;
            Ok(render::task_history(&history))
        }
    }
}

async fn news<B: Backend, C: Confirm>(
    dash: &mut Dashboard<B, C>,
    cmd: NewsCommand,
) -> Result<String> {
    match cmd {
        NewsCommand::List => dash.load_news().await?,
        NewsCommand::Scrape { source } => {
            dash.scrape(source).await?;
        }
        NewsCommand::Delete { id } => dash.delete_news(&id).await?,
    }
    Ok(render::news_list(&dash.state))
}

async fn articles<B: Backend, C: Confirm>(
    dash: &mut Dashboard<B, C>,
    cmd: ArticleCommand,
) -> Result<String> {
    dash.state.page = Page::Articles;
    match cmd {
        ArticleCommand::List => {
            dash.load_articles().await?;
            Ok(render::article_list(&dash.state))
        }
        ArticleCommand::Show { id } => dash.preview(&id).await,
        ArticleCommand::Generate { news_ids } => {
            // The ids come from the command line, so load the list they are
            // selected from first.
            dash.load_news().await?;
            for id in &news_ids {
                if dash.toggle_select(id).is_none() {
                    dash.toasts.info(format!("新闻 {id} 不在列表中，已忽略"));
                }
            }
            match dash.generate().await? {
                Some(article) => Ok(render::article_card(&article)),
                None => Ok(render::article_list(&dash.state)),
            }
        }
        ArticleCommand::Save { id, title, digest } => {
            dash.preview(&id).await?;
            if let Some(title) = title {
                dash.set_title(title)?;
            }
            if let Some(digest) = digest {
                dash.set_digest(digest)?;
            }
            dash.save().await?;
            Ok(render::article_list(&dash.state))
        }
        ArticleCommand::Regenerate { id } => {
            dash.preview(&id).await?;
            dash.regenerate().await
        }
        ArticleCommand::Images { id } => {
            let count = dash.generate_images(&id).await?;
            debug!(count, "Figures generated");
            Ok(render::article_list(&dash.state))
        }
        ArticleCommand::RegenerateImage { id, target, prompt } => {
            dash.preview(&id).await?;
            let target: ImageTarget = target.target();
            let stored = dash.open_image_regenerate(target)?;
            dash.submit_image_regenerate(prompt.as_deref().unwrap_or(&stored))
                .await?;
            Ok(dash.render())
        }
        ArticleCommand::Image { id, target, output } => {
            let path = dash.download_image(&id, target.target(), &output).await?;
            Ok(path.display().to_string())
        }
        ArticleCommand::Delete { id } => {
            dash.delete_article(&id).await?;
            Ok(render::article_list(&dash.state))
        }
        ArticleCommand::Push { id } => {
            dash.load_articles().await?;
            let media_id = dash.push_draft(&id).await?;
            Ok(format!("media_id: {media_id}"))
        }
    }
}

async fn drafts<B: Backend, C: Confirm>(
    dash: &mut Dashboard<B, C>,
    cmd: DraftCommand,
) -> Result<String> {
    dash.state.page = Page::Drafts;
    match cmd {
        DraftCommand::List => dash.load_drafts().await?,
        DraftCommand::Publish { media_id } => {
            let handle = dash.publish(&media_id).await?;
            return Ok(format!(
                "publish_id: {} (media_id: {})",
                handle.publish_id, handle.media_id
            ));
        }
        DraftCommand::Delete { media_id } => dash.delete_draft(&media_id).await?,
    }
    Ok(render::draft_list(&dash.state))
}

async fn config<B: Backend, C: Confirm>(
    dash: &mut Dashboard<B, C>,
    cmd: ConfigCommand,
) -> Result<String> {
    match cmd {
        ConfigCommand::Show => {
            dash.show_page(Page::Config).await?;
            Ok(dash.render())
        }
        ConfigCommand::Set { pairs } => {
            let mut form = dash.load_config().await?;
            for (key, value) in &pairs {
                form.set(key, value)?;
            }
            dash.save_config(&form).await?;
            Ok(dash
                .state
                .config
                .as_ref()
                .map(render::config_view)
                .unwrap_or_default())
        }
    }
}

async fn wechat<B: Backend, C: Confirm>(
    dash: &mut Dashboard<B, C>,
    cmd: WechatCommand,
) -> Result<String> {
    match cmd {
        WechatCommand::Bind {
            app_id,
            app_secret,
            account_name,
        } => {
            dash.open_bind_account();
            let form = BindForm {
                app_id,
                app_secret,
                account_name,
            };
            dash.bind_account(&form).await?;
        }
        WechatCommand::Status => dash.refresh_wechat_status().await?,
    }
    Ok(dash
        .wechat_status()
        .map(render::wechat_status)
        .unwrap_or_default())
}
