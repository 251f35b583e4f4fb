use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use postfeed_lib::AppState;
use postfeed_lib::application::ports::{NoopKeyboard, PostApi};
use postfeed_lib::domain::entities::User;
use postfeed_lib::infrastructure::api::InMemoryPostApi;
use postfeed_lib::presentation::components::{
    CreatePostForm, DeleteOutcome, HomeScreen, PostDetailScreen, SubmitOutcome,
};
use postfeed_lib::presentation::console::ConsoleNotifier;
use postfeed_lib::presentation::dto::{HomeScreenView, PostDetailView};
use postfeed_lib::shared::{AppConfig, Platform, logging};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "post-feed")]
#[command(about = "Browse and edit the posts feed from a terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL
    #[arg(long, env = "POSTFEED_API_URL")]
    api_url: Option<String>,

    /// Target platform (web, mobile)
    #[arg(long, env = "POSTFEED_PLATFORM")]
    platform: Option<String>,

    /// Use a process-local API signed in as `offline-user`
    #[arg(long)]
    offline: bool,

    /// Enable JSON logging
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the newest posts
    List,
    /// Show a single post
    Show { id: String },
    /// Create a post
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    /// Delete a post (author only)
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init("post-feed", cli.json_logs);

    let mut config = AppConfig::from_env();
    if let Some(url) = cli.api_url {
        config.api.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(platform) = cli.platform {
        config.platform = platform
            .parse::<Platform>()
            .map_err(|_| anyhow::anyhow!("unknown platform: {platform}"))?;
    }

    let state = build_state(config, cli.offline)?;
    info!(platform = %state.platform(), offline = cli.offline, "post-feed starting");

    match cli.command {
        Commands::List => list(&state).await,
        Commands::Show { id } => show(&state, &id).await,
        Commands::Create { title, content } => create(&state, title, content).await,
        Commands::Delete { id } => delete(&state, &id).await,
    }
}

fn build_state(config: AppConfig, offline: bool) -> Result<AppState> {
    let notifier = Arc::new(ConsoleNotifier);
    if offline {
        let api: Arc<dyn PostApi> =
            Arc::new(InMemoryPostApi::signed_in(User::new("offline-user").with_name("Offline")));
        return Ok(AppState::new(config, api, notifier, Arc::new(NoopKeyboard)));
    }

    let state = AppState::from_config(config, notifier).context("invalid configuration")?;
    debug!(api = %state.config.api.base_url, "using HTTP API");
    Ok(state)
}

async fn list(state: &AppState) -> Result<()> {
    let mut screen = HomeScreen::mount(state).await;
    let view = screen.settled().await?;
    print_feed(&view)
}

async fn show(state: &AppState, id: &str) -> Result<()> {
    let mut screen = PostDetailScreen::mount(state, id).await;
    match screen.settled().await? {
        PostDetailView::Found { post } => {
            println!("{}\n\n{}", post.title, post.content);
            Ok(())
        }
        PostDetailView::NotFound => bail!("post {id} not found"),
        PostDetailView::Error { message } => bail!(message),
        PostDetailView::Loading => bail!("post {id} did not load"),
    }
}

async fn create(state: &AppState, title: String, content: String) -> Result<()> {
    // 作成後の再取得を観測するため一覧を先に購読しておく
    let mut screen = HomeScreen::mount(state).await;
    screen.settled().await?;

    let form = CreatePostForm::new(state);
    form.set_title(title).await;
    form.set_content(content).await;

    match form.submit().await {
        SubmitOutcome::Created(post) => {
            println!("created {}", post.id);
            print_feed(&screen.view())
        }
        SubmitOutcome::Invalid(_) => {
            let view = form.view().await;
            for error in [view.title_error, view.content_error].into_iter().flatten() {
                eprintln!("{error}");
            }
            bail!("post was rejected")
        }
        SubmitOutcome::Unauthorized => bail!("not signed in"),
        SubmitOutcome::Failed(err) => Err(err.into()),
        SubmitOutcome::Ignored => bail!("a submission is already in progress"),
    }
}

async fn delete(state: &AppState, id: &str) -> Result<()> {
    let mut screen = HomeScreen::mount(state).await;
    screen.settled().await?;

    let Some(card) = screen.card(id) else {
        bail!("post {id} is not in the feed");
    };
    match card.delete().await {
        DeleteOutcome::Deleted => {
            println!("deleted {id}");
            Ok(())
        }
        DeleteOutcome::Unauthorized => bail!("only the author can delete this post"),
        DeleteOutcome::Failed(err) => Err(err.into()),
    }
}

fn print_feed(view: &HomeScreenView) -> Result<()> {
    if let Some(error) = &view.error {
        bail!("failed to load posts: {error}");
    }
    if view.posts.is_empty() {
        println!("No posts yet");
        return Ok(());
    }
    for post in &view.posts {
        let author = post.author_name.as_deref().unwrap_or("anonymous");
        println!("{}  {}  ({author})\n    {}", post.href, post.title, post.content);
    }
    Ok(())
}
