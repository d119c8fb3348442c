//! Reply bot: answers simple questions in a community with a
//! "Let me google that for you" link.
//!
//! ```text
//! LEMMY_URL=http://127.0.0.1:8536 LEMMY_USERNAME=lemmy LEMMY_PASSWORD=lemmylemmy \
//!     lmgtfy --community test
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::form_urlencoded;

use livescroll_lemmy::api::{CreateComment, GetPosts};
use livescroll_lemmy::models::Post;
use livescroll_lemmy::{ClientConfig, Lemmy, StreamOptions};

const QUESTIONS: [&str; 3] = ["what is", "who is", "what are"];
const MAX_TITLE_WORDS: usize = 10;

#[derive(Debug, Parser)]
#[command(name = "lmgtfy", version, about = "Reply to simple questions with a search link")]
struct Args {
    #[arg(long, env = "LEMMY_URL")]
    url: String,

    #[arg(long, env = "LEMMY_USERNAME")]
    username: String,

    #[arg(long, env = "LEMMY_PASSWORD", hide_env_values = true)]
    password: String,

    #[arg(long, env = "LEMMY_USER_AGENT", default_value = "LMGTFY (by u/USERNAME)")]
    user_agent: String,

    /// Community to watch.
    #[arg(long, short = 'c', default_value = "test")]
    community: String,

    /// Also answer posts that existed before startup.
    #[arg(long)]
    include_existing: bool,
}

/// The reply for `title`, or `None` if it isn't a short question.
fn reply_for(title: &str) -> Option<String> {
    if title.split_whitespace().count() > MAX_TITLE_WORDS {
        return None;
    }
    let normalized = title.to_lowercase();
    if !QUESTIONS.iter().any(|phrase| normalized.contains(phrase)) {
        return None;
    }
    let query: String = form_urlencoded::byte_serialize(title.as_bytes()).collect();
    Some(format!("[Let me google that for you](https://lmgtfy.com/?q={query})"))
}

async fn process_post(post: &Post) -> Result<()> {
    let Some(reply) = reply_for(post.name()) else {
        return Ok(());
    };
    info!(post = post.id(), title = post.name(), "replying");
    post.create_comment(&reply, CreateComment::default())
        .await
        .with_context(|| format!("replying to post {}", post.id()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init();

    let args = Args::parse();
    let config = ClientConfig::new(&args.url)?
        .with_credentials(&args.username, &args.password)
        .with_user_agent(&args.user_agent);
    let lemmy = Lemmy::new(config)?;
    lemmy.login().await.context("login failed")?;

    let community = lemmy
        .get_community(args.community.as_str())
        .await
        .with_context(|| format!("can't find c/{}", args.community))?;
    info!(community = community.name(), "watching for questions");

    let options = StreamOptions::default().skip_existing(!args.include_existing);
    let mut posts = community.stream().posts(options, GetPosts::default());
    while let Some(post) = posts.next().await {
        let post = post?;
        if let Err(e) = process_post(&post).await {
            let message = format!("{e:#}");
            warn!(error = %message, "reply failed");
        }
    }
    Ok(())
}
