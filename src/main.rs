//! livescroll-lemmy: a live-updating Lemmy community viewer for the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐  PollMsg   ┌──────────┐  draw()  ┌──────────┐
//! │  poll.rs │ ─────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (tokio)  │  (channel) │ (state)  │          │ (render) │
//! └──────────┘            └──────────┘          └──────────┘
//!                              ▲
//!                              │ handle_key_event()
//!                         ┌──────────┐
//!                         │ input.rs │
//!                         └──────────┘
//! ```
//!
//! * **`source/`**: [`FeedItem`](source::FeedItem), the display form of a
//!   streamed post or comment.
//! * **`poll`**: runs the multi-community stream on the tokio runtime.
//! * **`app`**: owns all application state (items, scroll position, etc.).
//! * **`ui`**: pure rendering: reads `App` state and draws widgets.
//! * **`input`**: maps key events to `App` mutations.
//! * **`main`**: wires everything together: parse args, set up the terminal,
//!   and run the event loop.

mod app;
mod input;
mod poll;
mod source;
mod ui;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use livescroll_lemmy::stream::{SourceErrorPolicy, StreamOptions, DEFAULT_MAX_WAIT, DEFAULT_MIN_WAIT};
use livescroll_lemmy::{ClientConfig, Lemmy};

use app::App;
use poll::{PollConfig, PollMsg};

/// Watch Lemmy communities scroll by in the terminal.
#[derive(Debug, Parser)]
#[command(name = "livescroll-lemmy", version, about)]
struct Args {
    /// Base URL of the Lemmy instance.
    #[arg(long, env = "LEMMY_URL", default_value = "http://127.0.0.1:8536")]
    url: String,

    /// Username or email.  Anonymous when omitted.
    #[arg(long, env = "LEMMY_USERNAME", requires = "password")]
    username: Option<String>,

    #[arg(long, env = "LEMMY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Community name to watch.  Repeat for several.
    #[arg(long = "community", short = 'c', required = true)]
    communities: Vec<String>,

    /// Stream posts only, not comments.
    #[arg(long)]
    posts_only: bool,

    /// Only show content created after startup.
    #[arg(long)]
    skip_existing: bool,

    /// Stop after this many items.
    #[arg(long)]
    limit: Option<usize>,

    /// Shortest wait between polls, in seconds.
    #[arg(long, default_value_t = DEFAULT_MIN_WAIT.as_secs_f64())]
    min_wait: f64,

    /// Longest wait between polls, in seconds.
    #[arg(long, default_value_t = DEFAULT_MAX_WAIT.as_secs_f64())]
    max_wait: f64,

    /// Keep streaming the other communities when one fails.
    #[arg(long)]
    keep_going: bool,

    /// Write logs here.  The terminal belongs to the UI, so nothing is
    /// logged without it.
    #[arg(long, env = "LEMMY_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::new(&self.url).with_context(|| format!("bad --url {}", self.url))?;
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            config = config.with_credentials(username, password);
        }
        Ok(config)
    }

    fn poll_config(&self) -> Result<PollConfig> {
        let min_wait = Duration::try_from_secs_f64(self.min_wait).context("bad --min-wait")?;
        let max_wait = Duration::try_from_secs_f64(self.max_wait).context("bad --max-wait")?;
        let mut options = StreamOptions::default()
            .min_wait(min_wait)
            .max_wait(max_wait)
            .skip_existing(self.skip_existing);
        if let Some(limit) = self.limit {
            options = options.limit(limit);
        }
        Ok(PollConfig {
            options,
            posts_only: self.posts_only,
            policy: if self.keep_going {
                SourceErrorPolicy::Continue
            } else {
                SourceErrorPolicy::Abort
            },
        })
    }
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("can't create log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the default hook prints a panic.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;
    let poll_config = args.poll_config()?;

    let runtime = tokio::runtime::Runtime::new().context("can't start the tokio runtime")?;

    // Communities are resolved before the alternate screen is entered.
    let lemmy = Lemmy::new(args.client_config()?)?;
    let stream = runtime
        .block_on(lemmy.multi_communities_stream(args.communities.iter().map(String::as_str)))
        .context("can't resolve communities")?;

    let rx = poll::spawn(runtime.handle(), stream, poll_config);

    install_panic_hook();
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new().with_communities(args.communities.clone());

    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Drain any messages from the stream task.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);
    let mut received = 0usize;

    loop {
        let mut batch = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            match msg {
                PollMsg::Item(item) => batch.push(item),
                PollMsg::Finished(count) => {
                    received += app.merge_items(std::mem::take(&mut batch));
                    app.status = format!("Done after {count} items");
                }
                PollMsg::Error(e) => {
                    received += app.merge_items(std::mem::take(&mut batch));
                    app.status = format!("Error: {e}");
                }
            }
        }
        if !batch.is_empty() {
            received += app.merge_items(batch);
            app.status = format!("Streaming: {received} new");
        }

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    drop(guard);
    runtime.shutdown_background();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_build_stream_options() {
        let args = Args::try_parse_from([
            "livescroll-lemmy",
            "--url",
            "https://lemmy.example",
            "-c",
            "rust",
            "--community",
            "linux",
            "--skip-existing",
            "--limit",
            "20",
            "--min-wait",
            "0.5",
            "--max-wait",
            "30",
            "--keep-going",
        ])
        .unwrap();
        assert_eq!(args.communities, vec!["rust", "linux"]);

        let poll = args.poll_config().unwrap();
        assert_eq!(poll.options.min_wait, Duration::from_millis(500));
        assert_eq!(poll.options.max_wait, Duration::from_secs(30));
        assert_eq!(poll.options.limit, Some(20));
        assert!(poll.options.skip_existing);
        assert!(!poll.posts_only);
        assert_eq!(poll.policy, SourceErrorPolicy::Continue);

        let config = args.client_config().unwrap();
        assert_eq!(config.lemmy_url.as_str(), "https://lemmy.example/");
        assert!(!config.has_credentials());
    }

    #[test]
    fn negative_wait_is_rejected() {
        let args = Args::try_parse_from(["livescroll-lemmy", "-c", "rust", "--min-wait=-1"]).unwrap();
        assert!(args.poll_config().is_err());
    }

    #[test]
    fn community_is_required() {
        assert!(Args::try_parse_from(["livescroll-lemmy"]).is_err());
    }
}
