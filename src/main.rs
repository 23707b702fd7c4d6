// Binary includes library modules - some public API items are only for library consumers
#![allow(unused)]

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    Terminal,
};

mod api;
mod app;
mod backend;
mod config;
mod data;
mod events;
mod logging;
mod overlay;
mod route;
mod source;
mod ui;

use api::ApiClient;
use app::App;
use backend::Backend;
use config::{Overrides, Settings};
use route::Route;
use source::Poller;

#[derive(Parser, Debug)]
#[command(name = "dockwatch")]
#[command(about = "Terminal dashboard for a container and service monitoring backend")]
#[command(version)]
struct Args {
    /// Base URL of the backend's dashboard API
    #[arg(short, long)]
    backend: Option<String>,

    /// Replace the port of the backend URL
    #[arg(short, long)]
    port: Option<u16>,

    /// Initial tab, e.g. "/dashboard/containers/web" or "jmx"
    #[arg(long, default_value = "")]
    view: String,

    /// Poll interval in seconds
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs to this file (logging is off without it)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = Overrides {
        backend_url: args.backend,
        port_override: args.port,
        refresh_secs: args.refresh,
        timeout_secs: args.timeout,
        log_file: args.log_file,
    };
    let settings = Settings::load(args.config.as_deref(), &overrides)?;

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = logging::init(settings.log_file.as_deref())?;

    let base_url = settings.base_url()?;
    tracing::info!(backend = %base_url, refresh_secs = settings.refresh_secs, "Starting dockwatch");

    // The runtime runs the poller and all fetches; the terminal loop stays on this thread
    let rt = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;

    let client = ApiClient::builder()
        .base_url(&base_url)
        .timeout(settings.timeout())
        .build()?;

    let poller = Poller::start(
        rt.handle(),
        Arc::new(client.clone()),
        settings.refresh_interval(),
    );
    let backend = Backend::new(client, rt.handle().clone(), ".");
    let app = App::new(
        poller,
        backend,
        Route::parse(&args.view),
        ui::Theme::auto_detect(),
        config::version_label(),
    );

    let result = run_tui(app);

    rt.shutdown_timeout(Duration::from_secs(1));
    result
}

/// Run the TUI until the user quits
fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);
    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Exiting with error");
    }
    result
}

/// Five centred rows for the "terminal too small" notice, clamped to `area`.
fn size_notice_area(area: Rect) -> Rect {
    Rect::new(
        area.x,
        area.y + (area.height / 2).saturating_sub(2),
        area.width,
        area.height.min(5),
    )
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        // Apply poll outcomes and fetch results that arrived since the last frame
        app.process_updates();
        app.table_geometry.set(None);

        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                frame.render_widget(paragraph, size_notice_area(area));
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            // Graph widths follow the terminal
            app.content_width = chunks[2].width;

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            // Render current tab
            match app.current_view.entity_kind() {
                Some(kind) => ui::entities::render(frame, app, chunks[2], kind),
                None => ui::pages::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            // Render the open window on top
            ui::detail::render_overlay(frame, app, area);
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    // Content starts after header (1) + tabs (1)
                    events::handle_mouse_event(app, mouse, 2);
                }
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }
    }

    Ok(())
}
