use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{Local, TimeZone};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::client::{HttpBackend, SearchBackend, spawn_last_updated};
use super::types::{Cli, SearchResult, WidgetEvent};
use super::tui::draw_loop;
use super::ui_utils::{format_update_line, result_metadata_line};
use super::widget::SearchWidget;

pub async fn run() -> io::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;
    info!(server = %cli.server, "starting pastpath {}", env!("CARGO_PKG_VERSION"));

    let backend = HttpBackend::new(&cli.server, cli.request_timeout())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let backend = Arc::new(backend);

    if cli.no_tui {
        return run_headless(&cli, backend).await;
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<WidgetEvent>();
    spawn_last_updated(Arc::clone(&backend), tx.clone());

    let mut widget = SearchWidget::new(cli.provider.clone(), cli.debounce_delay());
    if let Some(query) = cli.query.as_deref() {
        widget.set_input(query, Instant::now());
    }

    run_tui(&mut widget, backend, tx, &mut rx)
}

fn init_tracing(cli: &Cli) -> io::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pastpath=info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    // The terminal belongs to the UI, so TUI logs only go to an explicit file.
    match (cli.log_file.as_deref(), cli.no_tui) {
        (Some(path), _) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            subscriber
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        (None, true) => subscriber.with_writer(io::stderr).init(),
        (None, false) => subscriber.with_writer(io::sink).init(),
    }
    Ok(())
}

async fn run_headless<B: SearchBackend>(cli: &Cli, backend: Arc<B>) -> io::Result<()> {
    let query = cli
        .query
        .as_deref()
        .map(str::trim)
        .filter(|query| !query.is_empty())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "--no-tui requires --query"))?;

    let (updated, results) = tokio::join!(backend.last_updated(), backend.search(query));
    let updated_line = match updated {
        Ok(info) => Some(format_update_line(&info, &Local)),
        Err(err) => {
            warn!("error fetching last updated info: {err}");
            None
        }
    };
    let results = results.map_err(io::Error::other)?;

    write_report(&mut io::stdout().lock(), updated_line.as_deref(), &results, &Local)?;
    info!(count = results.len(), %query, "finished search");
    Ok(())
}

fn write_report<W, Tz>(
    out: &mut W,
    updated_line: Option<&str>,
    results: &[SearchResult],
    tz: &Tz,
) -> io::Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if let Some(line) = updated_line {
        writeln!(out, "{line}")?;
    }
    if results.is_empty() {
        writeln!(out, "no matching history")?;
    }
    for result in results {
        writeln!(out)?;
        writeln!(out, "{}", result.title)?;
        writeln!(out, "  {}", result.url)?;
        writeln!(out, "  {}", result_metadata_line(result, tz))?;
    }
    out.flush()
}

fn run_tui<B: SearchBackend>(
    widget: &mut SearchWidget,
    backend: Arc<B>,
    tx: mpsc::UnboundedSender<WidgetEvent>,
    rx: &mut mpsc::UnboundedReceiver<WidgetEvent>,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend_term = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend_term)?;
    terminal.clear()?;

    let tui_result = draw_loop(&mut terminal, widget, backend, tx, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    tui_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn report_lists_results_after_update_line() {
        let results = vec![SearchResult {
            title: "Example".to_string(),
            url: "https://example.com".to_string(),
            visit_count: 3,
            last_visit_time: 1_700_000_000,
        }];
        let mut out = Vec::new();
        write_report(
            &mut out,
            Some("Updated: 2023-11-14 22:13:20, Version: v1"),
            &results,
            &Utc,
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Updated: 2023-11-14 22:13:20, Version: v1\n\
             \n\
             Example\n  https://example.com\n  3 visits | last visit: 2023-11-14 22:13:20\n"
        );
    }

    #[test]
    fn report_without_results_says_so() {
        let mut out = Vec::new();
        write_report(&mut out, None, &[], &Utc).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "no matching history\n");
    }
}
