use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use super::client::{SearchBackend, spawn_search};
use super::navigation::Selection;
use super::types::WidgetEvent;
use super::ui_utils::{list_item_index_at, open_url_in_browser, point_in_rect, result_metadata_line};
use super::widget::SearchWidget;

const TICK_RATE: Duration = Duration::from_millis(50);
const RESULT_ITEM_HEIGHT: u16 = 3;

#[derive(Debug, Default)]
pub struct ViewState {
    list_state: ListState,
    results_area: Option<Rect>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    Continue,
    Navigate(String),
    Quit,
}

pub fn draw_loop<B: SearchBackend>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    widget: &mut SearchWidget,
    backend: Arc<B>,
    tx: UnboundedSender<WidgetEvent>,
    rx: &mut UnboundedReceiver<WidgetEvent>,
) -> io::Result<()> {
    let mut view = ViewState::default();

    loop {
        while let Ok(event) = rx.try_recv() {
            widget.apply(event);
        }

        if let Some(request) = widget.poll_search(Instant::now()) {
            spawn_search(Arc::clone(&backend), request, tx.clone());
        }

        terminal.draw(|f| draw_widget(f, widget, &mut view))?;

        let timeout = widget
            .time_until_search(Instant::now())
            .map_or(TICK_RATE, |left| left.min(TICK_RATE));
        if !event::poll(timeout)? {
            continue;
        }

        let outcome = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                handle_key(widget, key, Instant::now())
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => view
                    .results_area
                    .filter(|area| point_in_rect(mouse.column, mouse.row, *area))
                    .and_then(|area| {
                        list_item_index_at(
                            area,
                            mouse.row,
                            RESULT_ITEM_HEIGHT,
                            view.list_state.offset(),
                        )
                    })
                    .and_then(|idx| widget.activate_index(idx).url().map(str::to_string))
                    .map_or(InputOutcome::Continue, InputOutcome::Navigate),
                MouseEventKind::ScrollDown => {
                    widget.move_down();
                    InputOutcome::Continue
                }
                MouseEventKind::ScrollUp => {
                    widget.move_up();
                    InputOutcome::Continue
                }
                _ => InputOutcome::Continue,
            },
            _ => InputOutcome::Continue,
        };

        match outcome {
            InputOutcome::Continue => {}
            InputOutcome::Quit => break,
            InputOutcome::Navigate(url) => {
                info!(%url, "opening in browser");
                if let Err(err) = open_url_in_browser(&url) {
                    warn!(%url, "failed to open link in browser: {err}");
                    widget.push_error(format!("failed to open link in browser: {err}"));
                }
            }
        }
    }

    Ok(())
}

pub fn handle_key(widget: &mut SearchWidget, key: KeyEvent, now: Instant) -> InputOutcome {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => return InputOutcome::Quit,
        KeyCode::Char('u') if ctrl => widget.clear_input(now),
        KeyCode::Char('n') if ctrl => widget.move_down(),
        KeyCode::Char('p') if ctrl => widget.move_up(),
        KeyCode::Esc => {
            if widget.selection() == Selection::Unselected {
                return InputOutcome::Quit;
            }
            widget.unselect();
        }
        KeyCode::Down => widget.move_down(),
        KeyCode::Up => widget.move_up(),
        KeyCode::Enter => {
            if let Some(url) = widget.activate().url() {
                return InputOutcome::Navigate(url.to_string());
            }
        }
        KeyCode::Backspace => widget.pop_char(now),
        KeyCode::Char(ch) => {
            // AltGr arrives as CONTROL | ALT and still produces text.
            let alt = key.modifiers.contains(KeyModifiers::ALT);
            if ctrl == alt {
                widget.push_char(ch, now);
            }
        }
        _ => {}
    }
    InputOutcome::Continue
}

pub fn draw_widget(f: &mut Frame, widget: &SearchWidget, view: &mut ViewState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(5),
        ])
        .split(f.area());

    let input_title = if widget.is_searching() {
        "Search - searching..."
    } else {
        "Search"
    };
    let input_focused = widget.selection() == Selection::Unselected;
    let input = Paragraph::new(widget.input()).block(
        Block::default()
            .title(input_title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if input_focused {
                Color::Cyan
            } else {
                Color::DarkGray
            })),
    );
    f.render_widget(input, chunks[0]);
    if input_focused {
        let input_width = u16::try_from(Line::raw(widget.input()).width()).unwrap_or(u16::MAX);
        let max_x = chunks[0].x.saturating_add(chunks[0].width.saturating_sub(2));
        let cursor_x = chunks[0].x.saturating_add(1).saturating_add(input_width);
        f.set_cursor_position((cursor_x.min(max_x), chunks[0].y + 1));
    }

    view.results_area = None;
    if widget.results_visible() {
        let items = widget
            .results()
            .iter()
            .map(|result| {
                let title = if result.title.is_empty() {
                    "(untitled)"
                } else {
                    result.title.as_str()
                };
                ListItem::new(vec![
                    Line::from(Span::styled(
                        title.to_string(),
                        Style::default()
                            .fg(Color::White)
                            .add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        result.url.clone(),
                        Style::default().fg(Color::LightBlue),
                    )),
                    Line::from(Span::styled(
                        result_metadata_line(result, &Local),
                        Style::default()
                            .fg(Color::Gray)
                            .add_modifier(Modifier::ITALIC),
                    )),
                ])
            })
            .collect::<Vec<_>>();
        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!("Results ({})", widget.results().len()))
                    .borders(Borders::ALL),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        view.list_state.select(widget.selection().index());
        f.render_stateful_widget(list, chunks[1], &mut view.list_state);
        view.results_area = Some(chunks[1]);
    } else {
        let hint = if widget.input().trim().is_empty() {
            "Type to search your browser history."
        } else if widget.is_searching() {
            "Searching..."
        } else {
            "No matching history. Press Enter to search the web."
        };
        f.render_widget(
            Paragraph::new(hint)
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL))
                .wrap(Wrap { trim: true }),
            chunks[1],
        );
    }

    let key_style = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(Color::Gray);
    let mut footer_lines = vec![Line::from(Span::styled(
        widget.updated_line().to_string(),
        label_style,
    ))];
    if let Some(error) = widget.errors().next() {
        footer_lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )));
    }
    footer_lines.push(Line::from(vec![
        Span::styled("Up/Down", key_style),
        Span::styled(" select  ", label_style),
        Span::styled("Enter", key_style),
        Span::styled(" open  ", label_style),
        Span::styled("Ctrl+U", key_style),
        Span::styled(" clear  ", label_style),
        Span::styled("Esc", key_style),
        Span::styled(" back/quit", label_style),
    ]));
    f.render_widget(
        Paragraph::new(footer_lines)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true }),
        chunks[2],
    );
}
