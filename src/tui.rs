use anyhow::Result;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph},
    Frame, Terminal,
};
use std::io;

use crate::chart::{Legend, LineChart, PointKind};
use crate::controller::{Command, ControllerHandle, Phase, View};
use crate::viz::value_range;

/// What a key press asks the event loop to do.
#[derive(Debug)]
pub enum KeyOutcome {
    Quit,
    Send(Command),
    Redraw,
}

/// Screen-local state; everything else comes from the controller's view.
#[derive(Debug, Default)]
pub struct App {
    selected: Option<usize>,
    amount: String,
    hover: Option<usize>,
}

impl App {
    pub fn new() -> App {
        App::default()
    }

    pub fn next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    pub fn previous(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn move_hover(&mut self, chart: Option<&LineChart>, forward: bool) {
        let Some(len) = chart.map(|c| c.data.len()).filter(|len| *len > 0) else {
            self.hover = None;
            return;
        };
        let current = self.hover.unwrap_or(0).min(len - 1);
        self.hover = Some(if forward {
            (current + 1).min(len - 1)
        } else {
            current.saturating_sub(1)
        });
    }

    fn selection_command(&self, view: &View) -> Command {
        let code = self
            .selected
            .and_then(|i| view.options.get(i))
            .map(|(code, _)| code.clone());
        Command::SelectionChanged(code)
    }

    /// Map a key press to a controller command. The amount field takes the
    /// characters a numeric input accepts; presence is all the button checks.
    pub fn on_key(&mut self, key: KeyEvent, view: &View) -> KeyOutcome {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyOutcome::Quit,
            KeyCode::Char('q') | KeyCode::Esc => KeyOutcome::Quit,
            KeyCode::Down => {
                self.next(view.options.len());
                KeyOutcome::Send(self.selection_command(view))
            }
            KeyCode::Up => {
                self.previous(view.options.len());
                KeyOutcome::Send(self.selection_command(view))
            }
            KeyCode::Left => {
                self.move_hover(view.chart.as_ref(), false);
                KeyOutcome::Redraw
            }
            KeyCode::Right => {
                self.move_hover(view.chart.as_ref(), true);
                KeyOutcome::Redraw
            }
            KeyCode::Backspace => {
                self.amount.pop();
                KeyOutcome::Send(Command::InputChanged(self.amount.clone()))
            }
            KeyCode::Char(c) if c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E') => {
                self.amount.push(c);
                KeyOutcome::Send(Command::InputChanged(self.amount.clone()))
            }
            KeyCode::Enter => KeyOutcome::Send(Command::ActionTriggered),
            _ => KeyOutcome::Redraw,
        }
    }
}

fn kind_color(kind: PointKind) -> Color {
    let rgb = kind.color();
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

pub async fn run_app<B: Backend>(terminal: &mut Terminal<B>, handle: &ControllerHandle) -> Result<()> {
    let mut app = App::new();
    let mut view_rx = handle.view();
    let mut events = EventStream::new();

    loop {
        let view = view_rx.borrow_and_update().clone();
        terminal.draw(|f| draw_ui(f, &app, &view))?;

        tokio::select! {
            changed = view_rx.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    match app.on_key(key, &view) {
                        KeyOutcome::Quit => return Ok(()),
                        KeyOutcome::Send(command) => handle.send(command)?,
                        KeyOutcome::Redraw => {}
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
                _ => {}
            }
        }
    }
}

fn draw_ui(f: &mut Frame, app: &App, view: &View) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .split(f.size());

    let title = Paragraph::new("Conversor de Monedas · mindicador.cl")
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(rows[1]);

    draw_currency_list(f, app, view, columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(5),
        ])
        .split(columns[1]);

    let button_style = if view.button_enabled {
        Style::default().fg(Color::Black).bg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let amount = Paragraph::new(Line::from(vec![
        Span::raw(app.amount.as_str()),
        Span::raw("   "),
        Span::styled(" Buscar [Enter] ", button_style),
    ]))
    .block(Block::default().title("Monto (CLP)").borders(Borders::ALL));
    f.render_widget(amount, right[0]);

    let results_style = match view.phase {
        Phase::Error => Style::default().fg(Color::Red),
        Phase::Result => Style::default().fg(Color::Green),
        _ => Style::default(),
    };
    let results_title = if view.history_pending {
        "Resultado (cargando histórico...)"
    } else {
        "Resultado"
    };
    let results = Paragraph::new(view.results.clone().unwrap_or_default())
        .style(results_style)
        .block(Block::default().title(results_title).borders(Borders::ALL));
    f.render_widget(results, right[1]);

    draw_chart(f, app, view, right[2]);
    draw_legend(f, view, right[3]);

    let help = Paragraph::new("↑/↓ moneda · dígitos monto · Enter convertir · ←/→ recorrer gráfico · q salir")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, rows[2]);
}

fn draw_currency_list(f: &mut Frame, app: &App, view: &View, area: ratatui::layout::Rect) {
    let items: Vec<ListItem> = view
        .options
        .iter()
        .enumerate()
        .map(|(i, (code, name))| {
            let style = if Some(i) == app.selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![Span::styled(
                format!("{} ({})", name, code),
                style,
            )]))
        })
        .collect();

    let title = if view.currencies_failed {
        "Monedas (error)"
    } else {
        "Monedas"
    };
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(list, area);
}

fn draw_chart(f: &mut Frame, app: &App, view: &View, area: ratatui::layout::Rect) {
    let block = Block::default().borders(Borders::ALL);
    let Some(chart) = view.chart.as_ref() else {
        f.render_widget(block.title("Historial"), area);
        return;
    };

    let data = &chart.data;
    let points: Vec<(f64, f64)> = data
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect();
    let subset = |kind: PointKind| -> Vec<(f64, f64)> {
        data.indices_of(kind)
            .into_iter()
            .map(|i| points[i])
            .collect()
    };
    let max_points = subset(PointKind::Max);
    let min_points = subset(PointKind::Min);
    let hover = app.hover.filter(|i| *i < points.len());
    let hover_points: Vec<(f64, f64)> = hover.map(|i| points[i]).into_iter().collect();

    let datasets = vec![
        Dataset::default()
            .name(chart.title.as_str())
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(kind_color(PointKind::Default)))
            .data(&points),
        Dataset::default()
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(kind_color(PointKind::Max)))
            .data(&max_points),
        Dataset::default()
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(kind_color(PointKind::Min)))
            .data(&min_points),
        Dataset::default()
            .marker(Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::White))
            .data(&hover_points),
    ];

    let (y_low, y_high) = value_range(data.min, data.max);
    let x_high = (data.len().max(2) - 1) as f64;
    let first = data.labels.first().cloned().unwrap_or_default();
    let last = data.labels.last().cloned().unwrap_or_default();

    let title = hover
        .and_then(|i| chart.tooltip(i))
        .unwrap_or_else(|| "Historial".to_string());

    let widget = Chart::new(datasets)
        .block(block.title(title))
        .x_axis(
            Axis::default()
                .bounds([0.0, x_high])
                .labels(vec![Span::raw(first), Span::raw(last)]),
        )
        .y_axis(
            Axis::default()
                .bounds([y_low, y_high])
                .labels(vec![
                    Span::raw(format!("{:.2}", y_low)),
                    Span::raw(format!("{:.2}", y_high)),
                ]),
        );
    f.render_widget(widget, area);
}

fn draw_legend(f: &mut Frame, view: &View, area: ratatui::layout::Rect) {
    let lines: Vec<Line> = match &view.legend {
        Some(Legend::Entries(entries)) => entries
            .iter()
            .map(|entry| {
                Line::from(vec![
                    Span::styled("■ ", Style::default().fg(kind_color(entry.kind))),
                    Span::raw(entry.label),
                ])
            })
            .collect(),
        Some(Legend::Message(message)) => vec![Line::from(Span::styled(
            message.as_str(),
            Style::default().fg(Color::Red),
        ))],
        None => Vec::new(),
    };

    let legend = Paragraph::new(lines).block(Block::default().title("Leyenda").borders(Borders::ALL));
    f.render_widget(legend, area);
}

pub async fn start_tui(handle: &ControllerHandle) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, handle).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn view_with_options() -> View {
        View {
            options: vec![
                ("dolar".to_string(), "Dólar observado".to_string()),
                ("euro".to_string(), "Euro".to_string()),
            ],
            ..View::default()
        }
    }

    #[test]
    fn test_selection_wraps() {
        let mut app = App::new();
        app.next(2);
        assert_eq!(app.selected, Some(0));
        app.next(2);
        app.next(2);
        assert_eq!(app.selected, Some(0));
        app.previous(2);
        assert_eq!(app.selected, Some(1));
    }

    #[test]
    fn test_empty_list_keeps_no_selection() {
        let mut app = App::new();
        app.next(0);
        app.previous(0);
        assert_eq!(app.selected, None);
    }

    #[test]
    fn test_arrow_sends_selected_code() {
        let mut app = App::new();
        let view = view_with_options();
        app.on_key(key(KeyCode::Down), &view);
        match app.on_key(key(KeyCode::Down), &view) {
            KeyOutcome::Send(Command::SelectionChanged(Some(code))) => assert_eq!(code, "euro"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_amount_editing() {
        let mut app = App::new();
        let view = View::default();
        app.on_key(key(KeyCode::Char('1')), &view);
        app.on_key(key(KeyCode::Char('x')), &view);
        app.on_key(key(KeyCode::Char('0')), &view);
        assert_eq!(app.amount, "10");

        match app.on_key(key(KeyCode::Backspace), &view) {
            KeyOutcome::Send(Command::InputChanged(amount)) => assert_eq!(amount, "1"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(matches!(app.on_key(key(KeyCode::Char('q')), &view), KeyOutcome::Quit));
        assert!(matches!(
            app.on_key(key(KeyCode::Enter), &view),
            KeyOutcome::Send(Command::ActionTriggered)
        ));
    }
}
