//! Pure view/render functions for the TUI.
//!
//! Functions here take `&AppState` by immutable reference, draw to a ratatui
//! Frame, and never mutate state or return effects.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use finq_core::router::{AuthStage, Route};

use crate::state::AppState;
use crate::views::{budgeting, dashboard, expenses, login, profile, reports, signup};

const SIDEBAR_WIDTH: u16 = 18;
const STATUS_HEIGHT: u16 = 1;

/// Spinner frames for the splash and status line.
const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

/// Renders the entire TUI to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();

    match app.stage {
        AuthStage::Unknown => render_splash(app, frame, area),
        AuthStage::Unauthenticated => match app.route {
            Route::Signup => signup::render(frame, &app.signup, area),
            _ => login::render(frame, &app.login, area),
        },
        AuthStage::Authenticated => render_shell(app, frame, area),
    }
}

/// Full-screen splash while the initial session check is in flight.
fn render_splash(app: &AppState, frame: &mut Frame, area: Rect) {
    let spinner = SPINNER_FRAMES[app.spinner_frame % SPINNER_FRAMES.len()];
    let lines = vec![
        Line::default(),
        Line::from(Span::styled(
            "finq",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(format!("{spinner} Checking session...")),
    ];
    let splash = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(splash, area);
}

/// Sidebar + content + status line layout for the signed-in app.
fn render_shell(app: &AppState, frame: &mut Frame, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(STATUS_HEIGHT)])
        .split(area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
        .split(rows[0]);

    render_sidebar(app, frame, cols[0]);
    render_content(app, frame, cols[1]);
    render_status_line(app, frame, rows[1]);
}

fn render_sidebar(app: &AppState, frame: &mut Frame, area: Rect) {
    let items: Vec<ListItem> = Route::all()
        .iter()
        .filter(|route| !route.is_public_auth())
        .enumerate()
        .map(|(i, route)| {
            let style = if *route == app.route {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(route.label().to_string(), style),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " finq ",
            Style::default().add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(List::new(items).block(block), area);
}

fn render_content(app: &AppState, frame: &mut Frame, area: Rect) {
    let currency = app.currency().to_string();
    match app.route {
        Route::Dashboard => dashboard::render(frame, &app.dashboard, &currency, area),
        Route::Expenses => expenses::render(frame, &app.expenses, &currency, area),
        Route::Budgeting => budgeting::render(frame, &app.budgeting, &currency, area),
        Route::Reports => reports::render(frame, &app.reports, area),
        Route::Profile => profile::render(frame, &app.profile, app.user_id.as_deref(), area),
        Route::Login => login::render(frame, &app.login, area),
        Route::Signup => signup::render(frame, &app.signup, area),
    }
}

fn render_status_line(app: &AppState, frame: &mut Frame, area: Rect) {
    let spans: Vec<Span> = if let Some(notice) = &app.notice {
        let color = if notice.error { Color::Red } else { Color::Green };
        let budget = area.width.saturating_sub(14) as usize;
        vec![
            Span::styled(
                crate::common::truncate_with_ellipsis(&notice.text, budget),
                Style::default().fg(color),
            ),
            Span::raw("  "),
            Span::styled("Esc", Style::default().fg(Color::DarkGray)),
            Span::raw(" dismiss"),
        ]
    } else {
        let mut spans = vec![
            Span::styled("1-5", Style::default().fg(Color::DarkGray)),
            Span::raw(" views  "),
            Span::styled("o", Style::default().fg(Color::DarkGray)),
            Span::raw(" sign out  "),
            Span::styled("q", Style::default().fg(Color::DarkGray)),
            Span::raw(" quit"),
        ];
        if let Some(user_id) = &app.user_id {
            spans.push(Span::styled(
                format!("  {}", finq_core::session::mask_token(user_id)),
                Style::default().fg(Color::DarkGray),
            ));
        }
        spans
    };

    let status = Paragraph::new(Line::from(spans)).alignment(Alignment::Left);
    frame.render_widget(status, area);
}
