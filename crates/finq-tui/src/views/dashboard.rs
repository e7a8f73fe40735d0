//! Dashboard screen: totals, budget gauge, recent transactions.

use finq_types::{DashboardSummary, format_amount};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use crate::common::Remote;

#[derive(Debug, Default)]
pub struct DashboardState {
    pub data: Remote<DashboardSummary>,
}

pub fn render(frame: &mut Frame, state: &DashboardState, currency: &str, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Dashboard ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match &state.data {
        Remote::NotLoaded | Remote::Loading { .. } => {
            frame.render_widget(
                Paragraph::new(Span::styled("Loading...", Style::default().fg(Color::Yellow))),
                inner,
            );
        }
        Remote::Failed(message) => {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::from(Span::styled(
                        message.clone(),
                        Style::default().fg(Color::Red),
                    )),
                    Line::from(Span::styled(
                        "g to retry",
                        Style::default().fg(Color::DarkGray),
                    )),
                ]),
                inner,
            );
        }
        Remote::Ready(summary) => render_summary(frame, summary, currency, inner),
    }
}

fn render_summary(frame: &mut Frame, summary: &DashboardSummary, currency: &str, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(area);

    let net = summary.net();
    let net_color = if net < 0.0 { Color::Red } else { Color::Green };
    let totals = vec![
        Line::from(vec![
            Span::raw("Income   "),
            Span::styled(
                format_amount(summary.income_total, currency),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(vec![
            Span::raw("Expenses "),
            Span::styled(
                format_amount(summary.expense_total, currency),
                Style::default().fg(Color::Red),
            ),
        ]),
        Line::from(vec![
            Span::raw("Net      "),
            Span::styled(
                format_amount(net, currency),
                Style::default().fg(net_color).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];
    frame.render_widget(Paragraph::new(totals), chunks[0]);

    // Budget gauge: spent against goal, clamped for overspend.
    let ratio = if summary.budget_goal > 0.0 {
        (summary.budget_spent / summary.budget_goal).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let gauge_color = if ratio >= 1.0 {
        Color::Red
    } else if ratio >= 0.8 {
        Color::Yellow
    } else {
        Color::Green
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Monthly budget "))
        .gauge_style(Style::default().fg(gauge_color))
        .ratio(ratio)
        .label(format!(
            "{} of {}",
            format_amount(summary.budget_spent, currency),
            format_amount(summary.budget_goal, currency),
        ));
    frame.render_widget(gauge, chunks[1]);

    let mut lines = vec![Line::from(Span::styled(
        "Recent transactions",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if summary.recent_transactions.is_empty() {
        lines.push(Line::from(Span::styled(
            "No transactions yet",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for tx in &summary.recent_transactions {
        let color = match tx.kind {
            finq_types::TransactionKind::Income => Color::Green,
            finq_types::TransactionKind::Expense => Color::Gray,
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{}  ", tx.date), Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{:<24}", tx.name), Style::default().fg(color)),
            Span::raw(format_amount(tx.amount, currency)),
        ]));
    }
    frame.render_widget(Paragraph::new(lines), chunks[2]);
}
