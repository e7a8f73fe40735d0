//! Reports screen: list with a detail pane and a generation form.

use crossterm::event::{KeyCode, KeyEvent};
use finq_types::Report;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::common::{Remote, TextField};
use crate::effects::UiEffect;
use crate::events::RequestSeq;
use crate::views::Outcome;

const FIELD_TITLE: usize = 0;
const FIELD_PERIOD: usize = 1;
const FIELD_COUNT: usize = 2;

#[derive(Debug)]
pub struct ReportForm {
    pub title: TextField,
    pub period: TextField,
    pub focus: usize,
    pub error: Option<String>,
}

impl ReportForm {
    fn new(default_period: String) -> Self {
        Self {
            title: TextField::default(),
            period: TextField::with_value(default_period),
            focus: FIELD_TITLE,
            error: None,
        }
    }

    fn build(&self) -> Result<Report, String> {
        let report = Report {
            id: None,
            title: self.title.trimmed().to_string(),
            period: self.period.trimmed().to_string(),
            generated_at: None,
            summary: None,
        };
        report.validate()?;
        Ok(report)
    }

    fn field_mut(&mut self) -> &mut TextField {
        match self.focus {
            FIELD_PERIOD => &mut self.period,
            _ => &mut self.title,
        }
    }
}

#[derive(Debug, Default)]
pub struct ReportsState {
    pub items: Remote<Vec<Report>>,
    pub selected: usize,
    pub form: Option<ReportForm>,
    /// A generation request is in flight; list input is suspended until the
    /// re-fetch.
    pub busy: bool,
}

impl ReportsState {
    pub fn capturing_input(&self) -> bool {
        self.form.is_some()
    }

    fn clamp_selection(&mut self) {
        if let Some(items) = self.items.ready() {
            self.selected = self.selected.min(items.len().saturating_sub(1));
        }
    }
}

pub fn handle_key(state: &mut ReportsState, key: KeyEvent, seq: &mut RequestSeq) -> Outcome {
    if state.busy {
        return Outcome::none();
    }
    if state.form.is_some() {
        return handle_form_key(state, key, seq);
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            state.selected = state.selected.saturating_sub(1);
            Outcome::none()
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.selected += 1;
            state.clamp_selection();
            Outcome::none()
        }
        KeyCode::Char('n') => {
            let period = chrono::Local::now().format("%Y-%m").to_string();
            state.form = Some(ReportForm::new(period));
            Outcome::none()
        }
        KeyCode::Char('g') => {
            let req = seq.next();
            state.items = Remote::Loading { req };
            Outcome::effect(UiEffect::LoadReports { req })
        }
        _ => Outcome::none(),
    }
}

fn handle_form_key(state: &mut ReportsState, key: KeyEvent, seq: &mut RequestSeq) -> Outcome {
    let Some(form) = &mut state.form else {
        return Outcome::none();
    };

    match key.code {
        KeyCode::Esc => {
            state.form = None;
            Outcome::none()
        }
        KeyCode::Tab | KeyCode::Down => {
            form.focus = (form.focus + 1) % FIELD_COUNT;
            Outcome::none()
        }
        KeyCode::BackTab | KeyCode::Up => {
            form.focus = (form.focus + FIELD_COUNT - 1) % FIELD_COUNT;
            Outcome::none()
        }
        KeyCode::Char(c) => {
            form.field_mut().push(c);
            Outcome::none()
        }
        KeyCode::Backspace => {
            form.field_mut().backspace();
            Outcome::none()
        }
        KeyCode::Enter => match form.build() {
            Ok(report) => {
                state.form = None;
                state.busy = true;
                Outcome::effect(UiEffect::GenerateReport {
                    req: seq.next(),
                    report,
                })
            }
            Err(message) => {
                form.error = Some(message);
                Outcome::none()
            }
        },
        _ => Outcome::none(),
    }
}

pub fn render(frame: &mut Frame, state: &ReportsState, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Reports ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(form) = &state.form {
        render_form(frame, form, inner);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    match &state.items {
        Remote::NotLoaded | Remote::Loading { .. } => {
            frame.render_widget(
                Paragraph::new(Span::styled("Loading...", Style::default().fg(Color::Yellow))),
                chunks[0],
            );
        }
        Remote::Failed(message) => {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    message.clone(),
                    Style::default().fg(Color::Red),
                )),
                chunks[0],
            );
        }
        Remote::Ready(items) if items.is_empty() => {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "No reports yet. Press n to generate one.",
                    Style::default().fg(Color::DarkGray),
                )),
                chunks[0],
            );
        }
        Remote::Ready(items) => {
            let panes = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[0]);

            let mut lines = Vec::new();
            for (i, report) in items.iter().enumerate() {
                let marker = if i == state.selected { "> " } else { "  " };
                let style = if i == state.selected {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("{marker}{:<32}", report.title), style),
                    Span::styled(report.period.clone(), Style::default().fg(Color::DarkGray)),
                ]));
            }
            frame.render_widget(Paragraph::new(lines), panes[0]);

            if let Some(report) = items.get(state.selected) {
                let meta = match &report.generated_at {
                    Some(at) => format!("{} · generated {}", report.period, at.format("%Y-%m-%d")),
                    None => report.period.clone(),
                };
                let detail = Paragraph::new(vec![
                    Line::from(Span::styled(
                        report.title.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(meta, Style::default().fg(Color::DarkGray))),
                    Line::from(""),
                    Line::from(report.summary.clone().unwrap_or_default()),
                ])
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::TOP));
                frame.render_widget(detail, panes[1]);
            }
        }
    }

    let hint = if state.busy {
        "Generating..."
    } else {
        "n generate · g refresh · j/k move"
    };
    frame.render_widget(
        Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray))),
        chunks[1],
    );
}

fn render_form(frame: &mut Frame, form: &ReportForm, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Generate report",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        field_line("Title", &form.title.value, form.focus == FIELD_TITLE),
        field_line("Period", &form.period.value, form.focus == FIELD_PERIOD),
        Line::from(""),
        Line::from(Span::styled(
            "Enter generate · Tab next field · Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let marker = if focused { "> " } else { "  " };
    Line::from(vec![
        Span::styled(
            format!("{marker}{label:<8} "),
            if focused {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::Gray)
            },
        ),
        Span::raw(value.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(state: &mut ReportsState, seq: &mut RequestSeq, text: &str) {
        for c in text.chars() {
            handle_key(state, press(KeyCode::Char(c)), seq);
        }
    }

    /// Test: g issues a reload tagged with a fresh request id.
    #[test]
    fn test_refresh() {
        let mut seq = RequestSeq::default();
        let mut state = ReportsState::default();
        let outcome = handle_key(&mut state, press(KeyCode::Char('g')), &mut seq);
        assert!(state.items.is_loading());
        assert!(matches!(
            outcome.effects.as_slice(),
            [UiEffect::LoadReports { .. }]
        ));
    }

    /// Test: filling the form and submitting emits GenerateReport as a
    /// create on the reports collection.
    #[test]
    fn test_generate_flow() {
        let mut seq = RequestSeq::default();
        let mut state = ReportsState::default();
        handle_key(&mut state, press(KeyCode::Char('n')), &mut seq);
        assert!(state.capturing_input());
        // Period is pre-filled with the current month
        assert!(!state.form.as_ref().unwrap().period.value.is_empty());

        type_text(&mut state, &mut seq, "March spending");
        let outcome = handle_key(&mut state, press(KeyCode::Enter), &mut seq);
        assert!(state.busy);
        assert!(state.form.is_none());
        assert!(matches!(
            outcome.effects.as_slice(),
            [UiEffect::GenerateReport { report, .. }]
                if report.title == "March spending" && report.id.is_none()
        ));
    }

    /// Test: an empty title keeps the form open with a validation error.
    #[test]
    fn test_empty_title_stays_in_form() {
        let mut seq = RequestSeq::default();
        let mut state = ReportsState::default();
        handle_key(&mut state, press(KeyCode::Char('n')), &mut seq);

        let outcome = handle_key(&mut state, press(KeyCode::Enter), &mut seq);
        assert!(outcome.effects.is_empty());
        assert!(!state.busy);
        assert_eq!(
            state.form.as_ref().unwrap().error.as_deref(),
            Some("title is required")
        );
    }

    /// Test: while generation is in flight, list keys are ignored.
    #[test]
    fn test_busy_suspends_input() {
        let mut seq = RequestSeq::default();
        let mut state = ReportsState::default();
        state.busy = true;
        let outcome = handle_key(&mut state, press(KeyCode::Char('n')), &mut seq);
        assert!(outcome.effects.is_empty());
        assert!(state.form.is_none());
    }
}
