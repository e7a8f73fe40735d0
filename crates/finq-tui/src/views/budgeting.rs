//! Budgeting screen: per-category limits with utilization bars.

use crossterm::event::{KeyCode, KeyEvent};
use finq_types::{Budget, format_amount};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::common::{Remote, TextField};
use crate::effects::UiEffect;
use crate::events::RequestSeq;
use crate::views::Outcome;

const FIELD_CATEGORY: usize = 0;
const FIELD_LIMIT: usize = 1;
const FIELD_COUNT: usize = 2;

/// Width of the utilization bar in characters.
const BAR_WIDTH: usize = 24;

#[derive(Debug)]
pub struct BudgetForm {
    pub category: TextField,
    pub limit: TextField,
    /// Editing an existing budget; the category field is then frozen.
    pub existing: bool,
    pub spent: f64,
    pub focus: usize,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct BudgetingState {
    pub items: Remote<Vec<Budget>>,
    pub selected: usize,
    pub form: Option<BudgetForm>,
    pub busy: bool,
}

impl BudgetingState {
    pub fn capturing_input(&self) -> bool {
        self.form.is_some()
    }

    fn clamp_selection(&mut self) {
        if let Some(items) = self.items.ready() {
            self.selected = self.selected.min(items.len().saturating_sub(1));
        }
    }
}

pub fn handle_key(state: &mut BudgetingState, key: KeyEvent, seq: &mut RequestSeq) -> Outcome {
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
            state.form = Some(BudgetForm {
                category: TextField::default(),
                limit: TextField::default(),
                existing: false,
                spent: 0.0,
                focus: FIELD_CATEGORY,
                error: None,
            });
            Outcome::none()
        }
        KeyCode::Enter => {
            let Some(budget) = state.items.ready().and_then(|items| items.get(state.selected))
            else {
                return Outcome::none();
            };
            state.form = Some(BudgetForm {
                category: TextField::with_value(&budget.category),
                limit: TextField::with_value(format!("{:.2}", budget.limit)),
                existing: true,
                spent: budget.spent,
                focus: FIELD_LIMIT,
                error: None,
            });
            Outcome::none()
        }
        KeyCode::Char('x') => {
            let Some(category) = state
                .items
                .ready()
                .and_then(|items| items.get(state.selected))
                .map(|b| b.category.clone())
            else {
                return Outcome::none();
            };
            state.busy = true;
            Outcome::effect(UiEffect::DeleteBudget {
                req: seq.next(),
                category,
            })
        }
        KeyCode::Char('g') => {
            let req = seq.next();
            state.items = Remote::Loading { req };
            Outcome::effect(UiEffect::LoadBudgets { req })
        }
        _ => Outcome::none(),
    }
}

fn handle_form_key(state: &mut BudgetingState, key: KeyEvent, seq: &mut RequestSeq) -> Outcome {
    let Some(form) = &mut state.form else {
        return Outcome::none();
    };

    match key.code {
        KeyCode::Esc => {
            state.form = None;
            Outcome::none()
        }
        KeyCode::Tab | KeyCode::Down | KeyCode::BackTab | KeyCode::Up => {
            form.focus = (form.focus + 1) % FIELD_COUNT;
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
        KeyCode::Enter => {
            let limit: f64 = match form.limit.trimmed().parse() {
                Ok(v) => v,
                Err(_) => {
                    form.error = Some("Limit must be a number".to_string());
                    return Outcome::none();
                }
            };
            let budget = Budget {
                category: form.category.trimmed().to_string(),
                limit,
                spent: form.spent,
            };
            if let Err(message) = budget.validate() {
                form.error = Some(message);
                return Outcome::none();
            }
            let existing = form.existing;
            state.form = None;
            state.busy = true;
            Outcome::effect(UiEffect::SaveBudget {
                req: seq.next(),
                budget,
                existing,
            })
        }
        _ => Outcome::none(),
    }
}

impl BudgetForm {
    fn field_mut(&mut self) -> &mut TextField {
        // An existing budget is keyed by category; only the limit may change.
        if self.focus == FIELD_LIMIT || self.existing {
            &mut self.limit
        } else {
            &mut self.category
        }
    }
}

fn utilization_bar(budget: &Budget) -> (String, Color) {
    let ratio = budget.utilization().clamp(0.0, 1.0);
    let filled = (ratio * BAR_WIDTH as f64).round() as usize;
    let bar = format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH.saturating_sub(filled))
    );
    let color = if budget.over_limit() {
        Color::Red
    } else if ratio >= 0.8 {
        Color::Yellow
    } else {
        Color::Green
    };
    (bar, color)
}

pub fn render(frame: &mut Frame, state: &BudgetingState, currency: &str, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Budgeting ");
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
        Remote::Ready(items) => {
            let mut lines = Vec::new();
            if items.is_empty() {
                lines.push(Line::from(Span::styled(
                    "No budgets. Press n to add one.",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            for (i, budget) in items.iter().enumerate() {
                let marker = if i == state.selected { "> " } else { "  " };
                let style = if i == state.selected {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                let (bar, color) = utilization_bar(budget);
                lines.push(Line::from(vec![
                    Span::styled(format!("{marker}{:<16}", budget.category), style),
                    Span::styled(bar, Style::default().fg(color)),
                    Span::raw(format!(
                        "  {} / {}",
                        format_amount(budget.spent, currency),
                        format_amount(budget.limit, currency),
                    )),
                ]));
            }
            frame.render_widget(Paragraph::new(lines), chunks[0]);
        }
    }

    let hint = if state.busy {
        "Saving..."
    } else {
        "n new · Enter edit limit · x delete · g refresh · j/k move"
    };
    frame.render_widget(
        Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray))),
        chunks[1],
    );
}

fn render_form(frame: &mut Frame, form: &BudgetForm, area: Rect) {
    let title = if form.existing {
        "Edit budget"
    } else {
        "New budget"
    };
    let mut lines = vec![
        Line::from(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        field_line(
            "Category",
            &form.category.value,
            form.focus == FIELD_CATEGORY && !form.existing,
        ),
        field_line("Limit", &form.limit.value, form.focus == FIELD_LIMIT || form.existing),
        Line::from(""),
        Line::from(Span::styled(
            "Enter save · Esc cancel",
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
            format!("{marker}{label:<9} "),
            if focused {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::Gray)
            },
        ),
        Span::raw(value.to_string()),
    ])
}
