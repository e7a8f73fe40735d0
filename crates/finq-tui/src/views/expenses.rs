//! Expenses screen: transaction list with a create/edit form.

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use finq_types::{Transaction, TransactionKind, format_amount};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::common::{Remote, TextField};
use crate::effects::UiEffect;
use crate::events::RequestSeq;
use crate::views::Outcome;

const FIELD_NAME: usize = 0;
const FIELD_AMOUNT: usize = 1;
const FIELD_DATE: usize = 2;
const FIELD_KIND: usize = 3;
const FIELD_COUNT: usize = 4;

#[derive(Debug)]
pub struct TransactionForm {
    /// None for a new transaction, the server id when editing.
    pub id: Option<String>,
    pub name: TextField,
    pub amount: TextField,
    pub date: TextField,
    pub kind: TransactionKind,
    pub focus: usize,
    pub error: Option<String>,
}

impl TransactionForm {
    fn new(today: NaiveDate) -> Self {
        Self {
            id: None,
            name: TextField::default(),
            amount: TextField::default(),
            date: TextField::with_value(today.format("%Y-%m-%d").to_string()),
            kind: TransactionKind::Expense,
            focus: FIELD_NAME,
            error: None,
        }
    }

    fn edit(tx: &Transaction) -> Self {
        Self {
            id: tx.id.clone(),
            name: TextField::with_value(&tx.name),
            amount: TextField::with_value(format!("{:.2}", tx.amount)),
            date: TextField::with_value(tx.date.format("%Y-%m-%d").to_string()),
            kind: tx.kind,
            focus: FIELD_NAME,
            error: None,
        }
    }

    fn build(&self) -> Result<Transaction, String> {
        let amount: f64 = self
            .amount
            .trimmed()
            .parse()
            .map_err(|_| "Amount must be a number".to_string())?;
        let date = NaiveDate::parse_from_str(self.date.trimmed(), "%Y-%m-%d")
            .map_err(|_| "Date must be YYYY-MM-DD".to_string())?;
        let tx = Transaction {
            id: self.id.clone(),
            name: self.name.trimmed().to_string(),
            amount,
            date,
            kind: self.kind,
        };
        tx.validate()?;
        Ok(tx)
    }
}

#[derive(Debug, Default)]
pub struct ExpensesState {
    pub items: Remote<Vec<Transaction>>,
    pub selected: usize,
    pub form: Option<TransactionForm>,
    /// A write is in flight; list input is suspended until the re-fetch.
    pub busy: bool,
}

impl ExpensesState {
    pub fn capturing_input(&self) -> bool {
        self.form.is_some()
    }

    pub fn clamp_selection(&mut self) {
        if let Some(items) = self.items.ready() {
            self.selected = self.selected.min(items.len().saturating_sub(1));
        }
    }
}

pub fn handle_key(state: &mut ExpensesState, key: KeyEvent, seq: &mut RequestSeq) -> Outcome {
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
            state.form = Some(TransactionForm::new(chrono::Local::now().date_naive()));
            Outcome::none()
        }
        KeyCode::Enter => {
            let Some(tx) = state.items.ready().and_then(|items| items.get(state.selected)) else {
                return Outcome::none();
            };
            state.form = Some(TransactionForm::edit(tx));
            Outcome::none()
        }
        KeyCode::Char('x') => {
            let Some(id) = state
                .items
                .ready()
                .and_then(|items| items.get(state.selected))
                .and_then(|tx| tx.id.clone())
            else {
                return Outcome::none();
            };
            state.busy = true;
            Outcome::effect(UiEffect::DeleteTransaction {
                req: seq.next(),
                id,
            })
        }
        KeyCode::Char('g') => {
            let req = seq.next();
            state.items = Remote::Loading { req };
            Outcome::effect(UiEffect::LoadTransactions { req })
        }
        _ => Outcome::none(),
    }
}

fn handle_form_key(state: &mut ExpensesState, key: KeyEvent, seq: &mut RequestSeq) -> Outcome {
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
        KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if form.focus == FIELD_KIND => {
            form.kind = form.kind.toggle();
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
            Ok(tx) => {
                let req = seq.next();
                let effect = match tx.id.clone() {
                    Some(id) => UiEffect::UpdateTransaction {
                        req,
                        id,
                        transaction: tx,
                    },
                    None => UiEffect::CreateTransaction {
                        req,
                        transaction: tx,
                    },
                };
                state.form = None;
                state.busy = true;
                Outcome::effect(effect)
            }
            Err(message) => {
                form.error = Some(message);
                Outcome::none()
            }
        },
        _ => Outcome::none(),
    }
}

impl TransactionForm {
    fn field_mut(&mut self) -> &mut TextField {
        match self.focus {
            FIELD_AMOUNT => &mut self.amount,
            FIELD_DATE => &mut self.date,
            _ => &mut self.name,
        }
    }
}

pub fn render(frame: &mut Frame, state: &ExpensesState, currency: &str, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Expenses ");
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
                    "No transactions. Press n to add one.",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            for (i, tx) in items.iter().enumerate() {
                let marker = if i == state.selected { "> " } else { "  " };
                let style = if i == state.selected {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                let amount_color = match tx.kind {
                    TransactionKind::Income => Color::Green,
                    TransactionKind::Expense => Color::White,
                };
                lines.push(Line::from(vec![
                    Span::styled(marker.to_string(), style),
                    Span::styled(format!("{}  ", tx.date), Style::default().fg(Color::DarkGray)),
                    Span::styled(format!("{:<28}", tx.name), style),
                    Span::styled(
                        format_amount(tx.amount, currency),
                        Style::default().fg(amount_color),
                    ),
                ]));
            }
            frame.render_widget(Paragraph::new(lines), chunks[0]);
        }
    }

    let hint = if state.busy {
        "Saving..."
    } else {
        "n new · Enter edit · x delete · g refresh · j/k move"
    };
    frame.render_widget(
        Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray))),
        chunks[1],
    );
}

fn render_form(frame: &mut Frame, form: &TransactionForm, area: Rect) {
    let title = if form.id.is_some() {
        "Edit transaction"
    } else {
        "New transaction"
    };
    let mut lines = vec![
        Line::from(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        field_line("Name", &form.name.value, form.focus == FIELD_NAME),
        field_line("Amount", &form.amount.value, form.focus == FIELD_AMOUNT),
        field_line("Date", &form.date.value, form.focus == FIELD_DATE),
        field_line("Type", form.kind.label(), form.focus == FIELD_KIND),
        Line::from(""),
        Line::from(Span::styled(
            "Enter save · Tab next field · Space toggles type · Esc cancel",
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
