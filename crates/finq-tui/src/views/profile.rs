//! Profile screen: account details and editable preferences.

use crossterm::event::{KeyCode, KeyEvent};
use finq_types::ProfilePreferences;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::common::{Remote, TextField};
use crate::effects::UiEffect;
use crate::events::RequestSeq;
use crate::views::Outcome;

const FIELD_NAME: usize = 0;
const FIELD_CURRENCY: usize = 1;
const FIELD_NOTIFICATIONS: usize = 2;
const FIELD_TWO_FACTOR: usize = 3;
const FIELD_COUNT: usize = 4;

#[derive(Debug)]
pub struct ProfileForm {
    pub full_name: TextField,
    pub currency: TextField,
    pub email_notifications: bool,
    pub two_factor: bool,
    pub focus: usize,
    pub error: Option<String>,
}

impl ProfileForm {
    fn from_prefs(prefs: &ProfilePreferences) -> Self {
        Self {
            full_name: TextField::with_value(prefs.full_name.clone().unwrap_or_default()),
            currency: TextField::with_value(&prefs.currency),
            email_notifications: prefs.email_notifications,
            two_factor: prefs.two_factor,
            focus: FIELD_NAME,
            error: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ProfileState {
    pub data: Remote<ProfilePreferences>,
    pub form: Option<ProfileForm>,
    pub busy: bool,
}

impl ProfileState {
    pub fn capturing_input(&self) -> bool {
        self.form.is_some()
    }
}

pub fn handle_key(state: &mut ProfileState, key: KeyEvent, seq: &mut RequestSeq) -> Outcome {
    if state.busy {
        return Outcome::none();
    }
    if state.form.is_some() {
        return handle_form_key(state, key, seq);
    }

    match key.code {
        KeyCode::Char('e') => {
            if let Some(prefs) = state.data.ready() {
                state.form = Some(ProfileForm::from_prefs(prefs));
            }
            Outcome::none()
        }
        KeyCode::Char('g') => {
            let req = seq.next();
            state.data = Remote::Loading { req };
            Outcome::effect(UiEffect::LoadProfile { req })
        }
        _ => Outcome::none(),
    }
}

fn handle_form_key(state: &mut ProfileState, key: KeyEvent, seq: &mut RequestSeq) -> Outcome {
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
        KeyCode::Char(' ') if form.focus >= FIELD_NOTIFICATIONS => {
            if form.focus == FIELD_NOTIFICATIONS {
                form.email_notifications = !form.email_notifications;
            } else {
                form.two_factor = !form.two_factor;
            }
            Outcome::none()
        }
        KeyCode::Char(c) if form.focus <= FIELD_CURRENCY => {
            if form.focus == FIELD_NAME {
                form.full_name.push(c);
            } else {
                form.currency.push(c.to_ascii_uppercase());
            }
            Outcome::none()
        }
        KeyCode::Backspace if form.focus <= FIELD_CURRENCY => {
            if form.focus == FIELD_NAME {
                form.full_name.backspace();
            } else {
                form.currency.backspace();
            }
            Outcome::none()
        }
        KeyCode::Enter => {
            if form.currency.trimmed().len() != 3 {
                form.error = Some("Currency must be a 3-letter code".to_string());
                return Outcome::none();
            }
            let Some(current) = state.data.ready() else {
                return Outcome::none();
            };
            let profile = ProfilePreferences {
                email: current.email.clone(),
                full_name: if form.full_name.is_empty() {
                    None
                } else {
                    Some(form.full_name.trimmed().to_string())
                },
                currency: form.currency.trimmed().to_string(),
                email_notifications: form.email_notifications,
                two_factor: form.two_factor,
            };
            state.form = None;
            state.busy = true;
            Outcome::effect(UiEffect::SaveProfile {
                req: seq.next(),
                profile,
            })
        }
        _ => Outcome::none(),
    }
}

pub fn render(frame: &mut Frame, state: &ProfileState, user_id: Option<&str>, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Profile ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(form) = &state.form {
        render_form(frame, form, inner);
        return;
    }

    let mut lines: Vec<Line<'static>> = Vec::new();
    if let Some(user_id) = user_id {
        lines.push(Line::from(vec![
            Span::styled("User id  ", Style::default().fg(Color::Gray)),
            Span::raw(user_id.to_string()),
        ]));
    }

    match &state.data {
        Remote::NotLoaded | Remote::Loading { .. } => {
            lines.push(Line::from(Span::styled(
                "Loading...",
                Style::default().fg(Color::Yellow),
            )));
        }
        Remote::Failed(message) => {
            lines.push(Line::from(Span::styled(
                message.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        Remote::Ready(prefs) => {
            lines.push(Line::from(vec![
                Span::styled("Email    ", Style::default().fg(Color::Gray)),
                Span::raw(prefs.email.clone().unwrap_or_else(|| "-".to_string())),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Name     ", Style::default().fg(Color::Gray)),
                Span::raw(prefs.full_name.clone().unwrap_or_else(|| "-".to_string())),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Currency ", Style::default().fg(Color::Gray)),
                Span::raw(prefs.currency.clone()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Email notifications ", Style::default().fg(Color::Gray)),
                Span::raw(on_off(prefs.email_notifications)),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Two-factor auth     ", Style::default().fg(Color::Gray)),
                Span::raw(on_off(prefs.two_factor)),
            ]));
            lines.push(Line::from(""));
            let hint = if state.busy {
                "Saving..."
            } else {
                "e edit · g refresh · o sign out"
            };
            lines.push(Line::from(Span::styled(
                hint,
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_form(frame: &mut Frame, form: &ProfileForm, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Edit profile",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        field_line("Name", &form.full_name.value, form.focus == FIELD_NAME),
        field_line("Currency", &form.currency.value, form.focus == FIELD_CURRENCY),
        toggle_line(
            "Email notifications",
            form.email_notifications,
            form.focus == FIELD_NOTIFICATIONS,
        ),
        toggle_line("Two-factor auth", form.two_factor, form.focus == FIELD_TWO_FACTOR),
        Line::from(""),
        Line::from(Span::styled(
            "Enter save · Space toggles · Esc cancel",
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
            format!("{marker}{label:<20} "),
            if focused {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::Gray)
            },
        ),
        Span::raw(value.to_string()),
    ])
}

fn toggle_line(label: &str, value: bool, focused: bool) -> Line<'static> {
    let marker = if focused { "> " } else { "  " };
    Line::from(vec![
        Span::styled(
            format!("{marker}{label:<20} "),
            if focused {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::Gray)
            },
        ),
        Span::styled(
            on_off(value),
            Style::default().fg(if value { Color::Green } else { Color::DarkGray }),
        ),
    ])
}

fn on_off(value: bool) -> String {
    if value { "on".to_string() } else { "off".to_string() }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ready_state() -> ProfileState {
        ProfileState {
            data: Remote::Ready(ProfilePreferences {
                email: Some("a@b.co".to_string()),
                full_name: Some("Ada".to_string()),
                currency: "USD".to_string(),
                email_notifications: true,
                two_factor: false,
            }),
            ..Default::default()
        }
    }

    /// Test: toggling two-factor and saving emits SaveProfile with the new
    /// preferences and the unchanged email.
    #[test]
    fn test_edit_and_save() {
        let mut seq = RequestSeq::default();
        let mut state = ready_state();
        handle_key(&mut state, press(KeyCode::Char('e')), &mut seq);
        assert!(state.capturing_input());

        handle_key(&mut state, press(KeyCode::Tab), &mut seq);
        handle_key(&mut state, press(KeyCode::Tab), &mut seq);
        handle_key(&mut state, press(KeyCode::Tab), &mut seq);
        handle_key(&mut state, press(KeyCode::Char(' ')), &mut seq);

        let outcome = handle_key(&mut state, press(KeyCode::Enter), &mut seq);
        assert!(matches!(
            outcome.effects.as_slice(),
            [UiEffect::SaveProfile { profile, .. }]
                if profile.two_factor && profile.email.as_deref() == Some("a@b.co")
        ));
        assert!(state.busy);
    }

    /// Test: a currency that is not 3 letters is rejected in the form.
    #[test]
    fn test_currency_validation() {
        let mut seq = RequestSeq::default();
        let mut state = ready_state();
        handle_key(&mut state, press(KeyCode::Char('e')), &mut seq);
        handle_key(&mut state, press(KeyCode::Tab), &mut seq);
        handle_key(&mut state, press(KeyCode::Backspace), &mut seq);

        let outcome = handle_key(&mut state, press(KeyCode::Enter), &mut seq);
        assert!(outcome.effects.is_empty());
        assert!(state.form.as_ref().unwrap().error.is_some());
    }

    /// Test: currency input is upper-cased as typed.
    #[test]
    fn test_currency_uppercased() {
        let mut seq = RequestSeq::default();
        let mut state = ready_state();
        handle_key(&mut state, press(KeyCode::Char('e')), &mut seq);
        handle_key(&mut state, press(KeyCode::Tab), &mut seq);
        for _ in 0..3 {
            handle_key(&mut state, press(KeyCode::Backspace), &mut seq);
        }
        for c in "eur".chars() {
            handle_key(&mut state, press(KeyCode::Char(c)), &mut seq);
        }
        assert_eq!(state.form.as_ref().unwrap().currency.value, "EUR");
    }
}
