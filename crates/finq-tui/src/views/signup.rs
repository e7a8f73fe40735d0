//! Sign-up screen: registration form, then code confirmation.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use finq_core::router::Route;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::common::TextField;
use crate::effects::UiEffect;
use crate::views::Outcome;

const FIELD_EMAIL: usize = 0;
const FIELD_PASSWORD: usize = 1;
const FIELD_CONFIRM: usize = 2;
const FIELD_COUNT: usize = 3;

#[derive(Debug)]
pub enum SignupPhase {
    Form,
    /// Account created; waiting for the emailed confirmation code.
    AwaitCode { email: String, delivery: Option<String> },
}

#[derive(Debug)]
pub struct SignupState {
    pub email: TextField,
    pub password: TextField,
    pub confirm: TextField,
    pub code: TextField,
    pub focus: usize,
    pub phase: SignupPhase,
    pub busy: bool,
    pub error: Option<String>,
}

impl Default for SignupState {
    fn default() -> Self {
        Self {
            email: TextField::default(),
            password: TextField::default(),
            confirm: TextField::default(),
            code: TextField::default(),
            focus: FIELD_EMAIL,
            phase: SignupPhase::Form,
            busy: false,
            error: None,
        }
    }
}

pub fn handle_key(state: &mut SignupState, key: KeyEvent) -> Outcome {
    if state.busy {
        return Outcome::none();
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('l') {
            return Outcome::navigate(Route::Login);
        }
        return Outcome::none();
    }

    match &state.phase {
        SignupPhase::Form => handle_form_key(state, key),
        SignupPhase::AwaitCode { email, .. } => {
            let email = email.clone();
            match key.code {
                KeyCode::Char(c) => {
                    state.code.push(c);
                    Outcome::none()
                }
                KeyCode::Backspace => {
                    state.code.backspace();
                    Outcome::none()
                }
                KeyCode::Enter => {
                    if state.code.is_empty() {
                        state.error = Some("Enter the confirmation code".to_string());
                        return Outcome::none();
                    }
                    state.busy = true;
                    state.error = None;
                    Outcome::effect(UiEffect::ConfirmSignUp {
                        email,
                        code: state.code.trimmed().to_string(),
                    })
                }
                _ => Outcome::none(),
            }
        }
    }
}

fn handle_form_key(state: &mut SignupState, key: KeyEvent) -> Outcome {
    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            state.focus = (state.focus + 1) % FIELD_COUNT;
            Outcome::none()
        }
        KeyCode::BackTab | KeyCode::Up => {
            state.focus = (state.focus + FIELD_COUNT - 1) % FIELD_COUNT;
            Outcome::none()
        }
        KeyCode::Char(c) => {
            state.field_mut().push(c);
            Outcome::none()
        }
        KeyCode::Backspace => {
            state.field_mut().backspace();
            Outcome::none()
        }
        KeyCode::Enter => {
            if state.email.is_empty() || state.password.is_empty() {
                state.error = Some("Enter an email and password".to_string());
                return Outcome::none();
            }
            if state.password.value != state.confirm.value {
                state.error = Some("Passwords do not match".to_string());
                return Outcome::none();
            }
            state.busy = true;
            state.error = None;
            Outcome::effect(UiEffect::SignUp {
                email: state.email.trimmed().to_string(),
                password: state.password.value.clone(),
            })
        }
        _ => Outcome::none(),
    }
}

impl SignupState {
    fn field_mut(&mut self) -> &mut TextField {
        match self.focus {
            FIELD_PASSWORD => &mut self.password,
            FIELD_CONFIRM => &mut self.confirm,
            _ => &mut self.email,
        }
    }

    /// Moves to the confirmation phase after a successful registration.
    pub fn await_code(&mut self, email: String, delivery: Option<String>) {
        self.busy = false;
        self.error = None;
        self.phase = SignupPhase::AwaitCode { email, delivery };
    }

    pub fn fail(&mut self, error: String) {
        self.busy = false;
        self.error = Some(error);
    }
}

pub fn render(frame: &mut Frame, state: &SignupState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Create account ")
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line<'static>> = Vec::new();

    match &state.phase {
        SignupPhase::Form => {
            lines.push(field_line("Email", &state.email.value, state.focus == FIELD_EMAIL));
            lines.push(field_line(
                "Password",
                &state.password.masked(),
                state.focus == FIELD_PASSWORD,
            ));
            lines.push(field_line(
                "Confirm password",
                &state.confirm.masked(),
                state.focus == FIELD_CONFIRM,
            ));
            lines.push(Line::from(""));
            if state.busy {
                lines.push(Line::from(Span::styled(
                    "Creating account...",
                    Style::default().fg(Color::Yellow),
                )));
            } else {
                lines.push(hint_line("Enter create · Tab switch field · Ctrl+L back to login"));
            }
        }
        SignupPhase::AwaitCode { email, delivery } => {
            let destination = delivery.clone().unwrap_or_else(|| email.clone());
            lines.push(Line::from(format!("A confirmation code was sent to {destination}.")));
            lines.push(Line::from(""));
            lines.push(field_line("Code", &state.code.value, true));
            lines.push(Line::from(""));
            if state.busy {
                lines.push(Line::from(Span::styled(
                    "Confirming...",
                    Style::default().fg(Color::Yellow),
                )));
            } else {
                lines.push(hint_line("Enter confirm · Ctrl+L back to login"));
            }
        }
    }

    if let Some(error) = &state.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let marker = if focused { "> " } else { "  " };
    let style = if focused {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::Gray)
    };
    Line::from(vec![
        Span::styled(format!("{marker}{label}: "), style),
        Span::styled(value.to_string(), Style::default().fg(Color::White)),
    ])
}

fn hint_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::DarkGray),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(state: &mut SignupState, text: &str) {
        for c in text.chars() {
            handle_key(state, press(KeyCode::Char(c)));
        }
    }

    /// Test: mismatched passwords are caught before any request.
    #[test]
    fn test_password_mismatch() {
        let mut state = SignupState::default();
        type_text(&mut state, "a@b.co");
        handle_key(&mut state, press(KeyCode::Tab));
        type_text(&mut state, "one");
        handle_key(&mut state, press(KeyCode::Tab));
        type_text(&mut state, "two");

        let outcome = handle_key(&mut state, press(KeyCode::Enter));
        assert!(outcome.effects.is_empty());
        assert_eq!(state.error.as_deref(), Some("Passwords do not match"));
    }

    /// Test: a valid form emits SignUp, and success moves to the code phase.
    #[test]
    fn test_signup_then_confirm() {
        let mut state = SignupState::default();
        type_text(&mut state, "a@b.co");
        handle_key(&mut state, press(KeyCode::Tab));
        type_text(&mut state, "pw");
        handle_key(&mut state, press(KeyCode::Tab));
        type_text(&mut state, "pw");

        let outcome = handle_key(&mut state, press(KeyCode::Enter));
        assert!(matches!(
            outcome.effects.as_slice(),
            [UiEffect::SignUp { email, .. }] if email == "a@b.co"
        ));

        state.await_code("a@b.co".to_string(), Some("a***@b.co".to_string()));
        type_text(&mut state, "123456");
        let outcome = handle_key(&mut state, press(KeyCode::Enter));
        assert!(matches!(
            outcome.effects.as_slice(),
            [UiEffect::ConfirmSignUp { email, code }] if email == "a@b.co" && code == "123456"
        ));
    }

    /// Test: Ctrl+L navigates back to login.
    #[test]
    fn test_back_to_login() {
        let mut state = SignupState::default();
        let outcome = handle_key(
            &mut state,
            KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL),
        );
        assert_eq!(outcome.navigate, Some(Route::Login));
    }
}
