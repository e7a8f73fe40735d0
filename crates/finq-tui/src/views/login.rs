//! Login screen: credentials form plus the federated browser flow.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use finq_core::config::IdentityConfig;
use finq_core::identity::hosted_ui;
use finq_core::router::Route;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::common::TextField;
use crate::effects::UiEffect;
use crate::views::Outcome;

const FIELD_USERNAME: usize = 0;
const FIELD_PASSWORD: usize = 1;

#[derive(Debug)]
pub enum LoginMode {
    Credentials,
    /// Browser flow in progress; the user pastes the callback URL back in.
    Federated {
        verifier: String,
        url: String,
        callback: TextField,
    },
}

#[derive(Debug)]
pub struct LoginState {
    pub username: TextField,
    pub password: TextField,
    pub focus: usize,
    pub mode: LoginMode,
    pub busy: bool,
    pub error: Option<String>,
    /// One-shot banner, e.g. after a confirmed sign-up.
    pub info: Option<String>,
}

impl Default for LoginState {
    fn default() -> Self {
        Self {
            username: TextField::default(),
            password: TextField::default(),
            focus: FIELD_USERNAME,
            mode: LoginMode::Credentials,
            busy: false,
            error: None,
            info: None,
        }
    }
}

impl LoginState {
    pub fn reset_after_failure(&mut self, error: String) {
        self.busy = false;
        self.error = Some(error);
        self.password.clear();
        self.mode = LoginMode::Credentials;
    }
}

pub fn handle_key(state: &mut LoginState, key: KeyEvent, identity: &IdentityConfig) -> Outcome {
    if state.busy {
        return Outcome::none();
    }

    // Mode and route shortcuts use Ctrl so plain characters stay typeable.
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('s') => return Outcome::navigate(Route::Signup),
            KeyCode::Char('f') => {
                let pkce = hosted_ui::generate_pkce();
                let gate = uuid::Uuid::new_v4().to_string();
                let url = hosted_ui::build_auth_url(identity, &pkce, &gate);
                state.error = None;
                state.mode = LoginMode::Federated {
                    verifier: pkce.verifier,
                    url: url.clone(),
                    callback: TextField::default(),
                };
                return Outcome::effect(UiEffect::OpenBrowser { url });
            }
            _ => return Outcome::none(),
        }
    }

    match &mut state.mode {
        LoginMode::Credentials => handle_credentials_key(state, key),
        LoginMode::Federated {
            verifier, callback, ..
        } => match key.code {
            KeyCode::Esc => {
                state.mode = LoginMode::Credentials;
                Outcome::none()
            }
            KeyCode::Char(c) => {
                callback.push(c);
                Outcome::none()
            }
            KeyCode::Backspace => {
                callback.backspace();
                Outcome::none()
            }
            KeyCode::Enter => {
                let (code, _gate) = hosted_ui::parse_callback_input(&callback.value);
                match code {
                    Some(code) => {
                        let verifier = verifier.clone();
                        state.busy = true;
                        state.error = None;
                        Outcome::effect(UiEffect::ExchangeFederatedCode { code, verifier })
                    }
                    None => {
                        state.error = Some("Paste the redirect URL or code first".to_string());
                        Outcome::none()
                    }
                }
            }
            _ => Outcome::none(),
        },
    }
}

fn handle_credentials_key(state: &mut LoginState, key: KeyEvent) -> Outcome {
    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            state.focus = (state.focus + 1) % 2;
            Outcome::none()
        }
        KeyCode::BackTab | KeyCode::Up => {
            state.focus = (state.focus + 1) % 2;
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
            if state.username.is_empty() || state.password.is_empty() {
                state.error = Some("Enter both username and password".to_string());
                return Outcome::none();
            }
            state.busy = true;
            state.error = None;
            state.info = None;
            Outcome::effect(UiEffect::SignIn {
                username: state.username.trimmed().to_string(),
                password: state.password.value.clone(),
            })
        }
        _ => Outcome::none(),
    }
}

impl LoginState {
    fn field_mut(&mut self) -> &mut TextField {
        if self.focus == FIELD_PASSWORD {
            &mut self.password
        } else {
            &mut self.username
        }
    }
}

pub fn render(frame: &mut Frame, state: &LoginState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Sign in ")
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line<'static>> = Vec::new();

    if let Some(info) = &state.info {
        lines.push(Line::from(Span::styled(
            info.clone(),
            Style::default().fg(Color::Green),
        )));
        lines.push(Line::from(""));
    }

    match &state.mode {
        LoginMode::Credentials => {
            lines.push(field_line(
                "Username",
                &state.username.value,
                state.focus == FIELD_USERNAME,
            ));
            lines.push(field_line(
                "Password",
                &state.password.masked(),
                state.focus == FIELD_PASSWORD,
            ));
            lines.push(Line::from(""));
            if state.busy {
                lines.push(Line::from(Span::styled(
                    "Signing in...",
                    Style::default().fg(Color::Yellow),
                )));
            } else {
                lines.push(hint_line(
                    "Enter sign in · Tab switch field · Ctrl+F browser sign-in · Ctrl+S sign up",
                ));
            }
        }
        LoginMode::Federated { url, callback, .. } => {
            lines.push(Line::from("A browser window was opened:"));
            lines.push(Line::from(Span::styled(
                url.clone(),
                Style::default().fg(Color::Blue),
            )));
            lines.push(Line::from(""));
            lines.push(field_line("Redirect URL", &callback.value, true));
            lines.push(Line::from(""));
            if state.busy {
                lines.push(Line::from(Span::styled(
                    "Exchanging code...",
                    Style::default().fg(Color::Yellow),
                )));
            } else {
                lines.push(hint_line("Enter submit · Esc back"));
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
        Span::styled(if focused { "_" } else { "" }, Style::default().fg(Color::DarkGray)),
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

    fn identity() -> IdentityConfig {
        IdentityConfig {
            region: "us-east-1".to_string(),
            user_pool_id: "pool".to_string(),
            client_id: "client".to_string(),
            oauth_domain: "auth.example.com".to_string(),
            redirect_sign_in: "http://localhost:3000/".to_string(),
            redirect_sign_out: "http://localhost:3000/".to_string(),
            base_url: None,
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(state: &mut LoginState, text: &str) {
        for c in text.chars() {
            handle_key(state, press(KeyCode::Char(c)), &identity());
        }
    }

    /// Test: submitting with both fields filled emits a SignIn effect and
    /// marks the form busy.
    #[test]
    fn test_submit_credentials() {
        let mut state = LoginState::default();
        type_text(&mut state, "user@example.com");
        handle_key(&mut state, press(KeyCode::Tab), &identity());
        type_text(&mut state, "hunter22");

        let outcome = handle_key(&mut state, press(KeyCode::Enter), &identity());
        assert!(state.busy);
        assert!(matches!(
            outcome.effects.as_slice(),
            [UiEffect::SignIn { username, .. }] if username == "user@example.com"
        ));
    }

    /// Test: submitting with an empty password is rejected locally.
    #[test]
    fn test_submit_requires_both_fields() {
        let mut state = LoginState::default();
        type_text(&mut state, "user@example.com");
        let outcome = handle_key(&mut state, press(KeyCode::Enter), &identity());
        assert!(outcome.effects.is_empty());
        assert!(!state.busy);
        assert!(state.error.is_some());
    }

    /// Test: Ctrl+F opens the browser and switches to federated mode.
    #[test]
    fn test_federated_flow_start() {
        let mut state = LoginState::default();
        let outcome = handle_key(
            &mut state,
            KeyEvent::new(KeyCode::Char('f'), KeyModifiers::CONTROL),
            &identity(),
        );
        assert!(matches!(state.mode, LoginMode::Federated { .. }));
        assert!(matches!(
            outcome.effects.as_slice(),
            [UiEffect::OpenBrowser { url }] if url.contains("/oauth2/authorize?")
        ));
    }

    /// Test: pasting a callback URL in federated mode exchanges the code.
    #[test]
    fn test_federated_flow_exchange() {
        let mut state = LoginState::default();
        handle_key(
            &mut state,
            KeyEvent::new(KeyCode::Char('f'), KeyModifiers::CONTROL),
            &identity(),
        );
        type_text(&mut state, "http://localhost:3000/?code=abc123");
        let outcome = handle_key(&mut state, press(KeyCode::Enter), &identity());
        assert!(matches!(
            outcome.effects.as_slice(),
            [UiEffect::ExchangeFederatedCode { code, .. }] if code == "abc123"
        ));
        assert!(state.busy);
    }

    /// Test: while a sign-in is in flight, input is ignored.
    #[test]
    fn test_busy_swallows_input() {
        let mut state = LoginState::default();
        state.busy = true;
        let outcome = handle_key(&mut state, press(KeyCode::Char('x')), &identity());
        assert!(outcome.effects.is_empty());
        assert!(state.username.is_empty());
    }

    /// Test: a sign-in failure clears the password and surfaces the error.
    #[test]
    fn test_reset_after_failure() {
        let mut state = LoginState::default();
        type_text(&mut state, "user");
        handle_key(&mut state, press(KeyCode::Tab), &identity());
        type_text(&mut state, "pw");
        state.busy = true;

        state.reset_after_failure("invalid credentials".to_string());
        assert!(!state.busy);
        assert!(state.password.is_empty());
        assert_eq!(state.username.value, "user");
        assert_eq!(state.error.as_deref(), Some("invalid credentials"));
    }
}
