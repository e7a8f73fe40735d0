//! TUI runtime. Owns the terminal, runs the event loop, executes effects.
//!
//! This is the "Elm runtime" boundary: all side effects happen here. The
//! reducer stays pure and produces effects; this module executes them.
//!
//! ## Inbox Pattern
//!
//! Async results arrive on a single inbox channel:
//! - Effect handlers send `UiEvent`s to `inbox_tx`
//! - The runtime drains `inbox_rx` each frame
//!
//! Auth-bearing events pass through the [`AuthRouter`] before the reducer
//! sees them, so the reducer always observes a stage the router has already
//! committed (and persisted).

use std::future::Future;
use std::io::Stdout;

use anyhow::{Context, Result};
use crossterm::event;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use finq_core::api::{Collection, ResourceClient};
use finq_core::config::Config;
use finq_core::events::AuthEvent;
use finq_core::identity::{IdentityClient, hosted_ui};
use finq_core::router::AuthRouter;
use finq_core::session::{Session, SessionStore};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Tick cadence while async work is in flight (spinner animation).
pub const FRAME_DURATION: std::time::Duration = std::time::Duration::from_millis(50);

/// Poll duration when idle. Longer timeout reduces CPU usage.
pub const IDLE_POLL_DURATION: std::time::Duration = std::time::Duration::from_millis(250);

/// Full-screen TUI runtime.
///
/// Owns the terminal and state. Terminal state is restored on drop, panic,
/// or Ctrl+C.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    router: AuthRouter,
    identity: IdentityClient,
    api: ResourceClient,
    inbox_tx: mpsc::UnboundedSender<UiEvent>,
    inbox_rx: mpsc::UnboundedReceiver<UiEvent>,
    last_tick: std::time::Instant,
}

impl TuiRuntime {
    /// Creates a new TUI runtime.
    ///
    /// # Errors
    /// Returns an error if terminal setup fails.
    pub fn new(config: Config) -> Result<Self> {
        // Panic hook goes in BEFORE entering the alternate screen
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let identity = IdentityClient::new(config.identity.clone());
        let api = ResourceClient::new(&config.api);
        let (router, _stage_rx) = AuthRouter::new(SessionStore::new());
        let state = AppState::new(config.identity);

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        Ok(Self {
            terminal,
            state,
            router,
            identity,
            api,
            inbox_tx,
            inbox_rx,
            last_tick: std::time::Instant::now(),
        })
    }

    /// Runs the main event loop.
    ///
    /// # Errors
    /// Returns an error if terminal I/O fails.
    pub fn run(&mut self) -> Result<()> {
        // Resolve the session before anything renders
        self.execute_effect(UiEffect::CheckSession);
        self.event_loop()
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.should_quit {
            let events = self.collect_events()?;

            for event in events {
                // Terminal events update state but batch renders to the next
                // Tick; everything else renders immediately.
                if !matches!(&event, UiEvent::Terminal(_)) {
                    dirty = true;
                }
                self.dispatch_event(event);
            }

            if dirty {
                self.terminal.draw(|frame| {
                    render::render(&self.state, frame);
                })?;
                dirty = false;
            }
        }

        Ok(())
    }

    /// Collects events from the terminal and the inbox.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let tick_interval = if self.work_in_flight() {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            std::time::Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(std::time::Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = std::time::Instant::now();
        }

        Ok(events)
    }

    /// Whether any async operation is pending (drives the spinner cadence).
    fn work_in_flight(&self) -> bool {
        use finq_core::router::AuthStage;
        self.state.stage == AuthStage::Unknown
            || self.state.login.busy
            || self.state.signup.busy
            || self.state.expenses.busy
            || self.state.budgeting.busy
            || self.state.profile.busy
            || self.state.dashboard.data.is_loading()
            || self.state.expenses.items.is_loading()
            || self.state.budgeting.items.is_loading()
            || self.state.reports.items.is_loading()
            || self.state.profile.data.is_loading()
    }

    fn dispatch_event(&mut self, event: UiEvent) {
        self.apply_auth_transition(&event);
        let effects = update::update(&mut self.state, event);
        self.execute_effects(effects);
    }

    /// Commits auth-bearing events to the router before the reducer runs,
    /// then mirrors the router's stage into the UI state.
    fn apply_auth_transition(&mut self, event: &UiEvent) {
        match event {
            UiEvent::SessionChecked { result } => {
                self.router.apply_session_check(result.clone());
            }
            UiEvent::SignInFinished { result: Ok(session) }
            | UiEvent::FederatedFinished { result: Ok(session) } => {
                if let Some(user_id) = &session.user_id {
                    self.router.apply_event(AuthEvent::SignedIn {
                        user_id: user_id.clone(),
                    });
                }
            }
            UiEvent::SignedOut => {
                self.router.apply_event(AuthEvent::SignedOut);
            }
            _ => return,
        }

        self.state.stage = self.router.stage();
        let user_id = self.router.session().user_id.clone();
        self.api.set_user(user_id.clone());
        self.state.user_id = user_id;
    }

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Spawns an async effect, sending the produced event into the inbox.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(f().await);
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }
            UiEffect::OpenBrowser { url } => {
                if let Err(e) = open::that(&url) {
                    tracing::warn!("Failed to open browser: {e:#}");
                }
            }

            UiEffect::CheckSession => {
                let identity = self.identity.clone();
                self.spawn_effect(move || async move {
                    UiEvent::SessionChecked {
                        result: identity.fetch_session().await,
                    }
                });
            }
            UiEffect::SignIn { username, password } => {
                let identity = self.identity.clone();
                self.spawn_effect(move || async move {
                    UiEvent::SignInFinished {
                        result: identity.sign_in(&username, &password).await,
                    }
                });
            }
            UiEffect::SignUp { email, password } => {
                let identity = self.identity.clone();
                self.spawn_effect(move || async move {
                    UiEvent::SignUpFinished {
                        result: identity.sign_up(&email, &password).await,
                    }
                });
            }
            UiEffect::ConfirmSignUp { email, code } => {
                let identity = self.identity.clone();
                self.spawn_effect(move || async move {
                    UiEvent::ConfirmFinished {
                        result: identity.confirm_sign_up(&email, &code).await,
                    }
                });
            }
            UiEffect::SignOut => {
                let identity = self.identity.clone();
                self.spawn_effect(move || async move {
                    identity.sign_out().await;
                    UiEvent::SignedOut
                });
            }
            UiEffect::ExchangeFederatedCode { code, verifier } => {
                let identity = self.identity.clone();
                let config = self.state.identity.clone();
                self.spawn_effect(move || async move {
                    let result = hosted_ui::exchange_code(&config, &code, &verifier)
                        .await
                        .map(|creds| {
                            identity.adopt_credentials(&creds);
                            Session::signed_in(creds.user_id)
                        });
                    UiEvent::FederatedFinished { result }
                });
            }

            UiEffect::LoadDashboard { req } => {
                let api = self.api.clone();
                self.spawn_effect(move || async move {
                    UiEvent::DashboardLoaded {
                        req,
                        result: api.dashboard_summary().await,
                    }
                });
            }
            UiEffect::LoadTransactions { req } => {
                let api = self.api.clone();
                self.spawn_effect(move || async move {
                    UiEvent::TransactionsLoaded {
                        req,
                        result: api.list(Collection::Transactions).await,
                    }
                });
            }
            UiEffect::LoadBudgets { req } => {
                let api = self.api.clone();
                self.spawn_effect(move || async move {
                    UiEvent::BudgetsLoaded {
                        req,
                        result: api.list(Collection::Budgets).await,
                    }
                });
            }
            UiEffect::LoadReports { req } => {
                let api = self.api.clone();
                self.spawn_effect(move || async move {
                    UiEvent::ReportsLoaded {
                        req,
                        result: api.list(Collection::Reports).await,
                    }
                });
            }
            UiEffect::LoadProfile { req } => {
                let api = self.api.clone();
                self.spawn_effect(move || async move {
                    UiEvent::ProfileLoaded {
                        req,
                        result: api.fetch_profile().await,
                    }
                });
            }

            UiEffect::CreateTransaction { req, transaction } => {
                let api = self.api.clone();
                self.spawn_effect(move || async move {
                    let result = api
                        .create::<_, serde_json::Value>(Collection::Transactions, &transaction)
                        .await
                        .map(|_| ());
                    UiEvent::WriteFinished {
                        req,
                        collection: Collection::Transactions,
                        result,
                    }
                });
            }
            UiEffect::UpdateTransaction {
                req,
                id,
                transaction,
            } => {
                let api = self.api.clone();
                self.spawn_effect(move || async move {
                    let result = api
                        .update::<_, serde_json::Value>(Collection::Transactions, &id, &transaction)
                        .await
                        .map(|_| ());
                    UiEvent::WriteFinished {
                        req,
                        collection: Collection::Transactions,
                        result,
                    }
                });
            }
            UiEffect::DeleteTransaction { req, id } => {
                let api = self.api.clone();
                self.spawn_effect(move || async move {
                    UiEvent::WriteFinished {
                        req,
                        collection: Collection::Transactions,
                        result: api.remove(Collection::Transactions, &id).await,
                    }
                });
            }

            UiEffect::SaveBudget {
                req,
                budget,
                existing,
            } => {
                let api = self.api.clone();
                self.spawn_effect(move || async move {
                    // Budgets are keyed by category name, not a server id
                    let result = if existing {
                        api.update::<_, serde_json::Value>(
                            Collection::Budgets,
                            &budget.category,
                            &budget,
                        )
                        .await
                        .map(|_| ())
                    } else {
                        api.create::<_, serde_json::Value>(Collection::Budgets, &budget)
                            .await
                            .map(|_| ())
                    };
                    UiEvent::WriteFinished {
                        req,
                        collection: Collection::Budgets,
                        result,
                    }
                });
            }
            UiEffect::DeleteBudget { req, category } => {
                let api = self.api.clone();
                self.spawn_effect(move || async move {
                    UiEvent::WriteFinished {
                        req,
                        collection: Collection::Budgets,
                        result: api.remove(Collection::Budgets, &category).await,
                    }
                });
            }

            UiEffect::GenerateReport { req, report } => {
                let api = self.api.clone();
                self.spawn_effect(move || async move {
                    // Generation is a create; the server fills in the id,
                    // timestamp, and summary
                    let result = api
                        .create::<_, serde_json::Value>(Collection::Reports, &report)
                        .await
                        .map(|_| ());
                    UiEvent::WriteFinished {
                        req,
                        collection: Collection::Reports,
                        result,
                    }
                });
            }

            UiEffect::SaveProfile { req, profile } => {
                let api = self.api.clone();
                self.spawn_effect(move || async move {
                    let result = api.update_profile(&profile).await.map(|_| ());
                    UiEvent::WriteFinished {
                        req,
                        collection: Collection::Profile,
                        result,
                    }
                });
            }
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        let _ = terminal::restore_terminal();
    }
}
