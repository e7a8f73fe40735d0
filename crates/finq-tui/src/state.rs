//! Application state composition.
//!
//! ```text
//! AppState
//! ├── stage / user_id   (mirrored from the auth router by the runtime)
//! ├── route             (current screen)
//! ├── notice            (transient dismissible banner)
//! ├── seq               (request id generator for stale suppression)
//! └── one state struct per view
//! ```
//!
//! The reducer in `update` is the only writer; the runtime mirrors auth
//! transitions into `stage`/`user_id` before each reducer call.

use finq_core::config::IdentityConfig;
use finq_core::router::{AuthStage, Route};

use crate::events::RequestSeq;
use crate::views::budgeting::BudgetingState;
use crate::views::dashboard::DashboardState;
use crate::views::expenses::ExpensesState;
use crate::views::login::LoginState;
use crate::views::profile::ProfileState;
use crate::views::reports::ReportsState;
use crate::views::signup::SignupState;

/// Transient banner shown on the status line until dismissed.
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub error: bool,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: true,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: false,
        }
    }
}

/// Top-level TUI state.
pub struct AppState {
    pub should_quit: bool,
    pub stage: AuthStage,
    pub user_id: Option<String>,
    pub route: Route,
    pub notice: Option<Notice>,
    pub spinner_frame: usize,
    pub seq: RequestSeq,

    pub login: LoginState,
    pub signup: SignupState,
    pub dashboard: DashboardState,
    pub expenses: ExpensesState,
    pub budgeting: BudgetingState,
    pub reports: ReportsState,
    pub profile: ProfileState,

    /// Identity endpoints, needed by the login view to build hosted-UI URLs.
    pub identity: IdentityConfig,
}

impl AppState {
    pub fn new(identity: IdentityConfig) -> Self {
        Self {
            should_quit: false,
            stage: AuthStage::Unknown,
            user_id: None,
            route: Route::Dashboard,
            notice: None,
            spinner_frame: 0,
            seq: RequestSeq::default(),
            login: LoginState::default(),
            signup: SignupState::default(),
            dashboard: DashboardState::default(),
            expenses: ExpensesState::default(),
            budgeting: BudgetingState::default(),
            reports: ReportsState::default(),
            profile: ProfileState::default(),
            identity,
        }
    }

    /// Display currency, from the loaded profile or the default.
    pub fn currency(&self) -> &str {
        self.profile
            .data
            .ready()
            .map_or("USD", |prefs| prefs.currency.as_str())
    }

    /// True when the current view has a form swallowing plain keys.
    pub fn capturing_input(&self) -> bool {
        match self.route {
            Route::Expenses => self.expenses.capturing_input(),
            Route::Budgeting => self.budgeting.capturing_input(),
            Route::Profile => self.profile.capturing_input(),
            Route::Reports => self.reports.capturing_input(),
            Route::Login | Route::Signup => true,
            Route::Dashboard => false,
        }
    }

    /// Drops all per-user view data. Called on sign-out.
    pub fn clear_user_data(&mut self) {
        self.dashboard = DashboardState::default();
        self.expenses = ExpensesState::default();
        self.budgeting = BudgetingState::default();
        self.reports = ReportsState::default();
        self.profile = ProfileState::default();
        self.user_id = None;
    }
}
