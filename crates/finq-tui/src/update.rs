//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects. Auth transitions have already been
//! applied to the router by the runtime; this reducer reacts to the mirrored
//! `stage` and drives navigation, view data, and notices.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use finq_core::router::{AuthStage, Route, RouteDecision, resolve};

use crate::common::Remote;
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{AppState, Notice};
use crate::views::login::LoginState;
use crate::views::signup::SignupState;
use crate::views::{Outcome, budgeting, expenses, login, profile, reports, signup};

/// The main reducer function.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            vec![]
        }
        UiEvent::Terminal(Event::Key(key)) if key.kind == KeyEventKind::Press => {
            handle_key(app, key)
        }
        UiEvent::Terminal(_) => vec![],

        UiEvent::SessionChecked { result } => {
            if let Err(e) = &result
                && !matches!(e, finq_types::AuthError::NoSession)
            {
                app.notice = Some(Notice::error(format!("Session check failed: {e}")));
            }
            navigate(app, app.route)
        }
        UiEvent::SignInFinished { result } | UiEvent::FederatedFinished { result } => {
            match result {
                Ok(_) => {
                    app.login = LoginState::default();
                    navigate(app, Route::landing())
                }
                Err(e) => {
                    app.login.reset_after_failure(e.to_string());
                    vec![]
                }
            }
        }
        UiEvent::SignUpFinished { result } => {
            match result {
                Ok(pending) => {
                    let email = app.signup.email.trimmed().to_string();
                    app.signup.await_code(email, pending.delivery);
                }
                Err(e) => app.signup.fail(e.to_string()),
            }
            vec![]
        }
        UiEvent::ConfirmFinished { result } => match result {
            Ok(()) => {
                app.signup = SignupState::default();
                app.login = LoginState::default();
                app.login.info = Some("Account confirmed. Sign in to continue.".to_string());
                navigate(app, Route::Login)
            }
            Err(e) => {
                app.signup.fail(e.to_string());
                vec![]
            }
        },
        UiEvent::SignedOut => {
            app.clear_user_data();
            navigate(app, app.route)
        }

        UiEvent::DashboardLoaded { req, result } => {
            if app.dashboard.data.accepts(req) {
                app.dashboard.data = match result {
                    Ok(summary) => Remote::Ready(summary),
                    Err(e) => Remote::Failed(e.to_string()),
                };
            }
            vec![]
        }
        UiEvent::TransactionsLoaded { req, result } => {
            if app.expenses.items.accepts(req) {
                app.expenses.items = match result {
                    Ok(items) => Remote::Ready(items),
                    Err(e) => Remote::Failed(e.to_string()),
                };
                app.expenses.clamp_selection();
            }
            vec![]
        }
        UiEvent::BudgetsLoaded { req, result } => {
            if app.budgeting.items.accepts(req) {
                app.budgeting.items = match result {
                    Ok(items) => Remote::Ready(items),
                    Err(e) => Remote::Failed(e.to_string()),
                };
            }
            vec![]
        }
        UiEvent::ReportsLoaded { req, result } => {
            if app.reports.items.accepts(req) {
                app.reports.items = match result {
                    Ok(items) => Remote::Ready(items),
                    Err(e) => Remote::Failed(e.to_string()),
                };
            }
            vec![]
        }
        UiEvent::ProfileLoaded { req, result } => {
            if app.profile.data.accepts(req) {
                app.profile.data = match result {
                    Ok(prefs) => Remote::Ready(prefs),
                    Err(e) => Remote::Failed(e.to_string()),
                };
            }
            vec![]
        }

        UiEvent::WriteFinished {
            collection, result, ..
        } => {
            use finq_core::api::Collection;
            match collection {
                Collection::Transactions => app.expenses.busy = false,
                Collection::Budgets => app.budgeting.busy = false,
                Collection::Profile => app.profile.busy = false,
                Collection::Reports => app.reports.busy = false,
                Collection::Dashboard => {}
            }
            match result {
                // A completed write is followed by a re-fetch of the same
                // collection so the list reflects the server's state.
                Ok(()) => refetch_collection(app, collection),
                Err(e) => {
                    app.notice = Some(Notice::error(format!("Save failed: {e}")));
                    vec![]
                }
            }
        }
    }
}

/// Routes a navigation request through the routing contract and mounts the
/// target view, issuing its initial load.
pub fn navigate(app: &mut AppState, requested: Route) -> Vec<UiEffect> {
    match resolve(app.stage, requested) {
        RouteDecision::Pending => {
            app.route = requested;
            vec![]
        }
        RouteDecision::Render(route) | RouteDecision::Redirect(route) => {
            app.route = route;
            mount(app, route)
        }
    }
}

fn mount(app: &mut AppState, route: Route) -> Vec<UiEffect> {
    match route {
        Route::Login | Route::Signup => vec![],
        Route::Dashboard => {
            let req = app.seq.next();
            app.dashboard.data = Remote::Loading { req };
            vec![UiEffect::LoadDashboard { req }]
        }
        Route::Expenses => {
            let req = app.seq.next();
            app.expenses.items = Remote::Loading { req };
            vec![UiEffect::LoadTransactions { req }]
        }
        Route::Budgeting => {
            let req = app.seq.next();
            app.budgeting.items = Remote::Loading { req };
            vec![UiEffect::LoadBudgets { req }]
        }
        Route::Reports => {
            let req = app.seq.next();
            app.reports.items = Remote::Loading { req };
            vec![UiEffect::LoadReports { req }]
        }
        Route::Profile => {
            let req = app.seq.next();
            app.profile.data = Remote::Loading { req };
            vec![UiEffect::LoadProfile { req }]
        }
    }
}

fn refetch_collection(app: &mut AppState, collection: finq_core::api::Collection) -> Vec<UiEffect> {
    use finq_core::api::Collection;
    match collection {
        Collection::Transactions => {
            let req = app.seq.next();
            app.expenses.items = Remote::Loading { req };
            vec![UiEffect::LoadTransactions { req }]
        }
        Collection::Budgets => {
            let req = app.seq.next();
            app.budgeting.items = Remote::Loading { req };
            vec![UiEffect::LoadBudgets { req }]
        }
        Collection::Profile => {
            let req = app.seq.next();
            app.profile.data = Remote::Loading { req };
            vec![UiEffect::LoadProfile { req }]
        }
        Collection::Reports => {
            let req = app.seq.next();
            app.reports.items = Remote::Loading { req };
            vec![UiEffect::LoadReports { req }]
        }
        Collection::Dashboard => {
            let req = app.seq.next();
            app.dashboard.data = Remote::Loading { req };
            vec![UiEffect::LoadDashboard { req }]
        }
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return vec![UiEffect::Quit];
    }

    // Any keypress dismisses a notice; Esc is consumed by the dismissal.
    if app.notice.take().is_some() && key.code == KeyCode::Esc {
        return vec![];
    }

    match app.stage {
        AuthStage::Unknown => vec![],
        AuthStage::Unauthenticated => {
            let outcome = match app.route {
                Route::Signup => signup::handle_key(&mut app.signup, key),
                _ => login::handle_key(&mut app.login, key, &app.identity),
            };
            apply_outcome(app, outcome)
        }
        AuthStage::Authenticated => handle_authenticated_key(app, key),
    }
}

fn handle_authenticated_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    if !app.capturing_input() {
        match key.code {
            KeyCode::Char('q') => return vec![UiEffect::Quit],
            KeyCode::Char('o') => return vec![UiEffect::SignOut],
            KeyCode::Char('1') => return navigate(app, Route::Dashboard),
            KeyCode::Char('2') => return navigate(app, Route::Expenses),
            KeyCode::Char('3') => return navigate(app, Route::Budgeting),
            KeyCode::Char('4') => return navigate(app, Route::Reports),
            KeyCode::Char('5') => return navigate(app, Route::Profile),
            _ => {}
        }
    }

    let outcome = match app.route {
        Route::Dashboard => match key.code {
            KeyCode::Char('g') => {
                return mount(app, Route::Dashboard);
            }
            _ => Outcome::none(),
        },
        Route::Expenses => expenses::handle_key(&mut app.expenses, key, &mut app.seq),
        Route::Budgeting => budgeting::handle_key(&mut app.budgeting, key, &mut app.seq),
        Route::Reports => reports::handle_key(&mut app.reports, key, &mut app.seq),
        Route::Profile => profile::handle_key(&mut app.profile, key, &mut app.seq),
        Route::Login | Route::Signup => Outcome::none(),
    };
    apply_outcome(app, outcome)
}

fn apply_outcome(app: &mut AppState, outcome: Outcome) -> Vec<UiEffect> {
    let mut effects = outcome.effects;
    if let Some(route) = outcome.navigate {
        effects.extend(navigate(app, route));
    }
    effects
}

#[cfg(test)]
mod tests {
    use finq_core::config::IdentityConfig;
    use finq_types::{ApiError, Transaction};

    use super::*;

    fn app() -> AppState {
        AppState::new(IdentityConfig {
            region: "us-east-1".to_string(),
            user_pool_id: "pool".to_string(),
            client_id: "client".to_string(),
            oauth_domain: "auth.example.com".to_string(),
            redirect_sign_in: "http://localhost:3000/".to_string(),
            redirect_sign_out: "http://localhost:3000/".to_string(),
            base_url: None,
        })
    }

    fn authed_app() -> AppState {
        let mut app = app();
        app.stage = AuthStage::Authenticated;
        app.user_id = Some("user-1".to_string());
        app
    }

    fn press(code: KeyCode) -> UiEvent {
        UiEvent::Terminal(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    /// Test: while the stage is unknown nothing renders or reacts; once the
    /// session check fails the app lands on the login screen.
    #[test]
    fn test_unknown_stage_then_login() {
        let mut app = app();
        assert!(update(&mut app, press(KeyCode::Char('2'))).is_empty());
        assert_eq!(app.route, Route::Dashboard);

        app.stage = AuthStage::Unauthenticated;
        update(
            &mut app,
            UiEvent::SessionChecked {
                result: Err(finq_types::AuthError::NoSession),
            },
        );
        assert_eq!(app.route, Route::Login);
        assert!(app.notice.is_none());
    }

    /// Test: a successful session check mounts the dashboard with a load.
    #[test]
    fn test_session_check_mounts_dashboard() {
        let mut app = app();
        app.stage = AuthStage::Authenticated;
        let effects = update(
            &mut app,
            UiEvent::SessionChecked {
                result: Ok(finq_core::session::Session::signed_in("user-1")),
            },
        );
        assert_eq!(app.route, Route::Dashboard);
        assert!(matches!(effects.as_slice(), [UiEffect::LoadDashboard { .. }]));
        assert!(app.dashboard.data.is_loading());
    }

    /// Test: navigating while authenticated switches route and issues the
    /// view's initial load.
    #[test]
    fn test_navigation_mounts_view() {
        let mut app = authed_app();
        let effects = update(&mut app, press(KeyCode::Char('2')));
        assert_eq!(app.route, Route::Expenses);
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::LoadTransactions { .. }]
        ));
    }

    /// Test: a result from an abandoned request is dropped; only the latest
    /// request's result lands.
    #[test]
    fn test_stale_result_suppressed() {
        let mut app = authed_app();
        update(&mut app, press(KeyCode::Char('2')));
        let Remote::Loading { req: first } = app.expenses.items else {
            panic!("expected loading");
        };

        // Navigate away and back: a newer request supersedes the first.
        update(&mut app, press(KeyCode::Char('1')));
        update(&mut app, press(KeyCode::Char('2')));
        let Remote::Loading { req: second } = app.expenses.items else {
            panic!("expected loading");
        };
        assert_ne!(first, second);

        update(
            &mut app,
            UiEvent::TransactionsLoaded {
                req: first,
                result: Ok(vec![sample_tx("stale")]),
            },
        );
        assert!(app.expenses.items.is_loading());

        update(
            &mut app,
            UiEvent::TransactionsLoaded {
                req: second,
                result: Ok(vec![sample_tx("fresh")]),
            },
        );
        assert_eq!(app.expenses.items.ready().unwrap()[0].name, "fresh");
    }

    /// Test: a completed write clears busy and re-fetches the collection.
    #[test]
    fn test_write_triggers_refetch() {
        let mut app = authed_app();
        app.route = Route::Expenses;
        app.expenses.busy = true;

        let req = app.seq.next();
        let effects = update(
            &mut app,
            UiEvent::WriteFinished {
                req,
                collection: finq_core::api::Collection::Transactions,
                result: Ok(()),
            },
        );
        assert!(!app.expenses.busy);
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::LoadTransactions { .. }]
        ));
    }

    /// Test: a finished report generation clears busy and re-fetches the
    /// reports list.
    #[test]
    fn test_report_generation_triggers_refetch() {
        let mut app = authed_app();
        app.route = Route::Reports;
        app.reports.busy = true;

        let req = app.seq.next();
        let effects = update(
            &mut app,
            UiEvent::WriteFinished {
                req,
                collection: finq_core::api::Collection::Reports,
                result: Ok(()),
            },
        );
        assert!(!app.reports.busy);
        assert!(app.reports.items.is_loading());
        assert!(matches!(effects.as_slice(), [UiEffect::LoadReports { .. }]));
    }

    /// Test: a failed write keeps the current list and raises a notice.
    #[test]
    fn test_write_failure_raises_notice() {
        let mut app = authed_app();
        app.expenses.items = Remote::Ready(vec![sample_tx("kept")]);
        app.expenses.busy = true;

        let req = app.seq.next();
        let effects = update(
            &mut app,
            UiEvent::WriteFinished {
                req,
                collection: finq_core::api::Collection::Transactions,
                result: Err(ApiError::request_failed(500, "boom")),
            },
        );
        assert!(effects.is_empty());
        assert!(!app.expenses.busy);
        assert_eq!(app.expenses.items.ready().unwrap()[0].name, "kept");
        assert!(app.notice.as_ref().unwrap().error);
    }

    /// Test: sign-out clears user data and redirects to login.
    #[test]
    fn test_signed_out_redirects_to_login() {
        let mut app = authed_app();
        app.route = Route::Expenses;
        app.expenses.items = Remote::Ready(vec![sample_tx("secret")]);

        app.stage = AuthStage::Unauthenticated;
        update(&mut app, UiEvent::SignedOut);
        assert_eq!(app.route, Route::Login);
        assert!(app.expenses.items.ready().is_none());
        assert!(app.user_id.is_none());
    }

    /// Test: a failed sign-in keeps the login route and shows the mapped
    /// error.
    #[test]
    fn test_sign_in_failure() {
        let mut app = app();
        app.stage = AuthStage::Unauthenticated;
        app.route = Route::Login;
        app.login.busy = true;

        update(
            &mut app,
            UiEvent::SignInFinished {
                result: Err(finq_types::AuthError::InvalidCredentials),
            },
        );
        assert_eq!(app.route, Route::Login);
        assert!(!app.login.busy);
        assert_eq!(app.login.error.as_deref(), Some("invalid credentials"));
    }

    /// Test: confirming a sign-up lands on login with a banner.
    #[test]
    fn test_confirm_lands_on_login() {
        let mut app = app();
        app.stage = AuthStage::Unauthenticated;
        app.route = Route::Signup;

        update(&mut app, UiEvent::ConfirmFinished { result: Ok(()) });
        assert_eq!(app.route, Route::Login);
        assert!(app.login.info.is_some());
    }

    fn sample_tx(name: &str) -> Transaction {
        Transaction {
            id: Some("t-1".to_string()),
            name: name.to_string(),
            amount: 1.0,
            date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            kind: finq_types::TransactionKind::Expense,
        }
    }
}
