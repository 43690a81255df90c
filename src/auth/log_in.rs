//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The session module handles the lower level cookie logic.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Username,
    account::{check_password, get_password_hash},
    auth::session::{end_session, start_session},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, LINK_STYLE, base, loading_spinner, log_in_register, password_input,
        username_input,
    },
    ledger::resolve_or_create_table,
};

/// The message shown for an invalid username, an unknown user and a wrong password alike.
pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect username or password.";
const INTERNAL_ERROR_MSG: &str = "An internal error occurred. Please try again later.";

/// How long the session cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

fn log_in_form(username: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-indicator="#indicator"
            hx-disabled-elt="#username, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (username_input(username, None))

            (password_input("", 0, error_message))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                a href=(endpoints::REGISTER_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Register here"
                }
            }
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page() -> Response {
    let log_in_form = log_in_form("", None);
    let content = log_in_register("Log in to your account", &log_in_form);
    base("Log In", &[], &content).into_response()
}

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which session cookies are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the log-in form.
///
/// The username and password are stored as plain strings. The username is
/// validated by the handler so that a malformed username gets the same
/// response as an unknown one.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Username entered during log-in.
    pub username: String,

    /// Password entered during log-in.
    pub password: String,

    /// Whether to extend the initial session duration.
    ///
    /// This value comes from a checkbox, so it either has a string value or is not set
    /// (see the [MDN docs](https://developer.mozilla.org/en-US/docs/Web/HTML/Element/input/checkbox#value_2)).
    /// The `Some` variant should be interpreted as `true` irregardless of the
    /// string value, and the `None` variant should be interpreted as `false`.
    pub remember_me: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the user's ledger is created if needed, the
/// session cookie is set and the client is redirected to the new transaction page.
/// Otherwise, the form is returned with an error message explaining the problem.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let username = match Username::new(&user_data.username) {
        Ok(username) => username,
        Err(_) => {
            return log_in_form(&user_data.username, Some(INVALID_CREDENTIALS_ERROR_MSG))
                .into_response();
        }
    };

    let stored_hash = match state.db_connection.lock() {
        Ok(connection) => get_password_hash(&username, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return log_in_form(username.as_str(), Some(INTERNAL_ERROR_MSG)).into_response();
        }
    };

    let stored_hash = match stored_hash {
        Ok(stored_hash) => stored_hash,
        Err(error) => {
            tracing::error!("Unhandled error while reading credentials: {error}");
            return log_in_form(username.as_str(), Some(INTERNAL_ERROR_MSG)).into_response();
        }
    };

    // The database lock must not be held while bcrypt runs.
    let password = user_data.password;
    let is_match =
        tokio::task::spawn_blocking(move || check_password(stored_hash.as_ref(), &password)).await;

    match is_match {
        Ok(true) => {}
        Ok(false) => {
            return log_in_form(username.as_str(), Some(INVALID_CREDENTIALS_ERROR_MSG))
                .into_response();
        }
        Err(error) => {
            tracing::error!("Password verification task failed: {error}");
            return log_in_form(username.as_str(), Some(INTERNAL_ERROR_MSG)).into_response();
        }
    }

    let ledger = match state.db_connection.lock() {
        Ok(connection) => resolve_or_create_table(&username, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return log_in_form(username.as_str(), Some(INTERNAL_ERROR_MSG)).into_response();
        }
    };

    if let Err(error) = ledger {
        tracing::error!("Could not resolve the ledger for {username}: {error}");
        return log_in_form(username.as_str(), Some(INTERNAL_ERROR_MSG)).into_response();
    }

    let cookie_duration = if user_data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    start_session(jar.clone(), &username, cookie_duration)
        .map(|updated_jar| {
            (
                StatusCode::SEE_OTHER,
                HxRedirect(endpoints::NEW_TRANSACTION_VIEW.to_owned()),
                updated_jar,
            )
        })
        .map_err(|err| {
            tracing::error!("Error starting session: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                end_session(jar),
            )
        })
        .into_response()
}


#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form, Router,
        body::Body,
        extract::State,
        http::{Response, StatusCode},
        routing::post,
    };
    use axum_extra::extract::PrivateCookieJar;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime};

    use crate::{
        PasswordHash, Username, ValidatedPassword,
        account::create_account,
        app_state::create_cookie_key,
        auth::{DEFAULT_SESSION_DURATION, session::COOKIE_SESSION},
        db::initialize,
        endpoints,
        ledger::find_ledger_table,
        test_utils::{assert_hx_redirect, parse_html_fragment},
    };

    use super::{
        INVALID_CREDENTIALS_ERROR_MSG, LogInData, LoginState, REMEMBER_ME_COOKIE_DURATION,
        post_log_in,
    };

    const TEST_PASSWORD: &str = "hunter22";

    fn get_test_state(username: Option<&str>) -> LoginState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        if let Some(username) = username {
            let password_hash =
                PasswordHash::new(ValidatedPassword::new_unchecked(TEST_PASSWORD), 4)
                    .expect("Could not hash password");
            create_account(&Username::new(username).unwrap(), &password_hash, &connection)
                .expect("Could not create test account");
        }

        LoginState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: DEFAULT_SESSION_DURATION,
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn log_in_data(username: &str, password: &str) -> LogInData {
        LogInData {
            username: username.to_owned(),
            password: password.to_owned(),
            remember_me: None,
        }
    }

    async fn new_log_in_request(state: LoginState, log_in_form: LogInData) -> Response<Body> {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        post_log_in(State(state), jar, Form(log_in_form)).await
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let state = get_test_state(Some("ana"));

        let response = new_log_in_request(state, log_in_data("ana", TEST_PASSWORD)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::NEW_TRANSACTION_VIEW);
        assert!(
            response.headers().get("set-cookie").is_some(),
            "want session cookie to be set"
        );
    }

    #[tokio::test]
    async fn log_in_normalizes_username() {
        let state = get_test_state(Some("ana maria"));

        let response = new_log_in_request(state, log_in_data("  Ana   MARIA ", TEST_PASSWORD)).await;

        assert_hx_redirect(&response, endpoints::NEW_TRANSACTION_VIEW);
    }

    #[tokio::test]
    async fn log_in_creates_ledger() {
        let state = get_test_state(Some("ana"));
        let connection = state.db_connection.clone();

        new_log_in_request(state, log_in_data("ana", TEST_PASSWORD)).await;

        let table = find_ledger_table(&Username::new("ana").unwrap(), &connection.lock().unwrap())
            .unwrap()
            .expect("ledger should be bound after log-in");
        assert_eq!(table.as_str(), "ledger_ana");
    }

    #[tokio::test]
    async fn failures_share_one_message() {
        let cases = [
            ("ana", "wrongpassword"),
            ("bob", TEST_PASSWORD),
            ("not-a-valid-username!", TEST_PASSWORD),
        ];

        for (username, password) in cases {
            let state = get_test_state(Some("ana"));

            let response = new_log_in_request(state, log_in_data(username, password)).await;

            assert_eq!(response.status(), StatusCode::OK);
            assert_body_contains_message(response, INVALID_CREDENTIALS_ERROR_MSG).await;
        }
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_credentials() {
        let state = get_test_state(None);
        let app = Router::new()
            .route(endpoints::LOG_IN_API, post(post_log_in))
            .with_state(state);
        let server = TestServer::try_new(app).expect("Could not create test server.");

        server
            .post(endpoints::LOG_IN_API)
            .content_type("application/x-www-form-urlencoded")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    /// Test helper macro to assert that two date times are within a couple
    /// of seconds of each other.
    macro_rules! assert_date_time_close {
        ($left:expr, $right:expr$(,)?) => {
            assert!(
                ($left - $right).abs() < Duration::seconds(2),
                "got date time {:?}, want {:?}",
                $left,
                $right
            );
        };
    }

    #[tokio::test]
    async fn remember_me_extends_session_cookie_through_form() {
        let state = get_test_state(Some("ana"));
        let app = Router::new()
            .route(endpoints::LOG_IN_API, post(post_log_in))
            .with_state(state);
        let server = TestServer::try_new(app).expect("Could not create test server.");
        let form = [
            ("username", "ana"),
            ("password", TEST_PASSWORD),
            ("remember_me", "on"),
        ];

        let response = server.post(endpoints::LOG_IN_API).form(&form).await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        let session_cookie = response.cookie(COOKIE_SESSION);
        assert_date_time_close!(
            session_cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + REMEMBER_ME_COOKIE_DURATION
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn database_is_not_locked_while_password_is_verified() {
        let state = get_test_state(None);
        {
            let connection = state.db_connection.lock().unwrap();
            let slow_hash = PasswordHash::new(ValidatedPassword::new_unchecked(TEST_PASSWORD), 12)
                .expect("Could not hash password");
            create_account(&Username::new("ana").unwrap(), &slow_hash, &connection).unwrap();
        }
        let db_connection = state.db_connection.clone();

        let log_in = tokio::spawn(new_log_in_request(state, log_in_data("ana", TEST_PASSWORD)));
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert!(!log_in.is_finished(), "want bcrypt to still be running");
        assert!(
            db_connection.try_lock().is_ok(),
            "database should be free while the password is checked"
        );

        let response = log_in.await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    async fn assert_body_contains_message(response: Response<Body>, message: &str) {
        let fragment = parse_html_fragment(response).await;
        let error_selector = scraper::Selector::parse("p.text-red-500.text-base").unwrap();
        let error = fragment
            .select(&error_selector)
            .next()
            .expect("expected error message paragraph");
        let error_text = error.text().collect::<String>();
        assert_eq!(
            error_text.trim(),
            message,
            "response body should include error message \"{message}\", got \"{error_text}\""
        );
    }
}
