//! The registration page for creating an account.

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
    AppState, Error, PasswordHash, Username, ValidatedPassword,
    account::{MIN_PASSWORD_LENGTH, create_account},
    auth::session::start_session,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base,
        loading_spinner, log_in_register, password_input, username_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    ledger::resolve_or_create_table,
};

pub const DUPLICATE_USERNAME_ERROR_MSG: &str = "That username is taken, please choose another.";
pub const PASSWORD_MISMATCH_ERROR_MSG: &str = "Passwords do not match";

fn confirm_password_input(min_length: usize, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }

    }
}

#[derive(Default)]
struct FormErrors<'a> {
    username: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(username: &str, errors: FormErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#username, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (username_input(username, errors.username))
            (password_input("", MIN_PASSWORD_LENGTH, errors.password))
            (confirm_password_input(MIN_PASSWORD_LENGTH, errors.confirm_password))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", FormErrors::default());
    let content = log_in_register("Create Account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new account.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which session cookies are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// Create an account, bind its ledger and log the new user in.
///
/// Invalid input and taken usernames are reported on the returned form.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let username = match Username::new(&user_data.username) {
        Ok(username) => username,
        Err(error) => {
            let message = error.to_string();
            return registration_form(
                &user_data.username,
                FormErrors {
                    username: Some(&message),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    let validated_password = match ValidatedPassword::new(&user_data.password) {
        Ok(password) => password,
        Err(error) => {
            let message = error.to_string();
            return registration_form(
                username.as_str(),
                FormErrors {
                    password: Some(&message),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    if user_data.password != user_data.confirm_password {
        return registration_form(
            username.as_str(),
            FormErrors {
                confirm_password: Some(PASSWORD_MISMATCH_ERROR_MSG),
                ..Default::default()
            },
        )
        .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("an error occurred while hashing a password: {e}");

            return get_internal_server_error_redirect();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return get_internal_server_error_redirect();
        }
    };

    match create_account(&username, &password_hash, &connection) {
        Ok(()) => {}
        Err(Error::DuplicateUsername) => {
            return registration_form(
                username.as_str(),
                FormErrors {
                    username: Some(DUPLICATE_USERNAME_ERROR_MSG),
                    ..Default::default()
                },
            )
            .into_response();
        }
        Err(e) => {
            tracing::error!("An unhandled error occurred while creating an account: {e}");
            return get_internal_server_error_redirect();
        }
    }

    if let Err(e) = resolve_or_create_table(&username, &connection) {
        tracing::error!("Could not create the ledger for {username}: {e}");
        return get_internal_server_error_redirect();
    }
    drop(connection);

    tracing::info!("Registered account for {username}");

    match start_session(jar, &username, state.cookie_duration) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::NEW_TRANSACTION_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("An error occurred while starting a session: {e}");

            get_internal_server_error_redirect()
        }
    }
}


#[cfg(test)]
mod register_user_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        body::Body,
        extract::State,
        http::{Response, StatusCode},
    };
    use axum_extra::extract::PrivateCookieJar;
    use rusqlite::Connection;

    use crate::{
        PasswordHash, Username, ValidatedPassword,
        account::{account_exists, create_account, verify_credentials},
        app_state::create_cookie_key,
        auth::DEFAULT_SESSION_DURATION,
        db::initialize,
        endpoints,
        ledger::find_ledger_table,
        test_utils::{assert_hx_redirect, parse_html_fragment},
    };

    use super::{
        DUPLICATE_USERNAME_ERROR_MSG, PASSWORD_MISMATCH_ERROR_MSG, RegisterForm,
        RegistrationState, register_user,
    };

    fn get_test_state() -> RegistrationState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        RegistrationState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: DEFAULT_SESSION_DURATION,
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn form(username: &str, password: &str, confirm_password: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_owned(),
            password: password.to_owned(),
            confirm_password: confirm_password.to_owned(),
        }
    }

    async fn new_register_request(state: RegistrationState, form: RegisterForm) -> Response<Body> {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        register_user(State(state), jar, Form(form)).await
    }

    #[tokio::test]
    async fn register_creates_account_ledger_and_session() {
        let state = get_test_state();
        let connection = state.db_connection.clone();

        let response = new_register_request(state, form("Ana", "hunter22", "hunter22")).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::NEW_TRANSACTION_VIEW);
        assert!(response.headers().get("set-cookie").is_some());

        let connection = connection.lock().unwrap();
        let username = Username::new("ana").unwrap();
        assert!(account_exists(&username, &connection).unwrap());
        assert_eq!(
            verify_credentials(&username, "hunter22", &connection),
            Ok(true)
        );
        assert!(find_ledger_table(&username, &connection).unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_username_shows_error_on_form() {
        let state = get_test_state();
        create_account(
            &Username::new("ana").unwrap(),
            &PasswordHash::new(ValidatedPassword::new_unchecked("hunter22"), 4).unwrap(),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = new_register_request(state, form("ANA", "hunter33", "hunter33")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_error_message(response, DUPLICATE_USERNAME_ERROR_MSG).await;
    }

    #[tokio::test]
    async fn mismatched_passwords_show_error_on_form() {
        let state = get_test_state();

        let response = new_register_request(state, form("ana", "hunter22", "hunter23")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_error_message(response, PASSWORD_MISMATCH_ERROR_MSG).await;
    }

    #[tokio::test]
    async fn short_password_shows_error_on_form() {
        let state = get_test_state();
        let connection = state.db_connection.clone();

        let response = new_register_request(state, form("ana", "abc", "abc")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_error_message(
            response,
            "invalid password: password must be at least 6 characters long",
        )
        .await;
        assert!(!account_exists(&Username::new("ana").unwrap(), &connection.lock().unwrap()).unwrap());
    }

    #[tokio::test]
    async fn invalid_username_shows_error_on_form() {
        let state = get_test_state();

        let response = new_register_request(state, form("ana; DROP TABLE", "hunter22", "hunter22")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let error = html
            .select(&scraper::Selector::parse("input#username + p.text-red-500").unwrap())
            .next()
            .expect("want an error under the username input");
        assert!(error.text().collect::<String>().starts_with("invalid username"));
    }

    async fn assert_error_message(response: Response<Body>, message: &str) {
        let html = parse_html_fragment(response).await;
        let error = html
            .select(&scraper::Selector::parse("p.text-red-500.text-base").unwrap())
            .next()
            .expect("expected error message paragraph")
            .text()
            .collect::<String>();

        assert_eq!(error.trim(), message);
    }
}
