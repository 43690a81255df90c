//! Log-out route handler that ends the session and redirects users.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;

use crate::{auth::session::end_session, endpoints};

/// End the session and redirect the client to the log-in page.
pub async fn get_log_out(jar: PrivateCookieJar) -> Response {
    let jar = end_session(jar);

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}
