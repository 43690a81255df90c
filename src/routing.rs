//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post},
};

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    csv_import::{
        export_transactions, get_import_page, get_import_template, import_transactions,
        preview_import,
    },
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    transaction::{create_transaction_endpoint, get_new_transaction_page},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_new_transaction_page),
        )
        .route(endpoints::IMPORT_VIEW, get(get_import_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(endpoints::IMPORT, post(import_transactions))
            .route(endpoints::IMPORT_PREVIEW, post(preview_import))
            .route(endpoints::EXPORT, get(export_transactions))
            .route(endpoints::IMPORT_TEMPLATE, get(get_import_template))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}


#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{AppState, LedgerConfig, endpoints};

    use super::build_router;

    fn get_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "foobar",
            "Etc/UTC",
            LedgerConfig::default(),
        )
        .unwrap();

        TestServer::try_new(build_router(state)).unwrap()
    }

    #[tokio::test]
    async fn protected_pages_redirect_to_log_in() {
        let server = get_server();

        for endpoint in [
            endpoints::DASHBOARD_VIEW,
            endpoints::NEW_TRANSACTION_VIEW,
            endpoints::IMPORT_VIEW,
        ] {
            let response = server.get(endpoint).await;

            response.assert_status(StatusCode::SEE_OTHER);
            assert_eq!(
                response.header("location"),
                endpoints::LOG_IN_VIEW,
                "{endpoint} should redirect to the log-in page"
            );
        }
    }

    #[tokio::test]
    async fn htmx_endpoints_redirect_with_hx_redirect() {
        let server = get_server();

        let response = server.get(endpoints::EXPORT).await;

        assert_eq!(response.header("hx-redirect"), endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn registered_user_can_record_and_export() {
        let server = get_server();

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("username", "ana"),
                ("password", "hunter22"),
                ("confirm_password", "hunter22"),
            ])
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        let session_cookie = response.cookie("session");

        server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookie(session_cookie.clone())
            .form(&[
                ("kind", "expense"),
                ("amount", "45,50"),
                ("card_type", "debit"),
                ("bank_or_source", "Nubank"),
                ("description", "Groceries"),
                ("date", "2024-03-05"),
                ("time", "14:30"),
            ])
            .await
            .assert_status_ok();

        server
            .get(endpoints::DASHBOARD_VIEW)
            .add_cookie(session_cookie.clone())
            .await
            .assert_status_ok();

        let export = server
            .get(endpoints::EXPORT)
            .add_cookie(session_cookie)
            .await;
        export.assert_status_ok();
        export.assert_text(
            "kind,amount,card_type,bank_or_source,description,occurred_at\n\
            expense,45.5,debit,Nubank,Groceries,05/03/2024 14:30:00\n",
        );
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_server();

        server
            .get("/no/such/page")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
