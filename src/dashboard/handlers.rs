//! Dashboard HTTP handler and view rendering.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::Session,
    dashboard::{
        aggregation::ledger_totals,
        cards::summary_cards_view,
        charts::{DashboardChart, ECHARTS_URL, build_dashboard_charts, charts_script, charts_view},
        tables::transactions_table,
    },
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, HeadElement, base, link},
    ledger::{Transaction, list_transactions},
    navigation::NavBar,
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display a page with an overview of the user's ledger.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        list_transactions(&session.username, &connection).inspect_err(|error| {
            tracing::error!("Could not get transactions for {}: {error}", session.username)
        })?
    };

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW);

    if transactions.is_empty() {
        return Ok(dashboard_no_data_view(nav_bar).into_response());
    }

    let charts = build_dashboard_charts(&transactions);

    Ok(dashboard_view(nav_bar, &transactions, &charts).into_response())
}

/// Renders the dashboard page when the ledger is empty.
///
/// Displays a helpful message with links to add transactions manually
/// or via import.
fn dashboard_no_data_view(nav_bar: NavBar) -> Markup {
    let nav_bar = nav_bar.into_html();
    let new_transaction_link = link(endpoints::NEW_TRANSACTION_VIEW, "manually");
    let import_transaction_link = link(endpoints::IMPORT_VIEW, "importing a CSV file");

    let content = html!(
        (nav_bar)

        div
            id="empty-dashboard"
            class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Charts will show up here once you add some transactions.
                You can add transactions " (new_transaction_link) " or
                by " (import_transaction_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

fn ledger_actions_view() -> Markup {
    html! {
        div class="flex flex-col sm:flex-row gap-4 w-full mb-8"
        {
            a
                href=(endpoints::EXPORT)
                download
                class={(BUTTON_PRIMARY_STYLE) " text-center"}
            {
                "Download Transactions (CSV)"
            }

            a
                href=(endpoints::IMPORT_VIEW)
                class={(BUTTON_PRIMARY_STYLE) " text-center"}
            {
                "Import Transactions"
            }
        }
    }
}

/// Renders the main dashboard page with summary cards, charts and the transaction table.
fn dashboard_view(
    nav_bar: NavBar<'_>,
    transactions: &[Transaction],
    charts: &[DashboardChart],
) -> Markup {
    let nav_bar = nav_bar.into_html();
    let totals = ledger_totals(transactions);

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (summary_cards_view(&totals))
            (charts_view(charts))
            (ledger_actions_view())
            (transactions_table(transactions))
        }
    );

    let scripts = [
        HeadElement::ScriptLink(ECHARTS_URL.to_owned()),
        charts_script(charts),
    ];

    base("Dashboard", &scripts, &content)
}

#[cfg(test)]
mod dashboard_route_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::datetime;

    use crate::{
        Username,
        auth::Session,
        db::initialize,
        endpoints,
        ledger::{NewTransaction, insert_transaction},
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
    };

    use super::{DashboardState, get_dashboard_page};

    fn get_state() -> DashboardState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        DashboardState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn session(username: &str) -> Session {
        Session {
            username: Username::new(username).unwrap(),
        }
    }

    fn insert(state: &DashboardState, username: &str, kind: &str, amount: f64, description: &str) {
        let connection = state.db_connection.lock().unwrap();
        insert_transaction(
            &Username::new(username).unwrap(),
            NewTransaction::new(
                kind,
                amount,
                "Debit",
                "Nubank",
                description,
                datetime!(2024-03-05 12:00:00),
            )
            .unwrap(),
            &connection,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn empty_ledger_shows_empty_state() {
        let response = get_dashboard_page(State(get_state()), Extension(session("ana")))
            .await
            .unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(
            html.select(&Selector::parse("#empty-dashboard").unwrap())
                .count(),
            1
        );
        assert_eq!(html.select(&Selector::parse("#charts").unwrap()).count(), 0);
    }

    #[tokio::test]
    async fn dashboard_shows_totals_charts_and_table() {
        let state = get_state();
        insert(&state, "ana", "income", 3000.0, "Salary");
        insert(&state, "ana", "expense", 1200.0, "Rent");
        insert(&state, "bruno", "expense", 99.0, "Other user");

        let response = get_dashboard_page(State(state), Extension(session("ana")))
            .await
            .unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let balance = html
            .select(&Selector::parse("#balance span:last-child").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert_eq!(balance, "R$ 1.800,00");

        for chart_id in [
            "expenses-by-bank-chart",
            "income-sources-chart",
            "cash-flow-chart",
        ] {
            let selector = Selector::parse(&format!("#{chart_id}")).unwrap();
            assert_eq!(html.select(&selector).count(), 1, "want chart {chart_id}");
        }

        let rows = html
            .select(&Selector::parse("#transactions tbody tr").unwrap())
            .count();
        assert_eq!(rows, 2, "want only ana's transactions");

        let export_links = html
            .select(&Selector::parse(&format!("a[href=\"{}\"]", endpoints::EXPORT)).unwrap())
            .count();
        assert_eq!(export_links, 1);
    }
}
