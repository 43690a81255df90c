//! Alert system for displaying success and error messages to users.
//!
//! Alerts are swapped out-of-band into the `#alert-container` element that
//! [base](crate::html::base) places on every page, so a form can use `hx-swap="none"`
//! and still show the outcome of a request.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

const ALERT_CONTAINER_STYLE: &str = "w-full max-w-md px-4";
const ALERT_CONTAINER_POSITION: &str =
    "position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;";
const SUCCESS_STYLE: &str = "flex items-start gap-3 p-4 mb-4 rounded-lg border \
    text-green-800 border-green-300 bg-green-50 dark:bg-gray-800 \
    dark:text-green-400 dark:border-green-800";
const ERROR_STYLE: &str = "flex items-start gap-3 p-4 mb-4 rounded-lg border \
    text-red-800 border-red-300 bg-red-50 dark:bg-gray-800 \
    dark:text-red-400 dark:border-red-800";

/// A message to show the user after a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with extra details.
    Success {
        /// The headline.
        message: String,
        /// A longer explanation shown under the headline.
        details: String,
    },
    /// A success message with no details.
    SuccessSimple {
        /// The headline.
        message: String,
    },
    /// An error message with extra details.
    Error {
        /// The headline.
        message: String,
        /// A longer explanation shown under the headline.
        details: String,
    },
    /// An error message with no details.
    ErrorSimple {
        /// The headline.
        message: String,
    },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (style, message, details) = match self {
            Alert::Success { message, details } => (SUCCESS_STYLE, message, Some(details)),
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, message, None),
            Alert::Error { message, details } => (ERROR_STYLE, message, Some(details)),
            Alert::ErrorSimple { message } => (ERROR_STYLE, message, None),
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class=(ALERT_CONTAINER_STYLE)
                style=(ALERT_CONTAINER_POSITION)
            {
                div role="alert" class=(style)
                {
                    div class="flex-1"
                    {
                        p class="font-medium" { (message) }

                        @if let Some(details) = details.filter(|details| !details.is_empty())
                        {
                            p class="mt-1 text-sm whitespace-pre-line" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Dismiss"
                        class="text-sm font-semibold"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "✕"
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
