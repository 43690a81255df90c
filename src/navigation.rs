//! The navigation bar shown at the top of every logged-in page, and docked
//! at the bottom of the screen on small displays.

use maud::{Markup, html};

use crate::endpoints;

/// The pages reachable from the navigation bar, in display order.
const PAGES: [(&str, &str); 3] = [
    (endpoints::DASHBOARD_VIEW, "Dashboard"),
    (endpoints::NEW_TRANSACTION_VIEW, "New"),
    (endpoints::IMPORT_VIEW, "Import"),
];

const DESKTOP_ACTIVE_STYLE: &str = "block py-2 px-3 text-white bg-blue-700 rounded-sm \
    lg:bg-transparent lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500";
const DESKTOP_INACTIVE_STYLE: &str = "block py-2 px-3 text-gray-900 rounded-sm \
    hover:bg-gray-100 lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0 \
    dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700";
const MOBILE_ACTIVE_STYLE: &str = "flex w-full items-center justify-center rounded-lg \
    bg-blue-50 px-2.5 py-2 text-xs font-semibold text-blue-700 shadow-sm sm:text-sm \
    dark:bg-blue-900/30 dark:text-blue-200";
const MOBILE_INACTIVE_STYLE: &str = "flex w-full items-center justify-center rounded-lg \
    px-2.5 py-2 text-xs font-semibold text-gray-600 sm:text-sm hover:text-blue-700 \
    dark:text-gray-300 dark:hover:text-blue-200";

struct NavLink<'a> {
    url: &'a str,
    title: &'a str,
    is_current: bool,
}

/// The navigation bar with the link for the current page highlighted.
pub struct NavBar<'a> {
    links: Vec<NavLink<'a>>,
}

impl<'a> NavBar<'a> {
    /// Build the navigation bar for the page served at `active_endpoint`.
    ///
    /// Pages not in the bar, e.g. the log-in page, highlight nothing.
    pub fn new(active_endpoint: &str) -> NavBar<'a> {
        let mut links: Vec<NavLink<'a>> = PAGES
            .iter()
            .map(|&(url, title)| NavLink {
                url,
                title,
                is_current: url == active_endpoint,
            })
            .collect();

        links.push(NavLink {
            url: endpoints::LOG_OUT,
            title: "Log out",
            is_current: false,
        });

        NavBar { links }
    }

    /// Render the desktop bar and the docked mobile bar.
    pub fn into_html(self) -> Markup {
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a href=(endpoints::ROOT) class="flex items-center"
                    {
                        span class="text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Pocket Ledger"
                        }
                    }

                    ul
                        class="hidden lg:flex font-medium flex-row space-x-8
                        bg-white dark:bg-gray-900"
                    {
                        @for link in &self.links {
                            li
                            {
                                a
                                    href=(link.url)
                                    class=(if link.is_current { DESKTOP_ACTIVE_STYLE } else { DESKTOP_INACTIVE_STYLE })
                                {
                                    (link.title)
                                }
                            }
                        }
                    }
                }
            }

            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden" aria-label="Primary"
            {
                ul
                    class="mx-4 mb-4 grid grid-cols-4 gap-2 px-4 py-3 rounded-xl border
                    border-gray-200 bg-white/95 shadow-lg dark:border-gray-700 dark:bg-gray-900/95"
                {
                    @for link in &self.links {
                        li class="min-w-0"
                        {
                            a
                                href=(link.url)
                                class=(if link.is_current { MOBILE_ACTIVE_STYLE } else { MOBILE_INACTIVE_STYLE })
                                aria-current=[link.is_current.then_some("page")]
                            {
                                span class="truncate" { (link.title) }
                            }
                        }
                    }
                }
            }
        )
    }
}
