use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base, loading_spinner},
    navigation::NavBar,
};

fn import_form_view() -> Markup {
    let spinner = loading_spinner();

    html! {
        form
            id="import-form"
            hx-post=(endpoints::IMPORT_PREVIEW)
            enctype="multipart/form-data"
            hx-disabled-elt="#files, #submit-button"
            hx-indicator="#indicator"
            hx-target="#import-preview"
            hx-swap="innerHTML"
            hx-target-error="#alert-container"
            class="space-y-4 md:space-y-6"
        {
            h2 class="text-xl font-bold" { "Import Transactions" }

            div
            {
                label
                    for="files"
                    class="block mb-2 text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Choose file(s) to upload"
                }

                input
                    id="files"
                    type="file"
                    name="files"
                    accept="text/csv"
                    placeholder="files"
                    multiple
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                p class="mt-2 text-sm text-gray-600 dark:text-gray-400"
                {
                    "Each file needs the columns kind, amount, card_type, bank_or_source, \
                    description and occurred_at. Dates are written as DD/MM/YYYY, \
                    optionally followed by HH:MM:SS. "

                    a href=(endpoints::IMPORT_TEMPLATE) class=(LINK_STYLE) download
                    {
                        "Download a template"
                    }
                }
            }

            button
                type="submit"
                id="submit-button"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (spinner) }
                " Preview Import"
            }
        }

        div id="import-preview" class="mt-6" {}
    }
}

fn import_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::IMPORT_VIEW).into_html();
    let form = import_form_view();

    let content = html! {
        (nav_bar)

        div
            class="flex flex-col items-center px-6 py-8 mx-auto lg:py-0
            text-gray-900 dark:text-white"
        {
            div class="relative max-w-md"
            {
                (form)
            }
        }
    };

    base("Import Transactions", &[], &content)
}

/// Route handler for the import CSV page.
pub async fn get_import_page() -> Response {
    import_view().into_response()
}

#[cfg(test)]
mod import_page_tests {
    use axum::http::StatusCode;
    use scraper::{ElementRef, Selector};

    use crate::{
        csv_import::import_page::get_import_page,
        endpoints,
        test_utils::{
            assert_content_type, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, must_get_input, parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_page() {
        let response = get_import_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::IMPORT_PREVIEW, "hx-post");
        assert_eq!(form.value().attr("id"), Some("import-form"));
        assert_form_enctype(&form, "multipart/form-data");
        assert_file_input(&form, "files");
        assert_form_submit_button(&form);

        let template_links = form
            .select(&Selector::parse(&format!("a[href=\"{}\"]", endpoints::IMPORT_TEMPLATE)).unwrap())
            .count();
        assert_eq!(template_links, 1, "want a link to the CSV template");
    }

    #[track_caller]
    fn assert_form_enctype(form: &ElementRef, enctype: &str) {
        assert_eq!(form.value().attr("enctype"), Some(enctype));
    }

    #[track_caller]
    fn assert_file_input(form: &ElementRef, name: &str) {
        let input = must_get_input(form, name);
        let attribute = |name: &str| input.value().attr(name);

        assert_eq!(attribute("type"), Some("file"));
        assert_eq!(attribute("accept"), Some("text/csv"));
        assert!(attribute("multiple").is_some(), "want several files allowed");
        assert!(attribute("required").is_some(), "want at least one file required");
    }
}
