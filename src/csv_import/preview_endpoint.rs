//! Shows the first rows of an upload so the user can check them before importing.

use axum::{
    extract::Multipart,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    csv_import::{
        csv::CSV_COLUMNS,
        import_transactions::{UploadedFile, read_uploaded_files},
    },
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE},
};

/// How many rows are shown before the user confirms the import.
const PREVIEW_ROW_COUNT: usize = 5;

/// Route handler that parses the uploaded CSV files without writing anything.
///
/// Responds with a table of the first rows and a button that submits the same
/// files to the import endpoint.
pub async fn preview_import(mut multipart: Multipart) -> Result<Response, Response> {
    let files = read_uploaded_files(&mut multipart).await?;

    Ok(preview_view(&files).into_response())
}

fn preview_view(files: &[UploadedFile]) -> Markup {
    let row_count: usize = files.iter().map(|file| file.rows.len()).sum();
    let preview_rows = files
        .iter()
        .flat_map(|file| file.rows.iter().map(move |row| (&file.file_name, row)))
        .take(PREVIEW_ROW_COUNT);

    html! {
        div id="preview" class="space-y-4"
        {
            p class="text-sm"
            {
                "Found " (row_count) " rows in " (files.len()) " file(s). "
                "Check the first rows below, then confirm to import them."
            }

            div class="overflow-x-auto rounded-lg shadow"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "File" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Line" }
                            @for column in CSV_COLUMNS {
                                th scope="col" class=(TABLE_CELL_STYLE) { (column) }
                            }
                        }
                    }

                    tbody
                    {
                        @for (file_name, row) in preview_rows {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (file_name) }
                                td class=(TABLE_CELL_STYLE) { (row.line) }
                                td class=(TABLE_CELL_STYLE) { (row.kind) }
                                td class=(TABLE_CELL_STYLE) { (row.amount) }
                                td class=(TABLE_CELL_STYLE) { (row.card_type) }
                                td class=(TABLE_CELL_STYLE) { (row.bank_or_source) }
                                td class=(TABLE_CELL_STYLE) { (row.description) }
                                td class=(TABLE_CELL_STYLE) { (row.occurred_at) }
                            }
                        }
                    }
                }
            }

            button
                type="button"
                id="confirm-import"
                hx-post=(endpoints::IMPORT)
                hx-include="#import-form"
                hx-encoding="multipart/form-data"
                hx-swap="none"
                hx-target-error="#alert-container"
                class=(BUTTON_PRIMARY_STYLE)
            {
                "Confirm Import"
            }
        }
    }
}
