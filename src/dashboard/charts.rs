//! Chart generation and rendering for the dashboard.
//!
//! This module creates interactive ECharts visualizations of a ledger:
//! - **Expenses by Bank**: Bar chart of total expenses per bank or source
//! - **Income Sources**: Donut chart of income grouped by description
//! - **Cash Flow**: Waterfall from total income, through each expense, to the final balance
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization code.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    datatype::DataPointItem,
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, ItemStyle, JsFunction, Tooltip,
        Trigger,
    },
    series::{Bar, Pie},
};
use maud::{Markup, PreEscaped, html};

use crate::{
    dashboard::aggregation::{
        WaterfallStep, expenses_by_bank_or_source, income_by_description, waterfall_steps,
    },
    html::HeadElement,
    ledger::Transaction,
};

pub(super) const ECHARTS_URL: &str = "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js";

const EXPENSE_COLOR: &str = "#dc2626";
const TOTAL_COLOR: &str = "#2563eb";
const PLACEHOLDER_SERIES: &str = "Placeholder";

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for dashboard charts.
pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates JavaScript initialization code for dashboard charts.
///
/// Creates scripts that initialize ECharts instances with dark mode support
/// and responsive resizing.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// Builds the charts that have data to show.
///
/// The expense and income charts are left out when there are no transactions
/// of that kind. The cash flow chart is always included.
pub(super) fn build_dashboard_charts(transactions: &[Transaction]) -> Vec<DashboardChart> {
    let mut charts = Vec::with_capacity(3);

    let expenses = expenses_by_bank_or_source(transactions);
    if !expenses.is_empty() {
        charts.push(DashboardChart {
            id: "expenses-by-bank-chart",
            options: expenses_by_bank_chart(&expenses).to_string(),
        });
    }

    let income = income_by_description(transactions);
    if !income.is_empty() {
        charts.push(DashboardChart {
            id: "income-sources-chart",
            options: income_sources_chart(&income).to_string(),
        });
    }

    charts.push(DashboardChart {
        id: "cash-flow-chart",
        options: cash_flow_chart(&waterfall_steps(transactions)).to_string(),
    });

    charts
}

fn expenses_by_bank_chart(expenses: &[(String, f64)]) -> Chart {
    let (labels, values): (Vec<String>, Vec<f64>) = expenses.iter().cloned().unzip();

    Chart::new()
        .title(
            Title::new()
                .text("Expenses by Bank")
                .subtext("Total spent per bank or source"),
        )
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(
            Bar::new()
                .name("Expenses")
                .item_style(ItemStyle::new().color(EXPENSE_COLOR))
                .data(values),
        )
}

fn income_sources_chart(income: &[(String, f64)]) -> Chart {
    let data: Vec<DataPointItem> = income
        .iter()
        .map(|(description, total)| DataPointItem::new(*total).name(description.as_str()))
        .collect();

    Chart::new()
        .title(
            Title::new()
                .text("Income Sources")
                .subtext("Grouped by description"),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().left("center").top("bottom"))
        .series(
            Pie::new()
                .name("Income")
                .radius(vec!["30%", "65%"])
                .data(data),
        )
}

/// The stacked bar values that draw a waterfall.
///
/// Each step floats on a transparent placeholder. ECharts stacks positive and
/// negative values separately, so a step that crosses zero is split into a
/// part above and a part below the axis.
#[derive(Debug, Default, PartialEq)]
struct WaterfallSeries {
    labels: Vec<String>,
    placeholder: Vec<f64>,
    totals: Vec<f64>,
    expenses_above: Vec<f64>,
    expenses_below: Vec<f64>,
}

fn waterfall_series(steps: &[WaterfallStep]) -> WaterfallSeries {
    let mut series = WaterfallSeries::default();

    for step in steps {
        series.labels.push(step.label.clone());

        if step.is_total {
            series.placeholder.push(0.0);
            series.totals.push(step.end);
            series.expenses_above.push(0.0);
            series.expenses_below.push(0.0);
            continue;
        }

        let low = step.start.min(step.end);
        let high = step.start.max(step.end);
        let (placeholder, above, below) = if low >= 0.0 {
            (low, high - low, 0.0)
        } else if high <= 0.0 {
            (high, 0.0, low - high)
        } else {
            (0.0, high, low)
        };

        series.placeholder.push(placeholder);
        series.totals.push(0.0);
        series.expenses_above.push(above);
        series.expenses_below.push(below);
    }

    series
}

fn cash_flow_chart(steps: &[WaterfallStep]) -> Chart {
    let series = waterfall_series(steps);
    let invisible = || {
        ItemStyle::new()
            .color("transparent")
            .border_color("transparent")
    };

    Chart::new()
        .title(
            Title::new()
                .text("Cash Flow")
                .subtext("How income turns into the final balance"),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(series.labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(
            Bar::new()
                .name(PLACEHOLDER_SERIES)
                .stack("cash-flow")
                .item_style(invisible())
                .data(series.placeholder),
        )
        .series(
            Bar::new()
                .name("Total")
                .stack("cash-flow")
                .item_style(ItemStyle::new().color(TOTAL_COLOR))
                .data(series.totals),
        )
        .series(
            Bar::new()
                .name("Expense")
                .stack("cash-flow")
                .item_style(ItemStyle::new().color(EXPENSE_COLOR))
                .data(series.expenses_above),
        )
        .series(
            Bar::new()
                .name("Expense")
                .stack("cash-flow")
                .item_style(ItemStyle::new().color(EXPENSE_COLOR))
                .data(series.expenses_below),
        )
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('pt-BR', {
              style: 'currency',
              currency: 'BRL'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
