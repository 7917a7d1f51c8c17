use crate::charts::ChartSet;
use crate::ingestion::RawTable;
use crate::schema::ReportData;
use chrono::Local;
use maud::{html, Markup, PreEscaped, DOCTYPE};

const STYLE: &str = "
body { font-family: Helvetica, Arial, sans-serif; margin: 2rem; color: #222; }
h1 { text-align: center; }
table { border-collapse: collapse; margin-bottom: 1.5rem; font-size: 0.9rem; }
th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: right; }
th { background-color: #f5f5f5; }
.charts { display: flex; flex-wrap: wrap; gap: 1rem; }
.chart svg { max-width: 100%; height: auto; }
.disclosures p { white-space: pre-wrap; }
.generated { color: #888; font-size: 0.8rem; }
";

/// Renders the on-screen preview shown before the PDF is generated.
pub fn render_preview(title: &str, table: &RawTable, data: &ReportData, charts: &ChartSet) -> String {
    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                h1 { (title) }
                h2 { "Uploaded Data" }
                (raw_table(table))
                h2 { "Charts" }
                div class="charts" {
                    @for chart in charts.iter() {
                        div class="chart" data-role=(format!("{:?}", chart.role)) {
                            (PreEscaped(&chart.svg))
                        }
                    }
                }
                h2 { "Performance Data" }
                (performance_table(data))
                h2 { "Disclosures" }
                div class="disclosures" {
                    @for paragraph in &data.disclosures {
                        p { (paragraph) }
                    }
                }
                p class="generated" {
                    "Preview generated " (Local::now().format("%Y-%m-%d %H:%M"))
                }
            }
        }
    };
    markup.into_string()
}

fn raw_table(table: &RawTable) -> Markup {
    html! {
        table class="uploaded" {
            thead {
                tr {
                    @for name in table.column_names() {
                        th { (name) }
                    }
                }
            }
            tbody {
                @for row in 0..table.row_count() {
                    tr {
                        @for column in table.columns() {
                            td { (column.cells[row]) }
                        }
                    }
                }
            }
        }
    }
}

fn performance_table(data: &ReportData) -> Markup {
    html! {
        table class="performance" {
            thead {
                tr { th { "Return" } th { "Std Dev" } th { "Information Ratio" } }
            }
            tbody {
                @for row in &data.performance_rows {
                    tr {
                        td { (crate::utils::format_number(row.ret)) }
                        td { (crate::utils::format_number(row.std_dev)) }
                        td { (crate::utils::format_number(row.information_ratio)) }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::render_all;
    use crate::normalizer::normalize;
    use crate::schema::ColumnMapping;

    #[test]
    fn test_preview_contains_table_and_charts() {
        let table = RawTable::from_csv_str(
            "Time,Investment Growth A,Return,Std Dev,Information Ratio,Disclosures\n\
             1,100,0.08,0.12,0.5,Capital <at> risk\n\
             2,110,,,,\n",
        )
        .unwrap();
        let data = normalize(&table, &ColumnMapping::default()).unwrap();
        let charts = render_all(&data).unwrap();

        let html = render_preview("Investment Factsheet", &table, &data, &charts);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<th>Investment Growth A</th>"));
        assert_eq!(html.matches("class=\"chart\"").count(), 4);
        assert!(html.contains("<td>0.12</td>"));
        // user text is escaped, chart markup is not
        assert!(html.contains("Capital &lt;at&gt; risk"));
        assert!(html.contains("<svg"));
    }
}
