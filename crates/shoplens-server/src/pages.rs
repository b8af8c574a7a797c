//! HTML pages assembled from the [`Context`].

use std::fmt::Write;

use shoplens_rf::{AveragedMetrics, ClassificationReport, ConfusionMatrix};

use crate::charts::{
    self, ChartSpec, ScatterSeries, bar_chart, category_line_chart, escape, least_squares,
    pie_chart, scatter_chart, xy_line_chart,
};
use crate::context::Context;

const STYLE: &str = "body{font-family:sans-serif;margin:0;background:#fafafa;color:#222}\
nav{background:#1f3b63;padding:12px 24px}nav a{color:#fff;margin-right:20px;text-decoration:none}\
main{padding:24px}h1{margin-top:0}.grid{display:flex;flex-wrap:wrap;gap:24px}\
.card{background:#fff;border:1px solid #ddd;border-radius:6px;padding:12px}\
.accuracy{font-size:28px;font-weight:bold;color:#1f3b63}\
table.heatmap{border-collapse:collapse}table.heatmap td,table.heatmap th{border:1px solid #ccc;padding:8px 14px;text-align:center}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title><style>{STYLE}</style></head><body>\
<nav><a href=\"/\">Dashboard</a><a href=\"/home\">Home</a><a href=\"/performance\">Model performance</a></nav>\
<main>{body}</main></body></html>",
        title = escape(title)
    )
}

fn card(content: &str) -> String {
    format!("<div class=\"card\">{content}</div>")
}

fn accuracy_block(ctx: &Context) -> String {
    format!(
        "<p>Model accuracy on {} holdout rows: <span class=\"accuracy\">{}</span></p>",
        ctx.evaluation.n_samples(),
        ctx.evaluation.accuracy_percent()
    )
}

/// The dashboard shell without charts.
pub(crate) fn home() -> String {
    layout(
        "Customer Purchase Dashboard",
        "<h1>Customer Purchase Dashboard</h1>\
<p>Explore purchasing behaviour on the <a href=\"/\">dashboard</a> or review the \
<a href=\"/performance\">model performance</a>.</p>",
    )
}

/// Five descriptive and model charts plus the holdout accuracy.
pub(crate) fn dashboard(ctx: &Context) -> String {
    let stats = &ctx.stats;
    let age_ranges: Vec<(String, f64)> = stats
        .age_ranges
        .iter()
        .map(|(label, n)| (label.clone(), *n as f64))
        .collect();

    let charts = [
        category_line_chart(
            &ChartSpec::new("Customers by Age Range", "Age Range", "Number of Purchases"),
            &age_ranges,
        ),
        pie_chart(
            &ChartSpec::new("Purchases by Product Category", "", "").with_size(420.0, 400.0),
            &stats.purchases_by_category,
        ),
        bar_chart(
            &ChartSpec::new("Feature Importance", "Features", "Importance").with_size(900.0, 400.0),
            &ctx.importances_by_column(),
        ),
        bar_chart(
            &ChartSpec::new(
                "Time Spent on Website by Product Category",
                "Product Category",
                "Time Spent on Website (minutes)",
            ),
            &stats.time_by_category,
        ),
        xy_line_chart(
            &ChartSpec::new("Average Annual Income by Age", "Age", "Average Annual Income"),
            &stats.income_by_age,
        ),
    ];

    let mut body = String::from("<h1>Customer Purchase Dashboard</h1>");
    body.push_str(&accuracy_block(ctx));
    body.push_str("<div class=\"grid\">");
    for chart in &charts {
        body.push_str(&card(chart));
    }
    body.push_str("</div>");
    layout("Customer Purchase Dashboard", &body)
}

/// Accuracy, actual-vs-predicted scatter, report and confusion heatmaps.
pub(crate) fn performance(ctx: &Context) -> String {
    let eval = &ctx.evaluation;
    let actual: Vec<(f64, f64)> = eval
        .true_labels
        .iter()
        .enumerate()
        .map(|(i, &y)| (i as f64, y as f64))
        .collect();
    let predicted: Vec<(f64, f64)> = eval
        .predicted
        .iter()
        .enumerate()
        .map(|(i, &y)| (i as f64, y as f64))
        .collect();
    let fit = least_squares(&actual);
    let series = [
        ScatterSeries {
            name: "Actual",
            color: "#1f77b4",
            points: actual,
        },
        ScatterSeries {
            name: "Predicted",
            color: "#ff7f0e",
            points: predicted,
        },
    ];
    let scatter = scatter_chart(
        &ChartSpec::new("Actual vs Predicted", "Index", "Purchase Status").with_size(1000.0, 500.0),
        &series,
        fit.map(|line| ("Regression Line", line)),
    );

    let mut body = String::from("<h1>Model Performance</h1>");
    body.push_str(&accuracy_block(ctx));
    body.push_str(&card(&scatter));
    body.push_str("<div class=\"grid\">");
    body.push_str(&card(&format!(
        "<h2>Classification Report</h2>{}",
        report_table(&eval.report)
    )));
    body.push_str(&card(&format!(
        "<h2>Confusion Matrix</h2>{}",
        confusion_table(&eval.confusion)
    )));
    body.push_str("</div>");
    layout("Model Performance", &body)
}

fn heat_cell(text: &str, intensity: f64) -> String {
    let color = if intensity > 0.6 { "#fff" } else { "#222" };
    format!(
        "<td style=\"background:{};color:{color}\">{text}</td>",
        charts::blues(intensity)
    )
}

fn metrics_row(out: &mut String, label: &str, m: &AveragedMetrics, total: usize) {
    let support_share = if total == 0 { 0.0 } else { m.support as f64 / total as f64 };
    let _ = write!(
        out,
        "<tr><th>{}</th>{}{}{}{}</tr>",
        escape(label),
        heat_cell(&format!("{:.2}", m.precision), m.precision),
        heat_cell(&format!("{:.2}", m.recall), m.recall),
        heat_cell(&format!("{:.2}", m.f1), m.f1),
        heat_cell(&m.support.to_string(), support_share)
    );
}

/// Per-class metrics plus both averages, colored by value.
fn report_table(report: &ClassificationReport) -> String {
    let total = report.weighted_avg.support;
    let mut out = String::from(
        "<table class=\"heatmap\"><tr><th></th><th>precision</th><th>recall</th><th>f1-score</th><th>support</th></tr>",
    );
    for class in &report.classes {
        let row = AveragedMetrics {
            precision: class.precision,
            recall: class.recall,
            f1: class.f1,
            support: class.support,
        };
        metrics_row(&mut out, &format!("Class {}", class.class), &row, total);
    }
    let _ = write!(
        out,
        "<tr><th>accuracy</th><td colspan=\"4\">{:.2}</td></tr>",
        report.accuracy
    );
    metrics_row(&mut out, "macro avg", &report.macro_avg, total);
    metrics_row(&mut out, "weighted avg", &report.weighted_avg, total);
    out.push_str("</table>");
    out
}

/// Counts with true classes as rows and predictions as columns.
fn confusion_table(cm: &ConfusionMatrix) -> String {
    let max = cm.as_rows().iter().flatten().copied().max().unwrap_or(0).max(1) as f64;
    let mut out = String::from("<table class=\"heatmap\"><tr><th>True \\ Predicted</th>");
    for j in 0..cm.n_classes() {
        let _ = write!(out, "<th>Class {j}</th>");
    }
    out.push_str("</tr>");
    for (i, row) in cm.as_rows().iter().enumerate() {
        let _ = write!(out, "<tr><th>Class {i}</th>");
        for &count in row {
            out.push_str(&heat_cell(&count.to_string(), count as f64 / max));
        }
        out.push_str("</tr>");
    }
    out.push_str("</table>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confusion_table_has_two_by_two_cells() {
        let cm = ConfusionMatrix::from_labels(&[0, 1, 1], &[0, 1, 0], 2).unwrap();
        let html = confusion_table(&cm);
        assert_eq!(html.matches("<td").count(), 4);
        assert!(html.contains("Class 1"));
    }

    #[test]
    fn report_table_lists_classes_and_averages() {
        let cm = ConfusionMatrix::from_labels(&[0, 1, 1, 0], &[0, 1, 1, 1], 2).unwrap();
        let html = report_table(&cm.report());
        for label in ["Class 0", "Class 1", "accuracy", "macro avg", "weighted avg"] {
            assert!(html.contains(label), "missing {label}");
        }
        assert!(html.contains("0.75"));
    }

    #[test]
    fn home_has_no_charts() {
        let html = home();
        assert!(html.starts_with("<!doctype html>"));
        assert!(!html.contains("<svg"));
    }
}
