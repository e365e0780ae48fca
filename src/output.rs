use crate::charts;
use crate::error::ReportError;
use crate::palette::Palette;
use crate::types::{DatasetOverview, GroupedView, UsageReport};
use crate::util::{format_int, format_number};
use clap::ValueEnum;
use std::fmt::Display;
use std::io::Write;
use tabled::{builder::Builder, settings::Style};
use tracing::info;

pub const REPORT_TITLE: &str = "Bike-Share Usage Report";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single HTML page with embedded SVG charts
    Html,
    /// Markdown tables, suitable for a terminal
    Markdown,
    /// The aggregates as pretty-printed JSON
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }

    /// `report.<ext>` for this format; used when no output path is given.
    pub fn default_output(self) -> String {
        format!("report.{}", self.extension())
    }
}

pub fn render(
    format: OutputFormat,
    report: &UsageReport,
    palette: &Palette,
) -> Result<String, ReportError> {
    Ok(match format {
        OutputFormat::Html => render_html(report, palette),
        OutputFormat::Markdown => render_markdown(report),
        OutputFormat::Json => render_json(report)?,
    })
}

/// Write the rendered report to `path`, or to stdout when `path` is `-`.
pub fn write_output(path: &str, rendered: &str) -> Result<(), ReportError> {
    if path == "-" {
        let mut out = std::io::stdout().lock();
        out.write_all(rendered.as_bytes())?;
        out.flush()?;
    } else {
        std::fs::write(path, rendered)?;
        info!(path, bytes = rendered.len(), "report written");
    }
    Ok(())
}

/// Escape HTML special characters.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn date_range_text(overview: &DatasetOverview) -> String {
    match &overview.date_range {
        Some(range) => format!(
            "{} → {}",
            range.start.format("%Y-%m-%d"),
            range.end.format("%Y-%m-%d")
        ),
        None => "n/a".to_string(),
    }
}

fn user_types_text(overview: &DatasetOverview) -> String {
    if overview.user_types.is_empty() {
        "none".to_string()
    } else {
        overview.user_types.join(", ")
    }
}

fn generate_styles() -> &'static str {
    r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 0 auto;
            max-width: 1100px;
            padding: 20px;
            color: #333;
            background-color: white;
        }
        hr { border: none; border-top: 1px solid #ddd; }
        .row { display: flex; gap: 24px; flex-wrap: wrap; }
        .col { flex: 1 1 400px; min-width: 0; }
        .chart { width: 100%; height: auto; }
        .chart-title { font-size: 14px; font-weight: bold; }
        .tick, .legend, .value { font-size: 10px; fill: #555; }
        .slice-label { font-size: 11px; fill: white; font-weight: bold; }
        .axis-label { font-size: 11px; fill: #555; }
        .placeholder { font-size: 13px; fill: #999; font-style: italic; }
        .grid { stroke: #e5e5e5; stroke-width: 1; }
        .info { background: #e8f1fb; border-left: 4px solid #4a90d9; padding: 10px 14px; }
        .warning { background: #fdf6e3; border-left: 4px solid #e9a23b; padding: 10px 14px; }
        .success { background: #eaf6ec; border-left: 4px solid #5cb85c; padding: 10px 14px; }
        .footer { margin-top: 20px; font-size: 0.8em; color: #888; text-align: center; }
        "#
}

fn insights_html(report: &UsageReport) -> String {
    if report.highlights.is_empty() {
        return "<p>No trips to summarise.</p>".to_string();
    }
    let mut items = String::new();
    for h in &report.highlights {
        let mut parts = vec![format!(
            "average trip of {} minutes",
            format_number(h.avg_minutes, 1)
        )];
        if let Some(m) = &h.busiest_month {
            parts.push(format!("busiest in {}", escape_html(m)));
        }
        if let Some(d) = &h.busiest_weekday {
            parts.push(format!("most rides on {}", escape_html(d)));
        }
        if let Some(hour) = h.peak_hour {
            parts.push(format!("peak at {:02}:00", hour));
        }
        items.push_str(&format!(
            "<li><strong>{}</strong>: {}</li>",
            escape_html(&h.user_type),
            parts.join(", ")
        ));
    }
    format!("<ul>{}</ul>", items)
}

fn recommendations_html(report: &UsageReport) -> String {
    let find = |name: &str| report.highlights.iter().find(|h| h.user_type == name);
    let mut items: Vec<String> = Vec::new();
    if let Some(casual) = find("casual") {
        if let Some(day) = &casual.busiest_weekday {
            items.push(format!(
                "Offer trial memberships to casual riders on {}s, their busiest day",
                escape_html(day)
            ));
        }
        if let Some(member) = find("member") {
            if casual.avg_minutes > member.avg_minutes {
                items.push(format!(
                    "Promote the savings of membership: casual trips average {} minutes against {} for members",
                    format_number(casual.avg_minutes, 1),
                    format_number(member.avg_minutes, 1)
                ));
            }
        }
    }
    for h in &report.highlights {
        if let Some(hour) = h.peak_hour {
            items.push(format!(
                "Increase bike availability around {:02}:00, the {} peak",
                hour,
                escape_html(&h.user_type)
            ));
        }
    }
    if items.is_empty() {
        return "<p>No recommendations without trip data.</p>".to_string();
    }
    let list: String = items.iter().map(|i| format!("<li>{}</li>", i)).collect();
    format!("<ul>{}</ul>", list)
}

/// The full single-page report.
pub fn render_html(report: &UsageReport, palette: &Palette) -> String {
    let overview = &report.overview;
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", REPORT_TITLE));
    html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", generate_styles()));

    html.push_str(&format!("<h1>🚲 {}</h1>\n<hr>\n", REPORT_TITLE));

    html.push_str("<h2>📊 Executive Summary</h2>\n");
    html.push_str(
        "<p class=\"info\">This report explores behavioural patterns of riders, comparing casual \
         and member usage across time, trip length and volume.</p>\n",
    );

    html.push_str("<h2>📁 Dataset Overview</h2>\n<ul>\n");
    html.push_str(&format!(
        "<li><strong>Total rides:</strong> {}</li>\n",
        format_int(overview.total_trips)
    ));
    html.push_str(&format!(
        "<li><strong>Date range:</strong> {}</li>\n",
        escape_html(&date_range_text(overview))
    ));
    html.push_str(&format!(
        "<li><strong>User types:</strong> {}</li>\n</ul>\n",
        escape_html(&user_types_text(overview))
    ));

    html.push_str("<div class=\"row\">\n");
    html.push_str(&format!(
        "<div class=\"col\"><h3>🧑‍🤝‍🧑 User Type Distribution</h3>{}</div>\n",
        charts::pie_chart(&report.user_type_counts, palette, "Share of Trips")
    ));
    html.push_str(&format!(
        "<div class=\"col\"><h3>⏱️ Average Trip Duration</h3>{}</div>\n",
        charts::duration_bar_chart(&report.avg_duration, palette, "Avg. Trip Duration", "Minutes")
    ));
    html.push_str("</div>\n<div class=\"row\">\n");
    html.push_str(&format!(
        "<div class=\"col\"><h3>📅 Monthly Trip Volume</h3>{}</div>\n",
        charts::grouped_bar_chart(&report.monthly, palette, "Trips by Month", "Trips", 3)
    ));
    html.push_str(&format!(
        "<div class=\"col\"><h3>📆 Weekly Ride Patterns</h3>{}</div>\n",
        charts::grouped_bar_chart(&report.weekly, palette, "Trips by Day of the Week", "Trips", 3)
    ));
    html.push_str("</div>\n");
    html.push_str(&format!(
        "<h3>⏰ Hourly Ride Trends</h3>\n{}\n",
        charts::hourly_line_chart(&report.hourly, palette, "Trips by Hour of Day", "Trips")
    ));

    html.push_str(&format!(
        "<h2>🔍 Key Insights</h2>\n<div class=\"success\">{}</div>\n",
        insights_html(report)
    ));
    html.push_str(&format!(
        "<h2>💡 Strategic Recommendations</h2>\n<div class=\"warning\">{}</div>\n",
        recommendations_html(report)
    ));

    html.push_str(&format!(
        "<hr>\n<div class=\"footer\">Generated by bikeshare_report {}</div>\n</body>\n</html>\n",
        env!("CARGO_PKG_VERSION")
    ));
    html
}

fn markdown_table(header: Vec<String>, rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "(no rows)\n".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(header);
    for r in rows {
        builder.push_record(r);
    }
    let mut table = builder.build();
    table.with(Style::markdown());
    format!("{}\n", table)
}

fn grouped_markdown<K: Display>(view: &GroupedView<K>, key_name: &str) -> String {
    let mut header = vec![key_name.to_string()];
    header.extend(view.user_types.iter().cloned());
    let rows = view
        .rows
        .iter()
        .map(|row| {
            let mut cells = vec![row.key.to_string()];
            cells.extend(row.values.iter().map(|v| format_int(*v)));
            cells
        })
        .collect();
    markdown_table(header, rows)
}

/// Console rendering: overview lines followed by one table per view.
pub fn render_markdown(report: &UsageReport) -> String {
    let overview = &report.overview;
    let mut out = format!("# {}\n\n## Dataset Overview\n\n", REPORT_TITLE);
    out.push_str(&format!("- Total rides: {}\n", format_int(overview.total_trips)));
    out.push_str(&format!("- Date range: {}\n", date_range_text(overview)));
    out.push_str(&format!("- User types: {}\n\n", user_types_text(overview)));

    out.push_str("## User Type Distribution\n\n");
    let total: u64 = report.user_type_counts.iter().map(|c| c.trips).sum();
    out.push_str(&markdown_table(
        vec!["User type".into(), "Trips".into(), "Share".into()],
        report
            .user_type_counts
            .iter()
            .map(|c| {
                let share = if total == 0 { 0.0 } else { c.trips as f64 * 100.0 / total as f64 };
                vec![
                    c.user_type.clone(),
                    format_int(c.trips),
                    format!("{}%", format_number(share, 1)),
                ]
            })
            .collect(),
    ));

    out.push_str("\n## Average Trip Duration\n\n");
    out.push_str(&markdown_table(
        vec!["User type".into(), "Minutes".into()],
        report
            .avg_duration
            .iter()
            .map(|d| vec![d.user_type.clone(), format_number(d.avg_minutes, 1)])
            .collect(),
    ));

    out.push_str("\n## Trips by Month\n\n");
    out.push_str(&grouped_markdown(&report.monthly, "Month"));
    out.push_str("\n## Trips by Day of the Week\n\n");
    out.push_str(&grouped_markdown(&report.weekly, "Day"));
    out.push_str("\n## Trips by Hour of Day\n\n");
    out.push_str(&grouped_markdown(&report.hourly, "Hour"));
    out
}

pub fn render_json(report: &UsageReport) -> Result<String, ReportError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| ReportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::CategoryPolicy;
    use crate::reports::generate_report;
    use crate::types::TripRecord;
    use crate::util::parse_timestamp;

    fn sample_report() -> UsageReport {
        let trip = |user: &str, start: &str, end: &str| TripRecord {
            ride_id: Some("r".to_string()),
            started_at: parse_timestamp(start).unwrap(),
            ended_at: parse_timestamp(end).unwrap(),
            member_casual: Some(user.to_string()),
        };
        generate_report(&[
            trip("member", "2023-03-06 08:00:00", "2023-03-06 08:10:00"),
            trip("member", "2023-03-06 17:30:00", "2023-03-06 17:50:00"),
            trip("casual", "2023-04-08 12:00:00", "2023-04-08 12:45:00"),
        ])
    }

    fn palette_for(report: &UsageReport) -> Palette {
        Palette::resolve(&report.overview.user_types, CategoryPolicy::Fallback).unwrap()
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a&b"), "a&amp;b");
        assert_eq!(escape_html("\"test\""), "&quot;test&quot;");
        assert_eq!(escape_html("'test'"), "&#39;test&#39;");
    }

    #[test]
    fn test_render_html_sections_in_order() {
        let report = sample_report();
        let html = render_html(&report, &palette_for(&report));
        let sections = [
            "Executive Summary",
            "Dataset Overview",
            "User Type Distribution",
            "Average Trip Duration",
            "Monthly Trip Volume",
            "Weekly Ride Patterns",
            "Hourly Ride Trends",
            "Key Insights",
            "Strategic Recommendations",
        ];
        let positions: Vec<usize> = sections
            .iter()
            .map(|s| html.find(s).unwrap_or_else(|| panic!("missing section {s}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(html.contains("<strong>Total rides:</strong> 3"));
        assert!(html.contains("2023-03-06 → 2023-04-08"));
        assert!(html.contains("member, casual"));
        assert_eq!(html.matches("<svg").count(), 5);
    }

    #[test]
    fn test_recommendations_follow_highlights() {
        let report = sample_report();
        let html = render_html(&report, &palette_for(&report));
        // Casual rides are on Saturday at noon and last 45 minutes; members average 15.
        assert!(html.contains("trial memberships to casual riders on Saturdays"));
        assert!(html.contains("casual trips average 45.0 minutes against 15.0 for members"));
        assert!(html.contains("around 12:00, the casual peak"));
        assert!(html.contains("around 08:00, the member peak"));
    }

    #[test]
    fn test_render_html_empty_dataset() {
        let report = generate_report(&[]);
        let html = render_html(&report, &palette_for(&report));
        assert!(html.contains("<strong>Total rides:</strong> 0"));
        assert!(html.contains("n/a"));
        assert_eq!(html.matches("No trips to display").count(), 5);
        assert!(html.contains("No trips to summarise."));
        assert!(html.contains("No recommendations without trip data."));
    }

    #[test]
    fn test_render_html_escapes_user_types() {
        let mut records = vec![];
        let ts = parse_timestamp("2023-03-06 08:00:00").unwrap();
        records.push(TripRecord {
            ride_id: None,
            started_at: ts,
            ended_at: ts,
            member_casual: Some("<odd>".to_string()),
        });
        let report = generate_report(&records);
        let html = render_html(&report, &palette_for(&report));
        assert!(!html.contains("<odd>"));
        assert!(html.contains("&lt;odd&gt;"));
    }

    #[test]
    fn test_render_markdown() {
        let md = render_markdown(&sample_report());
        assert!(md.contains("- Total rides: 3"));
        assert!(md.contains("| Month"));
        assert!(md.contains("| March"));
        assert!(md.contains("| December"));
        assert!(md.contains("66.7%"));
    }

    #[test]
    fn test_render_markdown_empty() {
        let md = render_markdown(&generate_report(&[]));
        assert!(md.contains("- Date range: n/a"));
        assert_eq!(md.matches("(no rows)").count(), 5);
    }

    #[test]
    fn test_render_json_round_trips_to_value() {
        let json = render_json(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["overview"]["total_trips"], 3);
        assert_eq!(value["monthly"]["rows"].as_array().unwrap().len(), 12);
        assert_eq!(value["hourly"]["rows"][0]["key"], 8);
    }

    #[test]
    fn test_default_output_follows_format() {
        assert_eq!(OutputFormat::Html.default_output(), "report.html");
        assert_eq!(OutputFormat::Markdown.default_output(), "report.md");
        assert_eq!(OutputFormat::Json.default_output(), "report.json");
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");
        let path = path.to_str().unwrap();
        write_output(path, "<html></html>").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<html></html>");
    }
}
