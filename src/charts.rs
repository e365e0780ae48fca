// Inline SVG charts for the HTML report.
//
// Every function returns a complete `<svg>` element sized by its viewBox, so
// the page can lay charts out with plain CSS. Empty input draws a placeholder
// instead of an empty axis.

use crate::output::escape_html;
use crate::palette::Palette;
use crate::types::{GroupedView, UserTypeCount, UserTypeDuration};
use crate::util::format_number;
use std::f64::consts::PI;
use std::fmt::Display;

const EMPTY_LABEL: &str = "No trips to display";

/// Plot area inside an SVG canvas.
#[derive(Debug, Clone, Copy)]
struct Frame {
    width: f64,
    height: f64,
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl Frame {
    fn new(width: f64, height: f64) -> Self {
        Frame {
            width,
            height,
            left: 56.0,
            right: 16.0,
            top: 36.0,
            bottom: 44.0,
        }
    }

    fn plot_width(&self) -> f64 {
        self.width - self.left - self.right
    }

    fn plot_height(&self) -> f64 {
        self.height - self.top - self.bottom
    }

    fn baseline(&self) -> f64 {
        self.height - self.bottom
    }

    /// Vertical position of `value` on a `0..=max` axis.
    fn y(&self, value: f64, max: f64) -> f64 {
        if max <= 0.0 {
            return self.baseline();
        }
        self.baseline() - (value / max) * self.plot_height()
    }
}

fn open_svg(frame: &Frame, title: &str) -> String {
    let mut svg = format!(
        r#"<svg class="chart" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg" role="img" aria-label="{t}">"#,
        w = frame.width,
        h = frame.height,
        t = escape_html(title),
    );
    svg.push_str(&format!(
        r#"<text class="chart-title" x="{}" y="20" text-anchor="middle">{}</text>"#,
        frame.width / 2.0,
        escape_html(title)
    ));
    svg
}

pub fn placeholder(title: &str, width: f64, height: f64) -> String {
    let frame = Frame::new(width, height);
    let mut svg = open_svg(&frame, title);
    svg.push_str(&format!(
        r#"<text class="placeholder" x="{}" y="{}" text-anchor="middle">{}</text>"#,
        width / 2.0,
        height / 2.0,
        EMPTY_LABEL
    ));
    svg.push_str("</svg>");
    svg
}

/// Horizontal gridlines with labels for a `0..=max` axis, plus the y-axis title.
fn value_axis(frame: &Frame, max: f64, decimals: usize, label: &str) -> String {
    let mut out = String::new();
    let ticks = 4;
    for i in 0..=ticks {
        let value = max * i as f64 / ticks as f64;
        let y = frame.y(value, max);
        out.push_str(&format!(
            r#"<line class="grid" x1="{}" y1="{y:.1}" x2="{}" y2="{y:.1}"/>"#,
            frame.left,
            frame.width - frame.right,
        ));
        out.push_str(&format!(
            r#"<text class="tick" x="{}" y="{:.1}" text-anchor="end">{}</text>"#,
            frame.left - 6.0,
            y + 4.0,
            format_number(value, decimals)
        ));
    }
    out.push_str(&format!(
        r#"<text class="axis-label" transform="translate(14 {:.1}) rotate(-90)" text-anchor="middle">{}</text>"#,
        frame.top + frame.plot_height() / 2.0,
        escape_html(label)
    ));
    out
}

fn legend(frame: &Frame, user_types: &[String], palette: &Palette) -> String {
    let mut out = String::new();
    let mut x = frame.left;
    let y = frame.height - 12.0;
    for u in user_types {
        out.push_str(&format!(
            r#"<rect x="{x:.1}" y="{}" width="10" height="10" fill="{}"/><text class="legend" x="{:.1}" y="{}">{}</text>"#,
            y - 9.0,
            palette.color(u),
            x + 14.0,
            y,
            escape_html(u)
        ));
        x += 24.0 + 7.0 * u.chars().count() as f64;
    }
    out
}

/// Share of trips per user type, with percentage labels.
pub fn pie_chart(counts: &[UserTypeCount], palette: &Palette, title: &str) -> String {
    let total: u64 = counts.iter().map(|c| c.trips).sum();
    if total == 0 {
        return placeholder(title, 400.0, 300.0);
    }
    let frame = Frame::new(400.0, 300.0);
    let (cx, cy, r) = (200.0, 160.0, 105.0);
    let mut svg = open_svg(&frame, title);

    let mut angle = -PI / 2.0;
    for c in counts {
        let share = c.trips as f64 / total as f64;
        let sweep = share * 2.0 * PI;
        let color = palette.color(&c.user_type);
        if (share - 1.0).abs() < f64::EPSILON {
            svg.push_str(&format!(
                r#"<circle cx="{cx}" cy="{cy}" r="{r}" fill="{color}" stroke="white"/>"#
            ));
        } else if sweep > 0.0 {
            let (x1, y1) = (cx + r * angle.cos(), cy + r * angle.sin());
            let end = angle + sweep;
            let (x2, y2) = (cx + r * end.cos(), cy + r * end.sin());
            let large = if sweep > PI { 1 } else { 0 };
            svg.push_str(&format!(
                r#"<path d="M{cx},{cy} L{x1:.2},{y1:.2} A{r},{r} 0 {large} 1 {x2:.2},{y2:.2} Z" fill="{color}" stroke="white" stroke-width="2"/>"#
            ));
        }
        let mid = angle + sweep / 2.0;
        let (lx, ly) = (cx + r * 0.6 * mid.cos(), cy + r * 0.6 * mid.sin());
        svg.push_str(&format!(
            r#"<text class="slice-label" x="{lx:.1}" y="{ly:.1}" text-anchor="middle">{:.1}%</text>"#,
            share * 100.0
        ));
        let (ox, oy) = (cx + (r + 18.0) * mid.cos(), cy + (r + 18.0) * mid.sin());
        svg.push_str(&format!(
            r#"<text class="legend" x="{ox:.1}" y="{oy:.1}" text-anchor="middle">{}</text>"#,
            escape_html(&c.user_type)
        ));
        angle += sweep;
    }
    svg.push_str("</svg>");
    svg
}

/// One bar per user type; values are shown to one decimal.
pub fn duration_bar_chart(
    durations: &[UserTypeDuration],
    palette: &Palette,
    title: &str,
    y_label: &str,
) -> String {
    if durations.is_empty() {
        return placeholder(title, 400.0, 300.0);
    }
    let frame = Frame::new(400.0, 300.0);
    // Negative means are drawn as zero-height bars; the label keeps the sign.
    let max = durations
        .iter()
        .map(|d| d.avg_minutes)
        .fold(0.0_f64, f64::max);
    let mut svg = open_svg(&frame, title);
    svg.push_str(&value_axis(&frame, max, 1, y_label));

    let slot = frame.plot_width() / durations.len() as f64;
    let bar = slot * 0.6;
    for (i, d) in durations.iter().enumerate() {
        let x = frame.left + slot * i as f64 + (slot - bar) / 2.0;
        let y = frame.y(d.avg_minutes.max(0.0), max);
        svg.push_str(&format!(
            r#"<rect x="{x:.1}" y="{y:.1}" width="{bar:.1}" height="{:.1}" fill="{}"/>"#,
            frame.baseline() - y,
            palette.color(&d.user_type)
        ));
        svg.push_str(&format!(
            r#"<text class="value" x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            x + bar / 2.0,
            y - 4.0,
            format_number(d.avg_minutes, 1)
        ));
        svg.push_str(&format!(
            r#"<text class="tick" x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            x + bar / 2.0,
            frame.baseline() + 16.0,
            escape_html(&d.user_type)
        ));
    }
    svg.push_str("</svg>");
    svg
}

/// Side-by-side bars, one cluster per row of `view`. Category labels are cut
/// to `label_chars` characters.
pub fn grouped_bar_chart<K: Display>(
    view: &GroupedView<K>,
    palette: &Palette,
    title: &str,
    y_label: &str,
    label_chars: usize,
) -> String {
    if view.is_empty() {
        return placeholder(title, 500.0, 300.0);
    }
    let frame = Frame::new(500.0, 300.0);
    let max = view.max_value() as f64;
    let mut svg = open_svg(&frame, title);
    svg.push_str(&value_axis(&frame, max, 0, y_label));

    let slot = frame.plot_width() / view.rows.len() as f64;
    let series = view.user_types.len().max(1) as f64;
    let bar = slot * 0.8 / series;
    for (i, row) in view.rows.iter().enumerate() {
        let group_x = frame.left + slot * i as f64 + slot * 0.1;
        for (j, value) in row.values.iter().enumerate() {
            let y = frame.y(*value as f64, max);
            svg.push_str(&format!(
                r#"<rect x="{:.1}" y="{y:.1}" width="{bar:.1}" height="{:.1}" fill="{}"><title>{}: {}</title></rect>"#,
                group_x + bar * j as f64,
                frame.baseline() - y,
                palette.color(&view.user_types[j]),
                escape_html(&view.user_types[j]),
                value
            ));
        }
        let label: String = row.key.to_string().chars().take(label_chars).collect();
        svg.push_str(&format!(
            r#"<text class="tick" x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            frame.left + slot * (i as f64 + 0.5),
            frame.baseline() + 14.0,
            escape_html(&label)
        ));
    }
    svg.push_str(&legend(&frame, &view.user_types, palette));
    svg.push_str("</svg>");
    svg
}

/// One line with point markers per user type over a fixed 0–23 hour axis.
pub fn hourly_line_chart(
    view: &GroupedView<u32>,
    palette: &Palette,
    title: &str,
    y_label: &str,
) -> String {
    if view.is_empty() {
        return placeholder(title, 800.0, 300.0);
    }
    let frame = Frame::new(800.0, 300.0);
    let max = view.max_value() as f64;
    let x_of = |hour: u32| frame.left + frame.plot_width() * hour as f64 / 23.0;
    let mut svg = open_svg(&frame, title);
    svg.push_str(&value_axis(&frame, max, 0, y_label));

    for hour in (0..24).step_by(2) {
        svg.push_str(&format!(
            r#"<text class="tick" x="{:.1}" y="{:.1}" text-anchor="middle">{hour}</text>"#,
            x_of(hour),
            frame.baseline() + 14.0
        ));
    }

    for (j, user_type) in view.user_types.iter().enumerate() {
        let color = palette.color(user_type);
        let points: Vec<(f64, f64)> = view
            .rows
            .iter()
            .map(|row| (x_of(row.key), frame.y(row.values[j] as f64, max)))
            .collect();
        let path: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{x:.1},{y:.1}"))
            .collect();
        svg.push_str(&format!(
            r#"<polyline fill="none" stroke="{color}" stroke-width="2" points="{}"/>"#,
            path.join(" ")
        ));
        for (x, y) in points {
            svg.push_str(&format!(
                r#"<circle cx="{x:.1}" cy="{y:.1}" r="3" fill="{color}"/>"#
            ));
        }
    }
    svg.push_str(&legend(&frame, &view.user_types, palette));
    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::CategoryPolicy;
    use crate::types::GroupedRow;

    fn palette() -> Palette {
        Palette::resolve(&["casual", "member"], CategoryPolicy::Strict).unwrap()
    }

    fn counts(casual: u64, member: u64) -> Vec<UserTypeCount> {
        vec![
            UserTypeCount { user_type: "member".into(), trips: member },
            UserTypeCount { user_type: "casual".into(), trips: casual },
        ]
    }

    #[test]
    fn test_pie_chart_labels_and_colors() {
        let svg = pie_chart(&counts(1, 3), &palette(), "User types");
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("75.0%"));
        assert!(svg.contains("25.0%"));
        assert!(svg.contains("#E76F51"));
        assert!(svg.contains("#2A9D8F"));
    }

    #[test]
    fn test_pie_chart_single_slice_is_circle() {
        let svg = pie_chart(&counts(0, 5), &palette(), "User types");
        assert!(svg.contains("<circle"));
        assert!(svg.contains("100.0%"));
    }

    #[test]
    fn test_empty_inputs_render_placeholder() {
        let p = palette();
        assert!(pie_chart(&[], &p, "a").contains(EMPTY_LABEL));
        assert!(duration_bar_chart(&[], &p, "b", "Minutes").contains(EMPTY_LABEL));
        assert!(grouped_bar_chart(&GroupedView::<String>::empty(), &p, "c", "Trips", 3)
            .contains(EMPTY_LABEL));
        assert!(hourly_line_chart(&GroupedView::empty(), &p, "d", "Trips").contains(EMPTY_LABEL));
    }

    #[test]
    fn test_duration_bar_chart_rounds_to_one_decimal() {
        let durations = vec![
            UserTypeDuration { user_type: "casual".into(), avg_minutes: 21.46 },
            UserTypeDuration { user_type: "member".into(), avg_minutes: -2.0 },
        ];
        let svg = duration_bar_chart(&durations, &palette(), "Avg", "Minutes");
        assert!(svg.contains(">21.5<"));
        assert!(svg.contains(">-2.0<"));
        assert_eq!(svg.matches("<rect").count(), 2);
    }

    #[test]
    fn test_grouped_bar_chart_one_rect_per_value() {
        let view = GroupedView {
            user_types: vec!["casual".to_string(), "member".to_string()],
            rows: vec![
                GroupedRow { key: "January".to_string(), values: vec![1, 4] },
                GroupedRow { key: "February".to_string(), values: vec![0, 2] },
            ],
        };
        let svg = grouped_bar_chart(&view, &palette(), "Trips by Month", "Trips", 3);
        // Four bars plus two legend swatches.
        assert_eq!(svg.matches("<rect").count(), 6);
        assert!(svg.contains(">Jan<"));
        assert!(svg.contains(">Feb<"));
        assert!(!svg.contains("January<"));
    }

    #[test]
    fn test_hourly_line_chart_markers() {
        let view = GroupedView {
            user_types: vec!["casual".to_string(), "member".to_string()],
            rows: vec![
                GroupedRow { key: 8, values: vec![1, 5] },
                GroupedRow { key: 17, values: vec![2, 6] },
            ],
        };
        let svg = hourly_line_chart(&view, &palette(), "Hourly", "Trips");
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert_eq!(svg.matches("<circle").count(), 4);
    }

    #[test]
    fn test_titles_are_escaped() {
        let svg = placeholder("<b>", 100.0, 100.0);
        assert!(svg.contains("&lt;b&gt;"));
        assert!(!svg.contains("<b>"));
    }
}
