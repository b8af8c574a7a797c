//! Server-side SVG charts.
//!
//! Every chart is a self-contained `<svg>` element sized by a [`ChartSpec`];
//! pages embed them inline so no external assets are needed.

use std::fmt::Write;

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 60.0;

const PALETTE: [&str; 8] = [
    "#636efa", "#ef553b", "#00cc96", "#ab63fa", "#ffa15a", "#19d3f3", "#ff6692", "#b6e880",
];

/// Title, axis labels, and pixel size of one chart.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub width: f64,
    pub height: f64,
}

impl ChartSpec {
    /// A 600x400 chart.
    pub fn new(title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            width: 600.0,
            height: 400.0,
        }
    }

    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    fn plot_width(&self) -> f64 {
        self.width - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height(&self) -> f64 {
        self.height - MARGIN_TOP - MARGIN_BOTTOM
    }
}

/// One series of points on a scatter chart.
#[derive(Debug, Clone)]
pub struct ScatterSeries<'a> {
    pub name: &'a str,
    pub color: &'a str,
    pub points: Vec<(f64, f64)>,
}

/// Ordinary least-squares fit `y = slope * x + intercept`.
///
/// Returns `None` with fewer than two points or when every `x` is equal.
#[must_use]
pub fn least_squares(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), &(x, y)| {
        let dx = x - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

/// Escape text for use inside SVG or HTML.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Background color on a white-to-blue ramp for `t` in `[0, 1]`.
pub(crate) fn blues(t: f64) -> String {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        lerp(247.0, 8.0),
        lerp(251.0, 48.0),
        lerp(255.0, 107.0)
    )
}

/// Maps data values onto the plot area.
struct Scale {
    lo: f64,
    hi: f64,
    start: f64,
    span: f64,
}

impl Scale {
    /// A scale over `[lo, hi]`, widened when the range is empty.
    fn new(lo: f64, hi: f64, start: f64, span: f64) -> Self {
        let (lo, hi) = if (hi - lo).abs() < f64::EPSILON {
            (lo - 1.0, hi + 1.0)
        } else {
            (lo, hi)
        };
        Self { lo, hi, start, span }
    }

    fn map(&self, v: f64) -> f64 {
        self.start + (v - self.lo) / (self.hi - self.lo) * self.span
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn open_svg(spec: &ChartSpec) -> String {
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" class=\"chart\">",
        w = spec.width,
        h = spec.height
    );
    let _ = write!(
        svg,
        "<text x=\"{}\" y=\"24\" text-anchor=\"middle\" font-size=\"16\">{}</text>",
        spec.width / 2.0,
        escape(&spec.title)
    );
    svg
}

/// Frame, axis titles, and `n_ticks` labelled y gridlines.
fn axes(svg: &mut String, spec: &ChartSpec, y: &Scale, n_ticks: usize) {
    let left = MARGIN_LEFT;
    let bottom = spec.height - MARGIN_BOTTOM;
    for i in 0..=n_ticks {
        let v = y.lo + (y.hi - y.lo) * i as f64 / n_ticks as f64;
        let py = y.map(v);
        let _ = write!(
            svg,
            "<line x1=\"{left}\" y1=\"{py:.1}\" x2=\"{:.1}\" y2=\"{py:.1}\" stroke=\"#e5e5e5\"/>\
             <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"11\">{}</text>",
            spec.width - MARGIN_RIGHT,
            left - 6.0,
            py + 4.0,
            tick_label(v)
        );
    }
    let _ = write!(
        svg,
        "<line x1=\"{left}\" y1=\"{MARGIN_TOP}\" x2=\"{left}\" y2=\"{bottom}\" stroke=\"#333\"/>\
         <line x1=\"{left}\" y1=\"{bottom}\" x2=\"{:.1}\" y2=\"{bottom}\" stroke=\"#333\"/>\
         <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"13\">{}</text>\
         <text x=\"16\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"13\" transform=\"rotate(-90 16 {:.1})\">{}</text>",
        spec.width - MARGIN_RIGHT,
        left + spec.plot_width() / 2.0,
        spec.height - 12.0,
        escape(&spec.x_label),
        MARGIN_TOP + spec.plot_height() / 2.0,
        MARGIN_TOP + spec.plot_height() / 2.0,
        escape(&spec.y_label)
    );
}

fn tick_label(v: f64) -> String {
    if v.abs() >= 1000.0 || v.fract().abs() < 1e-9 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn y_scale(spec: &ChartSpec, lo: f64, hi: f64) -> Scale {
    Scale::new(lo, hi, spec.height - MARGIN_BOTTOM, -spec.plot_height())
}

/// Category positions along the x axis, centered in equal slots.
fn category_x(spec: &ChartSpec, n: usize, i: usize) -> f64 {
    let slot = spec.plot_width() / n.max(1) as f64;
    MARGIN_LEFT + slot * (i as f64 + 0.5)
}

fn category_label(svg: &mut String, spec: &ChartSpec, x: f64, label: &str) {
    let _ = write!(
        svg,
        "<text x=\"{x:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"11\">{}</text>",
        spec.height - MARGIN_BOTTOM + 16.0,
        escape(label)
    );
}

fn polyline(svg: &mut String, points: &[(f64, f64)], color: &str, dashed: bool) {
    let coords: Vec<String> = points.iter().map(|(x, y)| format!("{x:.1},{y:.1}")).collect();
    let dash = if dashed { " stroke-dasharray=\"6 4\"" } else { "" };
    let _ = write!(
        svg,
        "<polyline points=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"2\"{dash}/>",
        coords.join(" ")
    );
}

fn markers(svg: &mut String, points: &[(f64, f64)], color: &str) {
    for (x, y) in points {
        let _ = write!(
            svg,
            "<circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"4\" fill=\"{color}\"/>"
        );
    }
}

/// Line chart with markers over labelled categories.
pub(crate) fn category_line_chart(spec: &ChartSpec, points: &[(String, f64)]) -> String {
    let mut svg = open_svg(spec);
    let (_, hi) = bounds(points.iter().map(|p| p.1));
    let y = y_scale(spec, 0.0, hi.max(0.0));
    axes(&mut svg, spec, &y, 5);

    let pixels: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, (_, v))| (category_x(spec, points.len(), i), y.map(*v)))
        .collect();
    polyline(&mut svg, &pixels, PALETTE[0], false);
    markers(&mut svg, &pixels, PALETTE[0]);
    for (i, (label, _)) in points.iter().enumerate() {
        category_label(&mut svg, spec, category_x(spec, points.len(), i), label);
    }
    svg.push_str("</svg>");
    svg
}

/// Line chart with markers over a numeric x axis.
pub(crate) fn xy_line_chart(spec: &ChartSpec, points: &[(f64, f64)]) -> String {
    let mut svg = open_svg(spec);
    if points.is_empty() {
        svg.push_str("</svg>");
        return svg;
    }
    let (x_lo, x_hi) = bounds(points.iter().map(|p| p.0));
    let (y_lo, y_hi) = bounds(points.iter().map(|p| p.1));
    let x = Scale::new(x_lo, x_hi, MARGIN_LEFT, spec.plot_width());
    let y = y_scale(spec, y_lo, y_hi);
    axes(&mut svg, spec, &y, 5);

    let pixels: Vec<(f64, f64)> = points.iter().map(|&(px, py)| (x.map(px), y.map(py))).collect();
    polyline(&mut svg, &pixels, PALETTE[0], false);
    markers(&mut svg, &pixels, PALETTE[0]);
    for v in [x_lo, (x_lo + x_hi) / 2.0, x_hi] {
        category_label(&mut svg, spec, x.map(v), &tick_label(v));
    }
    svg.push_str("</svg>");
    svg
}

/// Vertical bar chart, one colored bar per category.
pub(crate) fn bar_chart(spec: &ChartSpec, bars: &[(String, f64)]) -> String {
    let mut svg = open_svg(spec);
    let (_, hi) = bounds(bars.iter().map(|b| b.1));
    let y = y_scale(spec, 0.0, hi.max(0.0));
    axes(&mut svg, spec, &y, 5);

    let slot = spec.plot_width() / bars.len().max(1) as f64;
    let base = y.map(0.0);
    for (i, (label, value)) in bars.iter().enumerate() {
        let cx = category_x(spec, bars.len(), i);
        let top = y.map(*value);
        let _ = write!(
            svg,
            "<rect x=\"{:.1}\" y=\"{top:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"><title>{}: {value:.4}</title></rect>",
            cx - slot * 0.35,
            slot * 0.7,
            (base - top).max(0.0),
            PALETTE[i % PALETTE.len()],
            escape(label)
        );
        category_label(&mut svg, spec, cx, label);
    }
    svg.push_str("</svg>");
    svg
}

/// Pie chart with a legend; slices with non-positive values are skipped.
pub(crate) fn pie_chart(spec: &ChartSpec, slices: &[(String, f64)]) -> String {
    let mut svg = open_svg(spec);
    let total: f64 = slices.iter().map(|s| s.1).filter(|v| *v > 0.0).sum();
    let cx = spec.width * 0.4;
    let cy = MARGIN_TOP + spec.plot_height() / 2.0 + 10.0;
    let r = spec.plot_height().min(spec.width * 0.6) / 2.0;

    if total > 0.0 {
        let mut angle = -std::f64::consts::FRAC_PI_2;
        for (i, (label, value)) in slices.iter().enumerate() {
            if *value <= 0.0 {
                continue;
            }
            let share = value / total;
            let color = PALETTE[i % PALETTE.len()];
            let title = format!("{}: {:.1}%", escape(label), share * 100.0);
            if share >= 1.0 - 1e-12 {
                let _ = write!(
                    svg,
                    "<circle cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"{r:.1}\" fill=\"{color}\"><title>{title}</title></circle>"
                );
            } else {
                let end = angle + share * std::f64::consts::TAU;
                let large = u8::from(share > 0.5);
                let _ = write!(
                    svg,
                    "<path d=\"M{cx:.1},{cy:.1} L{:.2},{:.2} A{r:.1},{r:.1} 0 {large} 1 {:.2},{:.2} Z\" fill=\"{color}\" stroke=\"#fff\"><title>{title}</title></path>",
                    cx + r * angle.cos(),
                    cy + r * angle.sin(),
                    cx + r * end.cos(),
                    cy + r * end.sin()
                );
                angle = end;
            }
        }
    }

    let legend_x = cx + r + 30.0;
    for (i, (label, value)) in slices.iter().enumerate() {
        let ly = MARGIN_TOP + 10.0 + i as f64 * 20.0;
        let share = if total > 0.0 { value.max(0.0) / total * 100.0 } else { 0.0 };
        let _ = write!(
            svg,
            "<rect x=\"{legend_x:.1}\" y=\"{:.1}\" width=\"12\" height=\"12\" fill=\"{}\"/>\
             <text x=\"{:.1}\" y=\"{ly:.1}\" font-size=\"12\">{} ({share:.1}%)</text>",
            ly - 10.0,
            PALETTE[i % PALETTE.len()],
            legend_x + 18.0,
            escape(label)
        );
    }
    svg.push_str("</svg>");
    svg
}

/// Scatter chart of several series plus an optional dashed fitted line.
pub(crate) fn scatter_chart(
    spec: &ChartSpec,
    series: &[ScatterSeries<'_>],
    fit: Option<(&str, (f64, f64))>,
) -> String {
    let mut svg = open_svg(spec);
    let all = || series.iter().flat_map(|s| s.points.iter().copied());
    if all().next().is_none() {
        svg.push_str("</svg>");
        return svg;
    }
    let (x_lo, x_hi) = bounds(all().map(|p| p.0));
    let (y_lo, y_hi) = bounds(all().map(|p| p.1));
    let pad = (y_hi - y_lo).max(1.0) * 0.1;
    let x = Scale::new(x_lo, x_hi, MARGIN_LEFT, spec.plot_width());
    let y = y_scale(spec, y_lo - pad, y_hi + pad);
    axes(&mut svg, spec, &y, 4);

    for s in series {
        let pixels: Vec<(f64, f64)> = s.points.iter().map(|&(px, py)| (x.map(px), y.map(py))).collect();
        markers(&mut svg, &pixels, s.color);
    }
    let mut legend: Vec<(&str, &str)> = series.iter().map(|s| (s.name, s.color)).collect();
    if let Some((name, (slope, intercept))) = fit {
        let ends = [x_lo, x_hi].map(|px| (x.map(px), y.map(slope * px + intercept)));
        polyline(&mut svg, &ends, "#d62728", true);
        legend.push((name, "#d62728"));
    }
    for v in [x_lo, (x_lo + x_hi) / 2.0, x_hi] {
        category_label(&mut svg, spec, x.map(v), &tick_label(v.round()));
    }
    for (i, (name, color)) in legend.iter().enumerate() {
        let lx = MARGIN_LEFT + 10.0 + i as f64 * 150.0;
        let _ = write!(
            svg,
            "<rect x=\"{lx:.1}\" y=\"{:.1}\" width=\"12\" height=\"12\" fill=\"{color}\"/>\
             <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\">{}</text>",
            MARGIN_TOP - 8.0,
            lx + 18.0,
            MARGIN_TOP + 2.0,
            escape(name)
        );
    }
    svg.push_str("</svg>");
    svg
}
