use crate::error::ReportError;
use analytics::RiskReport;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use core_types::{KurtosisClass, Observation, ObservationSeries};
use forecaster::ForecastResult;
use std::f64::consts::PI;
use std::fmt::Write as _;

/// Everything a renderer may draw. Borrowed from the pipeline for one call.
pub struct RenderInput<'a> {
    pub coin_id: &'a str,
    pub series: &'a ObservationSeries,
    pub forecast: &'a ForecastResult,
    pub risk: &'a RiskReport,
    /// The most recent observations, oldest first.
    pub recent: &'a [Observation],
}

/// Draws the report chart. The returned string is opaque to callers and is
/// embedded in the payload as-is.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, input: &RenderInput<'_>) -> Result<String, ReportError>;
}

/// Renders a six-panel SVG dashboard and returns it base64-encoded.
#[derive(Debug, Clone)]
pub struct SvgReportRenderer {
    width: f64,
    height: f64,
}

impl Default for SvgReportRenderer {
    fn default() -> Self {
        Self {
            width: 1500.0,
            height: 900.0,
        }
    }
}

impl SvgReportRenderer {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Renders the raw SVG document.
    pub fn render_svg(&self, input: &RenderInput<'_>) -> Result<String, ReportError> {
        let mut ctx = RenderContext::new(self.width, self.height, 3, 2);
        ctx.begin(input.coin_id)?;

        let [price, volatility, implications, gauge, density, scatter] = [
            ctx.panel(0, 0),
            ctx.panel(1, 0),
            ctx.panel(2, 0),
            ctx.panel(0, 1),
            ctx.panel(1, 1),
            ctx.panel(2, 1),
        ];
        price_panel(&mut ctx, price, input)?;
        volatility_panel(&mut ctx, volatility, &input.forecast.volatility_forecast)?;
        implications_panel(&mut ctx, implications)?;
        gauge_panel(&mut ctx, gauge, input.risk)?;
        returns_density_panel(&mut ctx, density, &input.series.returns())?;
        returns_volume_panel(&mut ctx, scatter, input.recent)?;

        ctx.finish()
    }
}

impl ReportRenderer for SvgReportRenderer {
    fn render(&self, input: &RenderInput<'_>) -> Result<String, ReportError> {
        let svg = self.render_svg(input)?;
        tracing::debug!(bytes = svg.len(), "Rendered report chart.");
        Ok(STANDARD.encode(svg))
    }
}

/// Drawing state for a single render. Never shared between calls.
struct RenderContext {
    svg: String,
    width: f64,
    height: f64,
    columns: usize,
    rows: usize,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Frame {
    /// Maps `value` in `[lo, hi]` onto the frame's horizontal extent.
    fn sx(&self, value: f64, lo: f64, hi: f64) -> f64 {
        self.x + unit(value, lo, hi) * self.w
    }

    /// Maps `value` in `[lo, hi]` onto the vertical extent, growing upwards.
    fn sy(&self, value: f64, lo: f64, hi: f64) -> f64 {
        self.y + self.h - unit(value, lo, hi) * self.h
    }
}

const TITLE_HEIGHT: f64 = 40.0;
const MARGIN: f64 = 50.0;

impl RenderContext {
    fn new(width: f64, height: f64, columns: usize, rows: usize) -> Self {
        Self {
            svg: String::with_capacity(64 * 1024),
            width,
            height,
            columns,
            rows,
        }
    }

    /// The plot area of the panel at `(column, row)`.
    fn panel(&self, column: usize, row: usize) -> Frame {
        let cell_w = self.width / self.columns as f64;
        let cell_h = (self.height - TITLE_HEIGHT) / self.rows as f64;
        Frame {
            x: column as f64 * cell_w + MARGIN,
            y: TITLE_HEIGHT + row as f64 * cell_h + MARGIN,
            w: cell_w - 1.6 * MARGIN,
            h: cell_h - 2.0 * MARGIN,
        }
    }

    fn begin(&mut self, coin_id: &str) -> Result<(), ReportError> {
        write!(
            self.svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
            w = self.width,
            h = self.height
        )?;
        write!(
            self.svg,
            r#"<rect width="100%" height="100%" fill="white"/>"#
        )?;
        self.text(self.width / 2.0, 28.0, 20.0, "middle", "black", &format!("Risk report: {coin_id}"))
    }

    fn finish(mut self) -> Result<String, ReportError> {
        self.svg.push_str("</svg>");
        Ok(self.svg)
    }

    fn title(&mut self, frame: Frame, title: &str) -> Result<(), ReportError> {
        self.text(frame.x + frame.w / 2.0, frame.y - 14.0, 14.0, "middle", "black", title)
    }

    fn axes(&mut self, frame: Frame, x_label: &str, y_label: &str) -> Result<(), ReportError> {
        write!(
            self.svg,
            r##"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="#999"/>"##,
            frame.x, frame.y, frame.w, frame.h
        )?;
        self.text(frame.x + frame.w / 2.0, frame.y + frame.h + 30.0, 11.0, "middle", "#333", x_label)?;
        let (lx, ly) = (frame.x - 36.0, frame.y + frame.h / 2.0);
        write!(
            self.svg,
            r##"<text x="{lx:.2}" y="{ly:.2}" font-size="11" text-anchor="middle" fill="#333" transform="rotate(-90 {lx:.2} {ly:.2})">{}</text>"##,
            escape_xml(y_label)
        )?;
        Ok(())
    }

    fn text(
        &mut self,
        x: f64,
        y: f64,
        size: f64,
        anchor: &str,
        fill: &str,
        content: &str,
    ) -> Result<(), ReportError> {
        write!(
            self.svg,
            r#"<text x="{x:.2}" y="{y:.2}" font-size="{size}" text-anchor="{anchor}" fill="{fill}">{}</text>"#,
            escape_xml(content)
        )?;
        Ok(())
    }

    fn polyline(&mut self, points: &[(f64, f64)], stroke: &str, dashed: bool) -> Result<(), ReportError> {
        if points.is_empty() {
            return Ok(());
        }
        self.svg.push_str(r#"<polyline fill="none" stroke-width="1.8" points=""#);
        for (x, y) in points {
            write!(self.svg, "{x:.2},{y:.2} ")?;
        }
        write!(self.svg, r#"" stroke="{stroke}""#)?;
        if dashed {
            self.svg.push_str(r#" stroke-dasharray="6 4""#);
        }
        self.svg.push_str("/>");
        Ok(())
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str, opacity: f64) -> Result<(), ReportError> {
        write!(
            self.svg,
            r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{fill}" fill-opacity="{opacity:.2}"/>"#
        )?;
        Ok(())
    }
}

fn price_panel(ctx: &mut RenderContext, frame: Frame, input: &RenderInput<'_>) -> Result<(), ReportError> {
    ctx.title(frame, "Historical Price + Extended Trend Forecast")?;
    ctx.axes(frame, "Day", "Price (USD)")?;

    let prices = input.series.prices();
    let extended = &input.forecast.trend_points_extended;
    // The extended forecast starts at the last historical day.
    let start = prices.len().saturating_sub(1) as f64;
    let x_hi = (start + extended.len() as f64).max(1.0);
    let (lo, hi) = bounds(prices.iter().chain(extended.iter()));

    let history: Vec<(f64, f64)> = prices
        .iter()
        .enumerate()
        .map(|(i, p)| (frame.sx(i as f64, 0.0, x_hi), frame.sy(*p, lo, hi)))
        .collect();
    let forecast: Vec<(f64, f64)> = extended
        .iter()
        .enumerate()
        .map(|(i, p)| (frame.sx(start + i as f64, 0.0, x_hi), frame.sy(*p, lo, hi)))
        .collect();

    ctx.polyline(&history, "blue", false)?;
    ctx.polyline(&forecast, "orange", true)?;
    ctx.text(frame.x + 8.0, frame.y + 16.0, 11.0, "start", "blue", "Historical Price")?;
    ctx.text(frame.x + 8.0, frame.y + 30.0, 11.0, "start", "orange", "Trend Forecast")?;
    if let (Some(first), Some(last)) = (input.series.dates().first(), input.forecast.forecast_dates.last()) {
        let span = format!("{} .. {}", first.format("%Y-%m-%d"), last.format("%Y-%m-%d"));
        ctx.text(frame.x + frame.w, frame.y + frame.h + 44.0, 10.0, "end", "#666", &span)?;
    }
    Ok(())
}

fn volatility_panel(ctx: &mut RenderContext, frame: Frame, volatility: &[f64]) -> Result<(), ReportError> {
    ctx.title(frame, &format!("GARCH Volatility (Next {} Days)", volatility.len()))?;
    ctx.axes(frame, "Forecast Day", "Std Dev")?;
    if volatility.is_empty() {
        return Ok(());
    }

    let (_, hi) = bounds(volatility.iter());
    let slot = frame.w / volatility.len() as f64;
    for (i, v) in volatility.iter().enumerate() {
        let top = frame.sy(*v, 0.0, hi);
        ctx.rect(frame.x + i as f64 * slot + slot * 0.1, top, slot * 0.8, frame.y + frame.h - top, "purple", 0.7)?;
        ctx.text(frame.x + (i as f64 + 0.5) * slot, frame.y + frame.h + 14.0, 10.0, "middle", "#333", &(i + 1).to_string())?;
    }
    Ok(())
}

const IMPLICATIONS: [&str; 7] = [
    "• High kurtosis means higher",
    "probability of extreme returns.",
    "Such returns imply higher risk.",
    "• Leptokurtic distributions suggest",
    "fat tails and increased risk.",
    "• Mesokurtic values are moderate.",
    "Platykurtic means fewer extremes.",
];

fn implications_panel(ctx: &mut RenderContext, frame: Frame) -> Result<(), ReportError> {
    ctx.title(frame, "Investment Risk Analysis")?;
    ctx.rect(frame.x, frame.y, frame.w, frame.h, "#d8f0d8", 0.8)?;
    ctx.text(frame.x + frame.w / 2.0, frame.y + 30.0, 16.0, "middle", "darkgreen", "Risk Analysis Implications")?;
    for (i, line) in IMPLICATIONS.iter().enumerate() {
        ctx.text(frame.x + 16.0, frame.y + 60.0 + i as f64 * 22.0, 13.0, "start", "black", line)?;
    }
    Ok(())
}

/// Kurtosis at which the gauge needle reaches the end of the dial.
const GAUGE_MAX: f64 = 10.0;

fn gauge_panel(ctx: &mut RenderContext, frame: Frame, risk: &RiskReport) -> Result<(), ReportError> {
    ctx.title(frame, "Kurtosis Risk Gauge")?;
    let cx = frame.x + frame.w / 2.0;
    let cy = frame.y + frame.h * 0.65;
    let radius = frame.h.min(frame.w) * 0.55;

    // The dial spans 45..135 degrees; low risk on the right, matching the needle.
    let sectors = [
        KurtosisClass::Platykurtic,
        KurtosisClass::Mesokurtic,
        KurtosisClass::Leptokurtic,
    ];
    for (i, class) in sectors.iter().enumerate() {
        let a0 = 0.25 * PI + i as f64 * PI / 6.0;
        let a1 = a0 + PI / 6.0;
        let (outer, inner) = (radius, radius * 0.6);
        let p = |r: f64, a: f64| (cx + r * a.cos(), cy - r * a.sin());
        let (x0, y0) = p(outer, a0);
        let (x1, y1) = p(outer, a1);
        let (x2, y2) = p(inner, a1);
        let (x3, y3) = p(inner, a0);
        write!(
            ctx.svg,
            r#"<path d="M{x0:.2},{y0:.2} A{outer:.2},{outer:.2} 0 0 0 {x1:.2},{y1:.2} L{x2:.2},{y2:.2} A{inner:.2},{inner:.2} 0 0 1 {x3:.2},{y3:.2} Z" fill="{}" fill-opacity="0.7"/>"#,
            class.color()
        )?;
    }

    let reading = (risk.kurtosis / GAUGE_MAX).clamp(0.0, 1.0);
    let theta = 0.25 * PI + reading * 0.5 * PI;
    write!(
        ctx.svg,
        r#"<line x1="{cx:.2}" y1="{cy:.2}" x2="{:.2}" y2="{:.2}" stroke="black" stroke-width="3"/><circle cx="{cx:.2}" cy="{cy:.2}" r="6" fill="black"/>"#,
        cx + 0.8 * radius * theta.cos(),
        cy - 0.8 * radius * theta.sin()
    )?;

    ctx.text(cx, cy + 24.0, 14.0, "middle", "black", &format!("Kurtosis: {:.2}", risk.kurtosis))?;
    ctx.text(
        cx,
        cy + 44.0,
        14.0,
        "middle",
        risk.kurtosis_class.color(),
        &format!("Classification: {}", risk.kurtosis_class),
    )?;
    ctx.text(cx, cy + 64.0, 11.0, "middle", "#555", "Values > 3 indicate fat tails and higher risk of extreme events")
}

const DENSITY_BINS: usize = 20;

/// Binned density of returns against observation index.
fn returns_density_panel(ctx: &mut RenderContext, frame: Frame, returns: &[f64]) -> Result<(), ReportError> {
    ctx.title(frame, "Daily Returns Density")?;
    ctx.axes(frame, "Observation Index", "Daily Return")?;
    if returns.is_empty() {
        return Ok(());
    }

    let (lo, hi) = bounds(returns.iter());
    let n = returns.len() as f64;
    let mut counts = [[0usize; DENSITY_BINS]; DENSITY_BINS];
    for (i, r) in returns.iter().enumerate() {
        let bx = bin(i as f64, 0.0, n);
        let by = bin(*r, lo, hi);
        counts[bx][by] += 1;
    }
    let max = counts.iter().flatten().copied().max().unwrap_or(1).max(1) as f64;

    let (cw, ch) = (frame.w / DENSITY_BINS as f64, frame.h / DENSITY_BINS as f64);
    for (bx, column) in counts.iter().enumerate() {
        for (by, count) in column.iter().enumerate().filter(|(_, c)| **c > 0) {
            let y = frame.y + frame.h - (by + 1) as f64 * ch;
            ctx.rect(frame.x + bx as f64 * cw, y, cw, ch, "steelblue", 0.2 + 0.8 * *count as f64 / max)?;
        }
    }
    Ok(())
}

fn returns_volume_panel(ctx: &mut RenderContext, frame: Frame, recent: &[Observation]) -> Result<(), ReportError> {
    ctx.title(frame, &format!("Returns vs. Volume (Last {} Days)", recent.len()))?;
    ctx.axes(frame, "Daily Return", "Volume")?;
    if recent.is_empty() {
        return Ok(());
    }

    let (r_lo, r_hi) = bounds(recent.iter().map(|o| &o.ret));
    let (v_lo, v_hi) = bounds(recent.iter().map(|o| &o.volume));
    let mean_price = recent.iter().map(|o| o.price).sum::<f64>() / recent.len() as f64;

    for o in recent {
        // Bubble area proportional to price / mean(price) * 200.
        let area = if mean_price > 0.0 { o.price / mean_price * 200.0 } else { 200.0 };
        let radius = (area / PI).sqrt();
        write!(
            ctx.svg,
            r#"<circle cx="{:.2}" cy="{:.2}" r="{radius:.2}" fill="teal" fill-opacity="0.6" stroke="black" stroke-width="0.5"/>"#,
            frame.sx(o.ret, r_lo, r_hi),
            frame.sy(o.volume, v_lo, v_hi)
        )?;
    }
    Ok(())
}

/// Finite min and max of `values`, widened when they coincide.
fn bounds<'a>(values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo <= f64::EPSILON * hi.abs().max(1.0) {
        let pad = lo.abs().max(1.0) * 0.05;
        return (lo - pad, hi + pad);
    }
    (lo, hi)
}

fn unit(value: f64, lo: f64, hi: f64) -> f64 {
    if hi > lo && value.is_finite() {
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.5
    }
}

fn bin(value: f64, lo: f64, hi: f64) -> usize {
    ((unit(value, lo, hi) * DENSITY_BINS as f64) as usize).min(DENSITY_BINS - 1)
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
