//! Attempt trend charts
//!
//! The engine produces a resolution-independent [`ChartScene`] made of draw
//! commands in CSS pixels. The scene can be replayed onto any surface or
//! serialized to SVG, where the surface's pixel ratio sets the backing size.

use std::fmt::{self, Write};
use serde::Serialize;

use crate::{
    panel::view::format_ms,
    state::{Timer, TimerKind},
};

pub const MIN_CSS_WIDTH: f64 = 320.0;
pub const MIN_CSS_HEIGHT: f64 = 180.0;

const PAD_LEFT: f64 = 50.0;
const PAD_RIGHT: f64 = 18.0;
const PAD_TOP: f64 = 12.0;
const PAD_BOTTOM: f64 = 26.0;
const GRID_DIVISIONS: u32 = 4;
const LINE_WIDTH: f64 = 3.0;
const MARKER_RADIUS: f64 = 5.0;

pub const TOO_FEW_ATTEMPTS: &str = "Record at least 2 attempts to plot a chart.";
pub const COUNTDOWN_HAS_NO_CHART: &str = "Countdown timers have no chart.";
pub const CAPTION: &str = "Attempts";

/// Direction of an attempt history, first vs last value
///
/// Lower times are better on a repeated task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improvement,
    Regression,
    Stable,
}

impl Trend {
    pub fn classify(first: u64, last: u64) -> Self {
        match last.cmp(&first) {
            std::cmp::Ordering::Less => Trend::Improvement,
            std::cmp::Ordering::Greater => Trend::Regression,
            std::cmp::Ordering::Equal => Trend::Stable,
        }
    }

    /// `None` with fewer than two values
    pub fn from_values(values: &[u64]) -> Option<Self> {
        match values {
            [first, .., last] => Some(Self::classify(*first, *last)),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Improvement => "improvement",
            Trend::Regression => "regression",
            Trend::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backing store of a chart
///
/// Tracks the logical (CSS) size and the device pixel ratio. The backing
/// pixel size only changes, and `resizes` only counts up, when the computed
/// pixel dimensions differ from the current ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSurface {
    pub css_width: f64,
    pub css_height: f64,
    pub pixel_ratio: f64,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub resizes: u32,
}

impl ChartSurface {
    pub fn new() -> Self {
        Self {
            css_width: MIN_CSS_WIDTH,
            css_height: MIN_CSS_HEIGHT,
            pixel_ratio: 1.0,
            pixel_width: 0,
            pixel_height: 0,
            resizes: 0,
        }
    }

    /// Fit the surface to a layout size. Returns true if the backing store
    /// was resized.
    pub fn fit(&mut self, css_width: f64, css_height: f64, device_pixel_ratio: f64) -> bool {
        let ratio = if device_pixel_ratio.is_finite() {
            device_pixel_ratio.max(1.0)
        } else {
            1.0
        };
        let css_width = sanitize(css_width).floor().max(MIN_CSS_WIDTH);
        let css_height = sanitize(css_height).floor().max(MIN_CSS_HEIGHT);
        let pixel_width = (css_width * ratio).floor() as u32;
        let pixel_height = (css_height * ratio).floor() as u32;

        self.css_width = css_width;
        self.css_height = css_height;
        self.pixel_ratio = ratio;

        if pixel_width == self.pixel_width && pixel_height == self.pixel_height {
            return false;
        }
        self.pixel_width = pixel_width;
        self.pixel_height = pixel_height;
        self.resizes += 1;
        true
    }
}

impl Default for ChartSurface {
    fn default() -> Self {
        Self::new()
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// One drawing step, coordinates in CSS pixels
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    Clear { width: f64, height: f64 },
    GridLine { x1: f64, y1: f64, x2: f64, y2: f64 },
    Polyline { points: Vec<[f64; 2]>, width: f64 },
    Marker { x: f64, y: f64, radius: f64 },
    Label { x: f64, y: f64, text: String },
}

/// A fully laid out trend chart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartScene {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
    pub min: u64,
    pub max: u64,
    pub trend: Trend,
    pub commands: Vec<DrawCommand>,
}

impl ChartScene {
    /// Plotted points in drawing order
    pub fn points(&self) -> &[[f64; 2]] {
        self.commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::Polyline { points, .. } => Some(points.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Label { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Render as a standalone SVG document sized in device pixels
    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            (self.width * self.pixel_ratio).floor(),
            (self.height * self.pixel_ratio).floor(),
            self.width,
            self.height,
        );
        for command in &self.commands {
            let _ = match command {
                DrawCommand::Clear { width, height } => write!(
                    svg,
                    r#"<rect x="0" y="0" width="{}" height="{}" fill="none"/>"#,
                    width, height
                ),
                DrawCommand::GridLine { x1, y1, x2, y2 } => write!(
                    svg,
                    r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="rgb(255,255,255)" stroke-opacity="0.07" stroke-width="1"/>"#,
                    x1, y1, x2, y2
                ),
                DrawCommand::Polyline { points, width } => {
                    let coords: Vec<String> = points
                        .iter()
                        .map(|[x, y]| format!("{:.1},{:.1}", x, y))
                        .collect();
                    write!(
                        svg,
                        r#"<polyline points="{}" fill="none" stroke="rgb(88,101,242)" stroke-opacity="0.9" stroke-width="{}"/>"#,
                        coords.join(" "),
                        width
                    )
                }
                DrawCommand::Marker { x, y, radius } => write!(
                    svg,
                    r#"<circle cx="{:.1}" cy="{:.1}" r="{}" fill="rgb(242,243,245)" fill-opacity="0.95"/>"#,
                    x, y, radius
                ),
                DrawCommand::Label { x, y, text } => write!(
                    svg,
                    r#"<text x="{:.1}" y="{:.1}" fill="rgb(181,186,193)" font-size="12" font-family="ui-sans-serif, system-ui">{}</text>"#,
                    x,
                    y,
                    escape_xml(text)
                ),
            };
        }
        svg.push_str("</svg>");
        svg
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// What a chart panel shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ChartOutput {
    Hidden,
    Placeholder { message: &'static str },
    Drawn(ChartScene),
}

impl ChartOutput {
    pub fn scene(&self) -> Option<&ChartScene> {
        match self {
            ChartOutput::Drawn(scene) => Some(scene),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ChartOutput::Placeholder { .. })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChartEngine;

impl ChartEngine {
    pub fn new() -> Self {
        Self
    }

    /// Lay out `values` onto `surface`
    pub fn plot(&self, values: &[u64], surface: &ChartSurface) -> ChartOutput {
        let Some(trend) = Trend::from_values(values) else {
            return ChartOutput::Placeholder {
                message: TOO_FEW_ATTEMPTS,
            };
        };

        let (w, h) = (surface.css_width, surface.css_height);
        let inner_w = w - PAD_LEFT - PAD_RIGHT;
        let inner_h = h - PAD_TOP - PAD_BOTTOM;

        let min = values.iter().copied().min().unwrap_or(0);
        let max = values.iter().copied().max().unwrap_or(0);
        let range = (max - min).max(1) as f64;
        let x_step = inner_w / (values.len() - 1) as f64;

        let mut commands = vec![DrawCommand::Clear { width: w, height: h }];
        for i in 0..=GRID_DIVISIONS {
            let y = PAD_TOP + inner_h * f64::from(i) / f64::from(GRID_DIVISIONS);
            commands.push(DrawCommand::GridLine {
                x1: PAD_LEFT,
                y1: y,
                x2: PAD_LEFT + inner_w,
                y2: y,
            });
        }

        let points: Vec<[f64; 2]> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let x = PAD_LEFT + i as f64 * x_step;
                let y = PAD_TOP + inner_h - ((v - min) as f64 / range) * inner_h;
                [x, y]
            })
            .collect();

        let markers: Vec<DrawCommand> = points
            .iter()
            .map(|&[x, y]| DrawCommand::Marker {
                x,
                y,
                radius: MARKER_RADIUS,
            })
            .collect();
        commands.push(DrawCommand::Polyline {
            points,
            width: LINE_WIDTH,
        });
        commands.extend(markers);

        commands.push(DrawCommand::Label {
            x: 8.0,
            y: 18.0,
            text: format!("{} ms", max),
        });
        commands.push(DrawCommand::Label {
            x: 8.0,
            y: h - 18.0,
            text: format!("{} ms", min),
        });
        commands.push(DrawCommand::Label {
            x: w / 2.0 - 70.0,
            y: h - 6.0,
            text: CAPTION.to_string(),
        });

        ChartOutput::Drawn(ChartScene {
            width: w,
            height: h,
            pixel_ratio: surface.pixel_ratio,
            min,
            max,
            trend,
            commands,
        })
    }

    /// Chart state for a timer, honouring its kind and visibility
    pub fn render_timer(&self, timer: &Timer, surface: &ChartSurface) -> ChartOutput {
        if timer.kind != TimerKind::Stopwatch {
            return ChartOutput::Placeholder {
                message: COUNTDOWN_HAS_NO_CHART,
            };
        }
        if !timer.chart_open {
            return ChartOutput::Hidden;
        }
        let values: Vec<u64> = timer.logs().iter().map(|a| a.ms).collect();
        self.plot(&values, surface)
    }

    /// Trend line shown under an open stopwatch chart
    pub fn note(&self, timer: &Timer) -> Option<String> {
        if timer.kind != TimerKind::Stopwatch || !timer.chart_open {
            return None;
        }
        let values: Vec<u64> = timer.logs().iter().map(|a| a.ms).collect();
        let trend = Trend::from_values(&values)?;
        let (first, last) = (values[0], values[values.len() - 1]);
        Some(format!(
            "Trend: {} • First: {} • Last: {}",
            trend,
            format_ms(first),
            format_ms(last)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stopwatch_with(values: &[u64]) -> Timer {
        let mut t = Timer::new(TimerKind::Stopwatch, "Practice", 0);
        for &v in values {
            t.elapsed_ms = v;
            t.record_attempt(0, Utc::now());
        }
        t
    }

    #[test]
    fn trend_classification() {
        assert_eq!(Trend::from_values(&[5, 3]), Some(Trend::Improvement));
        assert_eq!(Trend::from_values(&[3, 5]), Some(Trend::Regression));
        assert_eq!(Trend::from_values(&[4, 4]), Some(Trend::Stable));
        assert_eq!(Trend::from_values(&[9, 1, 9]), Some(Trend::Stable));
        assert_eq!(Trend::from_values(&[4]), None);
    }

    #[test]
    fn fewer_than_two_points_is_a_placeholder() {
        let engine = ChartEngine::new();
        let surface = ChartSurface::new();
        for values in [&[][..], &[1_200][..]] {
            let out = engine.plot(values, &surface);
            assert_eq!(out, ChartOutput::Placeholder { message: TOO_FEW_ATTEMPTS });
        }
    }

    #[test]
    fn points_span_the_drawing_region() {
        let engine = ChartEngine::new();
        let mut surface = ChartSurface::new();
        surface.fit(320.0, 180.0, 1.0);

        let out = engine.plot(&[5, 3], &surface);
        let scene = out.scene().unwrap();
        assert_eq!(scene.trend, Trend::Improvement);
        // max sits on the top margin, min on the bottom one
        assert_eq!(scene.points(), &[[50.0, 12.0], [302.0, 154.0]]);

        let labels: Vec<&str> = scene.labels().collect();
        assert_eq!(labels, vec!["5 ms", "3 ms", "Attempts"]);

        let markers = scene
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Marker { .. }))
            .count();
        assert_eq!(markers, 2);
    }

    #[test]
    fn flat_series_stays_on_baseline() {
        let scene = ChartEngine::new().plot(&[4, 4, 4], &ChartSurface::new());
        let scene = scene.scene().unwrap();
        assert_eq!(scene.trend, Trend::Stable);
        assert!(scene.points().iter().all(|[_, y]| *y == 154.0));
    }

    #[test]
    fn surface_resizes_only_on_change() {
        let mut surface = ChartSurface::new();
        assert!(surface.fit(400.0, 200.0, 2.0));
        assert_eq!((surface.pixel_width, surface.pixel_height), (800, 400));
        assert!(!surface.fit(400.4, 200.0, 2.0));
        assert!(!surface.fit(400.0, 200.0, 2.0));
        assert_eq!(surface.resizes, 1);

        assert!(surface.fit(100.0, 50.0, 0.5));
        assert_eq!((surface.css_width, surface.css_height), (MIN_CSS_WIDTH, MIN_CSS_HEIGHT));
        assert_eq!((surface.pixel_width, surface.pixel_height), (320, 180));
        assert_eq!(surface.resizes, 2);
    }

    #[test]
    fn countdown_and_closed_charts() {
        let engine = ChartEngine::new();
        let surface = ChartSurface::new();
        let cd = Timer::new(TimerKind::Countdown, "Focus", 1_000);
        assert_eq!(
            engine.render_timer(&cd, &surface),
            ChartOutput::Placeholder { message: COUNTDOWN_HAS_NO_CHART }
        );

        let mut sw = stopwatch_with(&[10, 20]);
        sw.chart_open = false;
        assert_eq!(engine.render_timer(&sw, &surface), ChartOutput::Hidden);
        assert!(engine.note(&sw).is_none());
    }

    #[test]
    fn note_reports_trend_and_extremes() {
        let engine = ChartEngine::new();
        let sw = stopwatch_with(&[65_000, 61_250]);
        assert_eq!(
            engine.note(&sw).unwrap(),
            "Trend: improvement • First: 00:01:05.000 • Last: 00:01:01.250"
        );
        assert!(engine.note(&stopwatch_with(&[1])).is_none());
    }

    #[test]
    fn svg_is_scaled_by_pixel_ratio() {
        let mut surface = ChartSurface::new();
        surface.fit(320.0, 180.0, 2.0);
        let svg = ChartEngine::new()
            .plot(&[3, 5], &surface)
            .scene()
            .unwrap()
            .to_svg();
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="640" height="360" viewBox="0 0 320 180">"#));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains(">Attempts</text>"));
        assert!(svg.ends_with("</svg>"));
    }
}
