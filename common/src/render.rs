use std::{fmt::Display, fs, path::Path};

use plotters::{
    coord::Shift,
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};
use svg2pdf::{ConversionOptions, PageOptions, usvg};

use crate::{
    classify::Variant,
    error::AnalysisError,
    stats::{GroupSummary, VariantSeries},
};

/// ColorBrewer Set2, used for bar fills.
pub const SET2: [RGBColor; 8] = [
    RGBColor(102, 194, 165),
    RGBColor(252, 141, 98),
    RGBColor(141, 160, 203),
    RGBColor(231, 138, 195),
    RGBColor(166, 216, 84),
    RGBColor(255, 217, 47),
    RGBColor(229, 196, 148),
    RGBColor(179, 179, 179),
];

/// ColorBrewer Set1, used for error bars.
pub const SET1: [RGBColor; 9] = [
    RGBColor(228, 26, 28),
    RGBColor(55, 126, 184),
    RGBColor(77, 175, 74),
    RGBColor(152, 78, 163),
    RGBColor(255, 127, 0),
    RGBColor(255, 255, 51),
    RGBColor(166, 86, 40),
    RGBColor(247, 129, 191),
    RGBColor(153, 153, 153),
];

const FONT: &str = "sans-serif";
const FONT_SIZE: u32 = 16;

/// (bar fill, error bar) colors of a variant
pub fn variant_colors(variant: Variant) -> (RGBColor, RGBColor) {
    match variant {
        Variant::Lazy => (SET2[0], SET1[2]),
        Variant::NonLazy => (SET2[1], SET1[3]),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarAlign {
    /// Bar is centred on its x position
    Center,
    /// Bar starts at its x position
    Edge,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum YRange {
    Fixed(f64, f64),
    /// From zero to the tallest error bar, plus `headroom`
    Auto { headroom: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub x: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub color: RGBColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    /// Legend entry, if any
    pub label: Option<String>,
    pub error_color: RGBColor,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub series: Vec<BarSeries>,
    pub bar_width: f64,
    pub align: BarAlign,
    pub x_range: (f64, f64),
    pub y_range: YRange,
    pub ticks: Vec<(f64, String)>,
    pub x_label: Option<String>,
    pub y_label: String,
    /// Print each bar's mean above it
    pub annotate: bool,
}

impl BarChart {
    fn span(&self, x: f64) -> (f64, f64) {
        match self.align {
            BarAlign::Center => (x - self.bar_width / 2.0, x + self.bar_width / 2.0),
            BarAlign::Edge => (x, x + self.bar_width),
        }
    }

    fn center(&self, x: f64) -> f64 {
        let (left, right) = self.span(x);
        (left + right) / 2.0
    }

    pub fn y_bounds(&self) -> (f64, f64) {
        match self.y_range {
            YRange::Fixed(lo, hi) => (lo, hi),
            YRange::Auto { headroom } => {
                let top = self
                    .series
                    .iter()
                    .flat_map(|s| s.bars.iter())
                    .map(|b| b.mean + b.std_dev)
                    .fold(0.0, f64::max);
                let hi = top * 1.05 + headroom;
                (0.0, if hi > 0.0 { hi } else { 1.0 })
            }
        }
    }

    fn has_legend(&self) -> bool {
        self.series.iter().any(|s| s.label.is_some())
    }
}

/// Lazy bars at `i`, non-lazy bars next to them, one tick per pair.
pub fn grouped_variant_chart(
    series: &VariantSeries,
    tick_labels: &[String],
    x_label: &str,
    y_label: &str,
    headroom: f64,
) -> Result<BarChart, AnalysisError> {
    if series.lazy.len() != series.non_lazy.len() {
        return Err(AnalysisError::SeriesLengthMismatch {
            lazy: series.lazy.len(),
            non_lazy: series.non_lazy.len(),
        });
    }
    let width = 0.35;
    let make_series = |variant: Variant, offset: f64| {
        let (color, error_color) = variant_colors(variant);
        BarSeries {
            label: Some(variant.label().to_owned()),
            error_color,
            bars: series
                .get(variant)
                .iter()
                .enumerate()
                .map(|(i, g)| Bar {
                    x: i as f64 + offset,
                    mean: g.summary.mean,
                    std_dev: g.summary.std_dev,
                    color,
                })
                .collect(),
        }
    };

    let groups = series.lazy.len();
    Ok(BarChart {
        series: vec![
            make_series(Variant::Lazy, 0.0),
            make_series(Variant::NonLazy, width),
        ],
        bar_width: width,
        align: BarAlign::Edge,
        x_range: (-0.3, groups as f64),
        y_range: YRange::Auto { headroom },
        ticks: tick_labels
            .iter()
            .take(groups)
            .enumerate()
            .map(|(i, label)| (i as f64 + width, label.clone()))
            .collect(),
        x_label: Some(x_label.to_owned()),
        y_label: y_label.to_owned(),
        annotate: false,
    })
}

/// One bar per group, each in its own color.
pub fn single_series_chart(
    groups: &[GroupSummary],
    x_label: &str,
    y_label: &str,
    headroom: f64,
) -> BarChart {
    let width = 0.5;
    BarChart {
        series: vec![BarSeries {
            label: None,
            error_color: SET1[2],
            bars: groups
                .iter()
                .enumerate()
                .map(|(i, g)| Bar {
                    x: i as f64,
                    mean: g.summary.mean,
                    std_dev: g.summary.std_dev,
                    color: SET2[i % SET2.len()],
                })
                .collect(),
        }],
        bar_width: width,
        align: BarAlign::Edge,
        x_range: (-0.3, groups.len() as f64),
        y_range: YRange::Auto { headroom },
        ticks: groups
            .iter()
            .enumerate()
            .map(|(i, g)| (i as f64 + width / 2.0, g.name.clone()))
            .collect(),
        x_label: Some(x_label.to_owned()),
        y_label: y_label.to_owned(),
        annotate: false,
    }
}

fn render_error(err: impl Display) -> AnalysisError {
    AnalysisError::Render(err.to_string())
}

/// Draws `chart` into an SVG document.
pub fn render_svg(chart: &BarChart, size: (u32, u32)) -> Result<String, AnalysisError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw_bar_chart(&root, chart).map_err(render_error)?;
        root.present().map_err(render_error)?;
    }
    Ok(svg)
}

/// Converts an SVG document to a single page PDF. Text is set with the
/// system fonts.
pub fn svg_to_pdf(svg: &str) -> Result<Vec<u8>, AnalysisError> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg, &options).map_err(render_error)?;
    svg2pdf::to_pdf(&tree, ConversionOptions::default(), PageOptions::default())
        .map_err(|e| AnalysisError::Render(format!("{e:?}")))
}

/// Writes `chart` as PDF to `path` and its SVG source next to it.
pub fn render_bar_chart(
    path: &Path,
    chart: &BarChart,
    size: (u32, u32),
) -> Result<(), AnalysisError> {
    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| AnalysisError::io(parent, e))?;
    }
    let svg = render_svg(chart, size)?;
    let svg_path = path.with_extension("svg");
    fs::write(&svg_path, &svg).map_err(|e| AnalysisError::io(&svg_path, e))?;
    let pdf = svg_to_pdf(&svg)?;
    fs::write(path, pdf).map_err(|e| AnalysisError::io(path, e))?;
    Ok(())
}

fn draw_bar_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &BarChart,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;
    let (y_lo, y_hi) = chart.y_bounds();

    let mut ctx = ChartBuilder::on(root)
        .margin(10)
        .x_label_area_size(if chart.x_label.is_some() { 60 } else { 40 })
        .y_label_area_size(70)
        .build_cartesian_2d(chart.x_range.0..chart.x_range.1, y_lo..y_hi)?;

    // x positions are labelled by hand below
    let blank = |_: &f64| String::new();
    let mut mesh = ctx.configure_mesh();
    mesh.disable_x_mesh()
        .x_label_formatter(&blank)
        .y_desc(chart.y_label.as_str())
        .axis_desc_style((FONT, FONT_SIZE))
        .label_style((FONT, FONT_SIZE - 2))
        .light_line_style(WHITE);
    if let Some(x_label) = &chart.x_label {
        mesh.x_desc(x_label.as_str());
    }
    mesh.draw()?;

    for series in &chart.series {
        let drawn = ctx.draw_series(series.bars.iter().map(|bar| {
            let (left, right) = chart.span(bar.x);
            Rectangle::new([(left, 0.0), (right, bar.mean)], bar.color.filled())
        }))?;
        if let Some(label) = &series.label {
            let color = series.bars.first().map_or(BLACK, |b| b.color);
            drawn
                .label(label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        ctx.draw_series(series.bars.iter().map(|bar| {
            ErrorBar::new_vertical(
                chart.center(bar.x),
                bar.mean - bar.std_dev,
                bar.mean,
                bar.mean + bar.std_dev,
                series.error_color.stroke_width(1),
                8,
            )
        }))?;

        if chart.annotate {
            let style = (FONT, FONT_SIZE - 4)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Bottom));
            ctx.draw_series(series.bars.iter().map(|bar| {
                EmptyElement::at((chart.center(bar.x), bar.mean))
                    + Text::new(format!("{:.2}", bar.mean), (0, -4), style.clone())
            }))?;
        }
    }

    let tick_style = (FONT, FONT_SIZE - 2)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));
    for (x, label) in &chart.ticks {
        let (px, py) = ctx.plotting_area().map_coordinate(&(*x, y_lo));
        root.draw(&Text::new(label.as_str(), (px, py + 6), tick_style.clone()))?;
    }

    if chart.has_legend() {
        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .border_style(TRANSPARENT)
            .background_style(WHITE.mix(0.8))
            .label_font((FONT, FONT_SIZE - 2))
            .draw()?;
    }
    Ok(())
}
