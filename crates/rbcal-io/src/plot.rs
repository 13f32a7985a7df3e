//! Response plots: nominal with tolerance band, fitted per component.
//!
//! Plots are rendered with plotters' bitmap backend. Text goes through the
//! `ab_glyph` font backend with DejaVu Sans embedded in the binary, so the
//! charts need no system fonts. Curve colors are fixed per component
//! (north blue, east orange, vertical green, nominal black).

use crate::{Error, Result};
use plotters::prelude::*;
use plotters::coord::CoordTranslate;
use plotters::style::{FontStyle, register_font};
use rbcal_analysis::{CalibrationOutcome, comparison_axis};
use rbcal_core::{Complex64, Component};
use std::path::Path;

const SIZE: (u32, u32) = (1000, 640);
const BAND_COLOR: RGBColor = RGBColor(160, 160, 160);
const GRID_COLOR: RGBColor = RGBColor(230, 230, 230);
const FONT: &str = "sans-serif";
const FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Make the embedded font available under plotters' `sans-serif` family.
fn register_fonts() -> Result<()> {
    register_font(FONT, FontStyle::Normal, FONT_BYTES)
        .map_err(|_| Error::Plot("embedded font is not a valid TrueType font".into()))
}

fn legend_line(color: RGBColor, width: u32) -> impl Fn((i32, i32)) -> PathElement<(i32, i32)> {
    move |(x, y)| PathElement::new(vec![(x, y), (x + 24, y)], color.stroke_width(width))
}

fn legend_band((x, y): (i32, i32)) -> Rectangle<(i32, i32)> {
    Rectangle::new([(x, y - 5), (x + 24, y + 5)], BAND_COLOR.mix(0.35).filled())
}

fn component_color(component: Component) -> RGBColor {
    match component {
        Component::North => RGBColor(0, 102, 204),
        Component::East => RGBColor(204, 102, 0),
        Component::Vertical => RGBColor(34, 139, 34),
    }
}

fn plot_error<E: std::fmt::Display>(err: E) -> Error {
    Error::Plot(err.to_string())
}

/// Normalised responses sampled on the comparison axis (0 Hz dropped).
struct Curves {
    freqs: Vec<f64>,
    nominal: Vec<Complex64>,
    fitted: Vec<(Component, Vec<Complex64>)>,
}

impl Curves {
    fn new(outcome: &CalibrationOutcome) -> Result<Self> {
        let settings = &outcome.settings;
        let axis = comparison_axis(settings.comparison_step_hz, settings.comparison_max_hz)?;
        let freqs = axis.get(1..).unwrap_or_default().to_vec();
        if freqs.len() < 2 {
            return Err(Error::Plot("comparison axis has fewer than two frequencies".into()));
        }
        let norm = settings.sensitivity_hz;
        Ok(Self {
            nominal: outcome.nominal.normalized_response(&freqs, norm),
            fitted: outcome
                .components
                .iter()
                .map(|r| (r.component, r.fitted.normalized_response(&freqs, norm)))
                .collect(),
            freqs,
        })
    }

    fn x_range(&self) -> std::ops::Range<f64> {
        self.freqs[0]..self.freqs[self.freqs.len() - 1]
    }

    /// Closed outline of `centre ± half_width`.
    fn band(&self, centre: &[f64], lower: impl Fn(f64) -> f64, upper: impl Fn(f64) -> f64) -> Vec<(f64, f64)> {
        let top = self.freqs.iter().zip(centre).map(|(&f, &v)| (f, upper(v)));
        let bottom = self.freqs.iter().zip(centre).rev().map(|(&f, &v)| (f, lower(v)));
        top.chain(bottom).collect()
    }
}

/// Amplitude plot, log frequency and log amplitude axes.
pub fn plot_amplitude(path: &Path, outcome: &CalibrationOutcome) -> Result<()> {
    let curves = Curves::new(outcome)?;
    let tolerance = outcome.settings.amplitude_tolerance_pct / 100.0;
    let nominal: Vec<f64> = curves.nominal.iter().map(|h| h.norm()).collect();

    let all = nominal
        .iter()
        .copied()
        .chain(curves.fitted.iter().flat_map(|(_, v)| v.iter().map(|h| h.norm())))
        .filter(|v| v.is_finite() && *v > 0.0);
    let (lo, hi) = all.fold((f64::INFINITY, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !(lo.is_finite() && hi > 0.0) {
        return Err(Error::Plot("no finite amplitude to plot".into()));
    }
    let y_range = (lo * (1.0 - tolerance) * 0.8)..(hi * (1.0 + tolerance) * 1.25);

    register_fonts()?;
    let root = BitMapBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Amplitude response (±{} %)", outcome.settings.amplitude_tolerance_pct),
            (FONT, 24),
        )
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(curves.x_range().log_scale(), y_range.log_scale())
        .map_err(plot_error)?;
    chart
        .configure_mesh()
        .x_labels(12)
        .y_labels(10)
        .x_desc("Frequency (Hz)")
        .y_desc("Normalised amplitude")
        .label_style((FONT, 14))
        .light_line_style(GRID_COLOR)
        .draw()
        .map_err(plot_error)?;

    let outline = curves.band(&nominal, |v| v * (1.0 - tolerance), |v| v * (1.0 + tolerance));
    chart
        .draw_series(std::iter::once(Polygon::new(outline, BAND_COLOR.mix(0.35).filled())))
        .map_err(plot_error)?
        .label("Tolerance")
        .legend(legend_band);
    chart
        .draw_series(LineSeries::new(
            curves.freqs.iter().copied().zip(nominal.iter().copied()),
            BLACK.stroke_width(2),
        ))
        .map_err(plot_error)?
        .label("Nominal")
        .legend(legend_line(BLACK, 2));
    for (component, values) in &curves.fitted {
        let color = component_color(*component);
        chart
            .draw_series(LineSeries::new(
                curves.freqs.iter().copied().zip(values.iter().map(|h| h.norm())),
                color.stroke_width(1),
            ))
            .map_err(plot_error)?
            .label(component.to_string())
            .legend(legend_line(color, 1));
    }
    draw_legend(&mut chart)?;

    root.present().map_err(plot_error)?;
    Ok(())
}

/// Phase plot in degrees, log frequency axis.
pub fn plot_phase(path: &Path, outcome: &CalibrationOutcome) -> Result<()> {
    let curves = Curves::new(outcome)?;
    let tolerance = outcome.settings.phase_tolerance_deg;
    let degrees = |values: &[Complex64]| -> Vec<f64> {
        values.iter().map(|h| h.arg().to_degrees()).collect()
    };
    let nominal = degrees(&curves.nominal);

    register_fonts()?;
    let root = BitMapBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Phase response (±{tolerance}°)"), (FONT, 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(curves.x_range().log_scale(), -180.0..180.0)
        .map_err(plot_error)?;
    chart
        .configure_mesh()
        .x_labels(12)
        .y_labels(13)
        .x_desc("Frequency (Hz)")
        .y_desc("Phase (deg)")
        .label_style((FONT, 14))
        .light_line_style(GRID_COLOR)
        .draw()
        .map_err(plot_error)?;

    let outline = curves.band(
        &nominal,
        |v| (v - tolerance).max(-180.0),
        |v| (v + tolerance).min(180.0),
    );
    chart
        .draw_series(std::iter::once(Polygon::new(outline, BAND_COLOR.mix(0.35).filled())))
        .map_err(plot_error)?
        .label("Tolerance")
        .legend(legend_band);
    chart
        .draw_series(LineSeries::new(
            curves.freqs.iter().copied().zip(nominal.iter().copied()),
            BLACK.stroke_width(2),
        ))
        .map_err(plot_error)?
        .label("Nominal")
        .legend(legend_line(BLACK, 2));
    for (component, values) in &curves.fitted {
        let color = component_color(*component);
        chart
            .draw_series(LineSeries::new(
                curves.freqs.iter().copied().zip(degrees(values)),
                color.stroke_width(1),
            ))
            .map_err(plot_error)?
            .label(component.to_string())
            .legend(legend_line(color, 1));
    }
    draw_legend(&mut chart)?;

    root.present().map_err(plot_error)?;
    Ok(())
}

fn draw_legend<'a, DB, CT>(chart: &mut ChartContext<'a, DB, CT>) -> Result<()>
where
    DB: DrawingBackend + 'a,
    CT: CoordTranslate,
{
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerLeft)
        .label_font((FONT, 14))
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .draw()
        .map_err(plot_error)
}
