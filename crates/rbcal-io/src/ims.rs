//! IMS2.0 message output: `CALIBRATE_RESULT` and `RESPONSE` (CAL2/PAZ2).
//!
//! IMS2.0 is a fixed-column text format. Numeric fields use C `printf`
//! conventions, so exponents always carry a sign and at least two digits
//! (`1.00000000e+00`), which Rust's `{:e}` does not produce on its own.

use chrono::{DateTime, Utc};
use rbcal_analysis::ComponentFitResult;
use rbcal_core::{Component, Mode, PoleZeroModel, Result, Units};
use std::fmt::Write as _;

/// Station metadata written into IMS2.0 messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    /// Network code used in `MSG_ID`.
    pub network: String,
    /// Station code (a5).
    pub station: String,
    /// Location/auxiliary code (a4).
    pub location: String,
    /// Channel prefix; the orientation letter is appended (`BH` + `Z`).
    pub channel_prefix: String,
    /// Instrument type (a6).
    pub instrument_type: String,
}

impl Station {
    /// Channel code of one component.
    pub fn channel(&self, component: Component) -> String {
        format!("{}{}", self.channel_prefix, component.orientation())
    }
}

/// Format `value` like C's `%<width>.<precision>e`.
pub fn format_exp(value: f64, width: usize, precision: usize) -> String {
    if !value.is_finite() {
        return format!("{:>width$}", value.to_string().to_lowercase());
    }
    let rust = format!("{value:.precision$e}");
    let formatted = match rust.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        }
        None => rust,
    };
    format!("{formatted:>width$}")
}

/// Left-justify `text` in exactly `width` columns, truncating if needed.
fn column(text: &str, width: usize) -> String {
    let clipped: String = text.chars().take(width).collect();
    format!("{clipped:<width$}")
}

fn date(ts: DateTime<Utc>) -> String {
    ts.format("%Y/%m/%d").to_string()
}

fn begin(out: &mut String, msg_id: &str, network: &str, data_type: &str) {
    let _ = writeln!(out, "BEGIN IMS2.0");
    let _ = writeln!(out, "MSG_TYPE DATA");
    let _ = writeln!(out, "MSG_ID {msg_id} {network}");
    let _ = writeln!(out, "DATA_TYPE {data_type} IMS2.0");
}

fn stop(out: &mut String) {
    let _ = writeln!(out, "STOP");
}

/// One `CAL2` line.
pub fn cal2_line(
    station: &Station,
    component: Component,
    nm_per_count: f64,
    period_secs: f64,
    sample_rate: f64,
    on: DateTime<Utc>,
) -> String {
    format!(
        "CAL2 {} {} {} {} {} {:>7.3} {:>10.5} {} {}",
        column(&station.station, 5),
        column(&station.channel(component), 3),
        column(&station.location, 4),
        column(&station.instrument_type, 6),
        format_exp(nm_per_count, 15, 8),
        period_secs,
        sample_rate,
        date(on),
        on.format("%H:%M"),
    )
}

/// `PAZ2` block for `model`: header line, then poles, then zeros.
///
/// The model is written as given; callers convert to displacement/hertz
/// and normalise at the calibration period first.
pub fn paz2_block(stage: u32, model: &PoleZeroModel, description: &str) -> Result<String> {
    let poles = model.poles(None);
    let zeros = model.zeros(None, None)?;
    let mut out = format!(
        "PAZ2 {:>2} V {} {:4} {:>8.3} {:>3} {:>3} {}\n",
        stage,
        format_exp(model.h0(), 15, 8),
        "",
        0.0,
        poles.len(),
        zeros.len(),
        column(description, 25).trim_end(),
    );
    for value in poles.iter().chain(&zeros) {
        let _ = writeln!(
            out,
            " {} {}",
            format_exp(value.re, 12, 5),
            format_exp(value.im, 12, 5)
        );
    }
    Ok(out)
}

/// `DATA_TYPE RESPONSE` message with one CAL2/PAZ2 pair per component.
pub fn response_message(
    msg_id: &str,
    station: &Station,
    results: &[ComponentFitResult],
    sample_rate: f64,
    on: DateTime<Utc>,
) -> Result<String> {
    let mut out = String::new();
    begin(&mut out, msg_id, &station.network, "RESPONSE");
    for result in results {
        let freq = result.sensitivity.frequency_hz;
        let displacement = result
            .fitted
            .converted(Mode::Displacement, Units::Hertz, freq)?;
        let _ = writeln!(
            out,
            "{}",
            cal2_line(
                station,
                result.component,
                result.sensitivity.nm_per_count,
                1.0 / freq,
                sample_rate,
                on,
            )
        );
        out.push_str(&paz2_block(1, &displacement, "fitted response")?);
    }
    stop(&mut out);
    Ok(out)
}

/// `DATA_TYPE CALIBRATE_RESULT` message: one row per component.
pub fn calibrate_result_message(
    msg_id: &str,
    station: &Station,
    results: &[ComponentFitResult],
    start: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    begin(&mut out, msg_id, &station.network, "CALIBRATE_RESULT");
    let _ = writeln!(out, "Sta   Chn Aux  InSpec Calib           Calper  Start_time");
    for result in results {
        let _ = writeln!(
            out,
            "{} {} {} {:<6} {} {:>7.3} {}",
            column(&station.station, 5),
            column(&station.channel(result.component), 3),
            column(&station.location, 4),
            if result.in_spec { "yes" } else { "no" },
            format_exp(result.sensitivity.nm_per_count, 15, 8),
            1.0 / result.sensitivity.frequency_hz,
            start.format("%Y/%m/%d %H:%M:%S"),
        );
    }
    stop(&mut out);
    out
}
