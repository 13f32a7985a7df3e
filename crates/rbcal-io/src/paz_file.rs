//! IDA PAZ response files.
//!
//! ```text
//! IDA-PAZ vel rad
//! 2   zeros
//! 4   poles
//! # zeros
//!  0.00000000e+00,  0.00000000e+00
//!  0.00000000e+00,  0.00000000e+00
//! # poles
//! -3.70000000e-02,  3.70000000e-02
//! ...
//! ```
//!
//! The gain is not stored; a model read from disk is normalised at 1 Hz.

use crate::Result;
use crate::ims::format_exp;
use rbcal_core::{Complex64, Error as CoreError, Mode, PoleZeroModel, Units};
use std::fmt::Write as _;
use std::path::Path;

const HEADER: &str = "IDA-PAZ";

/// Frequency at which models read from disk are normalised.
const FILE_NORM_HZ: f64 = 1.0;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Counts,
    Zeros,
    Poles,
}

fn leading_count(context: &str, line_no: usize, line: &str, what: &str) -> rbcal_core::Result<usize> {
    line.split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| CoreError::parse_at(context, line_no, format!("expected {what} count")))
}

fn complex_value(context: &str, line_no: usize, line: &str) -> rbcal_core::Result<Complex64> {
    let mut parts = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(str::parse::<f64>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(re)), Some(Ok(im)), None) => Ok(Complex64::new(re, im)),
        _ => Err(CoreError::parse_at(
            context,
            line_no,
            format!("expected '<re>, <im>', got '{}'", line.trim()),
        )),
    }
}

/// Parse response-file text. `context` names the source in error messages.
pub fn parse_paz(context: &str, text: &str) -> rbcal_core::Result<PoleZeroModel> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let (header_line, header) = lines
        .next()
        .ok_or_else(|| CoreError::parse(context, "empty response file"))?;
    let mut tokens = header.split_whitespace();
    if tokens.next() != Some(HEADER) {
        return Err(CoreError::parse_at(
            context,
            header_line,
            format!("expected '{HEADER}' header"),
        ));
    }
    let bad_header = |e: CoreError| CoreError::parse_at(context, header_line, e.to_string());
    let mode: Mode = tokens.next().map_or(Ok(Mode::Velocity), str::parse::<Mode>).map_err(bad_header)?;
    let units: Units = tokens.next().map_or(Ok(Units::Radians), str::parse::<Units>).map_err(bad_header)?;

    let (line_no, line) = lines
        .next()
        .ok_or_else(|| CoreError::parse(context, "missing zero count"))?;
    let zero_count = leading_count(context, line_no, line, "zero")?;
    let (line_no, line) = lines
        .next()
        .ok_or_else(|| CoreError::parse(context, "missing pole count"))?;
    let pole_count = leading_count(context, line_no, line, "pole")?;

    let mut section = Section::Counts;
    let mut zeros = Vec::with_capacity(zero_count);
    let mut poles = Vec::with_capacity(pole_count);
    let mut last_line = line_no;

    for (line_no, line) in lines {
        last_line = line_no;
        let trimmed = line.trim();
        if let Some(marker) = trimmed.strip_prefix('#') {
            let marker = marker.trim().to_ascii_lowercase();
            section = match (section, marker.as_str()) {
                (Section::Counts, "zeros") => Section::Zeros,
                (Section::Zeros, "poles") => {
                    if zeros.len() != zero_count {
                        return Err(CoreError::parse_at(
                            context,
                            line_no,
                            format!("expected {zero_count} zeros, read {}", zeros.len()),
                        ));
                    }
                    Section::Poles
                }
                _ => {
                    return Err(CoreError::parse_at(
                        context,
                        line_no,
                        format!("unexpected section marker '{trimmed}'"),
                    ));
                }
            };
            continue;
        }
        let value = complex_value(context, line_no, line)?;
        match section {
            Section::Counts => {
                return Err(CoreError::parse_at(context, line_no, "missing '# zeros' marker"));
            }
            Section::Zeros => zeros.push(value),
            Section::Poles => poles.push(value),
        }
    }

    match section {
        Section::Counts => return Err(CoreError::parse(context, "missing '# zeros' marker")),
        Section::Zeros => return Err(CoreError::parse(context, "missing '# poles' marker")),
        Section::Poles => {}
    }
    if poles.len() != pole_count {
        return Err(CoreError::parse_at(
            context,
            last_line,
            format!("expected {pole_count} poles, read {}", poles.len()),
        ));
    }

    let mut model = PoleZeroModel::from_parts(mode, units, poles, zeros);
    model.normalize_at(FILE_NORM_HZ);
    Ok(model)
}

/// Read a response file.
pub fn read_paz<P: AsRef<Path>>(path: P) -> Result<PoleZeroModel> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    Ok(parse_paz(&path.display().to_string(), &text)?)
}

/// Render `model` in response-file format.
pub fn format_paz(model: &PoleZeroModel) -> rbcal_core::Result<String> {
    let zeros = model.zeros(None, None)?;
    let poles = model.poles(None);

    let mut out = format!("{HEADER} {} {}\n", model.mode().short_name(), model.units());
    let _ = writeln!(out, "{:<3} zeros", zeros.len());
    let _ = writeln!(out, "{:<3} poles", poles.len());
    let _ = writeln!(out, "# zeros");
    for z in &zeros {
        let _ = writeln!(out, "{}, {}", format_exp(z.re, 15, 8), format_exp(z.im, 15, 8));
    }
    let _ = writeln!(out, "# poles");
    for p in &poles {
        let _ = writeln!(out, "{}, {}", format_exp(p.re, 15, 8), format_exp(p.im, 15, 8));
    }
    Ok(out)
}

/// Write `model` to a response file.
pub fn write_paz<P: AsRef<Path>>(path: P, model: &PoleZeroModel) -> Result<()> {
    std::fs::write(path, format_paz(model)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STS2: &str = "\
IDA-PAZ vel rad
2   zeros
4   poles

# zeros
 0.0, 0.0
 0.0, 0.0
# poles
-3.70e-02,  3.70e-02
-3.70e-02, -3.70e-02
-2.22e+02,  2.22e+02
-2.22e+02, -2.22e+02
";

    fn line_of(err: &CoreError) -> Option<usize> {
        match err {
            CoreError::Parse { line, .. } => *line,
            _ => None,
        }
    }

    #[test]
    fn test_parse_reference_file() {
        let model = parse_paz("sts2.paz", STS2).unwrap();
        assert_eq!(model.mode(), Mode::Velocity);
        assert_eq!(model.units(), Units::Radians);
        assert_eq!(model.num_zeros(), 2);
        assert_eq!(model.num_poles(), 4);
        assert_eq!(model.poles(None)[2], Complex64::new(-222.0, 222.0));
        assert!((model.response(1.0).norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_header_defaults() {
        let text = STS2.replacen("IDA-PAZ vel rad", "IDA-PAZ", 1);
        let model = parse_paz("x", &text).unwrap();
        assert_eq!(model.mode(), Mode::Velocity);
        assert_eq!(model.units(), Units::Radians);

        let text = STS2.replacen("vel rad", "acc hz", 1);
        let model = parse_paz("x", &text).unwrap();
        assert_eq!(model.mode(), Mode::Acceleration);
        assert_eq!(model.units(), Units::Hertz);
    }

    #[test]
    fn test_bad_header() {
        let err = parse_paz("x", &STS2.replacen("IDA-PAZ", "SAC-PZ", 1)).unwrap_err();
        assert_eq!(line_of(&err), Some(1));
        let err = parse_paz("x", &STS2.replacen("vel", "jerk", 1)).unwrap_err();
        assert_eq!(line_of(&err), Some(1));
    }

    #[test]
    fn test_count_mismatch() {
        let err = parse_paz("x", &STS2.replacen("4   poles", "5   poles", 1)).unwrap_err();
        assert!(err.to_string().contains("expected 5 poles, read 4"), "got: {err}");

        let err = parse_paz("x", &STS2.replacen("2   zeros", "3   zeros", 1)).unwrap_err();
        assert_eq!(line_of(&err), Some(8));
    }

    #[test]
    fn test_malformed_value() {
        let err = parse_paz("x", &STS2.replacen("-2.22e+02,  2.22e+02", "-2.22e+02, abc", 1))
            .unwrap_err();
        assert_eq!(line_of(&err), Some(11));
    }

    #[test]
    fn test_missing_markers() {
        assert!(parse_paz("x", &STS2.replacen("# zeros\n", "", 1)).is_err());
        assert!(parse_paz("x", &STS2.replacen("# poles\n", "", 1)).is_err());
        assert!(parse_paz("x", "").is_err());
    }

    #[test]
    fn test_format_then_parse() {
        let model = parse_paz("sts2.paz", STS2).unwrap();
        let text = format_paz(&model).unwrap();
        assert!(text.starts_with("IDA-PAZ vel rad\n"));
        assert!(text.contains("-2.22000000e+02,  2.22000000e+02"));
        assert_eq!(parse_paz("again", &text).unwrap(), model);
    }
}
