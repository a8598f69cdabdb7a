use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{FigureError, FigureResult};

/// Minimum number of major intervals an automatic tick spacing must fit.
pub const AUTO_TICK_MIN_INTERVALS: f64 = 3.0;

/// Log axes spanning more than this many decades get one tick per decade.
pub const LOG_DECADE_TICK_SPAN: f64 = 2.0;

/// Major/minor `dtick` pair applied to a main axis and its minor sub-axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSpec {
    pub major: Value,
    pub minor: Value,
}

impl TickSpec {
    /// Linear spacing: `num_minor` minor ticks per major interval.
    pub fn linear(interval: f64, num_minor: u32) -> FigureResult<Self> {
        if !interval.is_finite() || interval <= 0.0 {
            return Err(FigureError::InvalidData(
                "tick interval must be finite and > 0".to_owned(),
            ));
        }
        if num_minor == 0 {
            return Err(FigureError::InvalidData(
                "number of minor ticks must be > 0".to_owned(),
            ));
        }
        Ok(Self {
            major: json!(interval),
            minor: json!(interval / f64::from(num_minor)),
        })
    }

    /// Spacing with an explicit minor `dtick` string (`L<f>`, `D1`, `D2`).
    pub fn with_log_minor(major: Value, logtick: &str) -> FigureResult<Self> {
        validate_log_dtick(logtick)?;
        Ok(Self {
            major,
            minor: Value::String(logtick.to_owned()),
        })
    }
}

/// Picks a "nice" major interval (1, 2 or 5 times a power of ten) so that at
/// least three intervals fit into `range`, together with the minor count.
pub fn linear_tick_interval(range: (f64, f64)) -> FigureResult<(f64, u32)> {
    let span = range.1 - range.0;
    if !span.is_finite() || span <= 0.0 {
        return Err(FigureError::InvalidData(format!(
            "axis range must be finite and increasing: [{}, {}]",
            range.0, range.1
        )));
    }

    let rough = span / AUTO_TICK_MIN_INTERVALS;
    let order = rough.log10().floor() as i32;
    let magnitude = 10f64.powi(order);
    let scaled = rough / magnitude;

    Ok(if scaled > 5.0 {
        (5.0 * magnitude, 5)
    } else if scaled > 2.0 {
        (2.0 * magnitude, 4)
    } else {
        (magnitude, 5)
    })
}

/// Automatic tick spacing for an axis range.
///
/// For log axes `range` is given in decades (log10 of the data), matching
/// Plotly's convention for `type: "log"` ranges.
pub fn auto_axis_ticks(range: (f64, f64), log: bool) -> FigureResult<TickSpec> {
    if !log {
        let (interval, num_minor) = linear_tick_interval(range)?;
        return TickSpec::linear(interval, num_minor);
    }

    if range.1 - range.0 > LOG_DECADE_TICK_SPAN {
        return TickSpec::with_log_minor(json!(1), "D1");
    }

    let (linear_min, linear_max) = (10f64.powf(range.0), 10f64.powf(range.1));
    let rough = (linear_max - linear_min) / AUTO_TICK_MIN_INTERVALS;
    if !rough.is_finite() || rough <= 0.0 {
        return Err(FigureError::InvalidData(format!(
            "log axis range must be finite and increasing: [{}, {}]",
            range.0, range.1
        )));
    }
    let order = rough.log10().floor() as i32;
    let magnitude = 10f64.powi(order);
    let scaled = rough / magnitude;
    let step = if scaled > 5.0 {
        5.0
    } else if scaled > 2.0 {
        2.0
    } else {
        1.0
    } * magnitude;

    TickSpec::with_log_minor(json!(format!("L{step}")), &format!("L{}", step / 5.0))
}

fn validate_log_dtick(value: &str) -> FigureResult<()> {
    if value == "D1" || value == "D2" {
        return Ok(());
    }
    let parsed = value
        .strip_prefix('L')
        .and_then(|rest| rest.parse::<f64>().ok());
    match parsed {
        Some(step) if step.is_finite() && step > 0.0 => Ok(()),
        _ => Err(FigureError::InvalidData(format!(
            "log tick must be `D1`, `D2` or `L<positive number>`, got `{value}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{auto_axis_ticks, linear_tick_interval};
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn linear_interval_prefers_five_two_one() {
        let (interval, minor) = linear_tick_interval((0.0, 100.0)).expect("valid range");
        assert_relative_eq!(interval, 20.0);
        assert_eq!(minor, 4);

        let (interval, minor) = linear_tick_interval((0.0, 20.0)).expect("valid range");
        assert_relative_eq!(interval, 5.0);
        assert_eq!(minor, 5);

        let (interval, minor) = linear_tick_interval((0.0, 4.5)).expect("valid range");
        assert_relative_eq!(interval, 1.0);
        assert_eq!(minor, 5);
    }

    #[test]
    fn wide_log_range_uses_decades() {
        let spec = auto_axis_ticks((-1.0, 3.0), true).expect("valid range");
        assert_eq!(spec.major, json!(1));
        assert_eq!(spec.minor, json!("D1"));
    }

    #[test]
    fn narrow_log_range_uses_linear_steps_in_value() {
        // 10^0..10^1 -> rough step 3 -> 2
        let spec = auto_axis_ticks((0.0, 1.0), true).expect("valid range");
        assert_eq!(spec.major, json!("L2"));
        assert_eq!(spec.minor, json!("L0.4"));
    }

    #[test]
    fn degenerate_range_is_rejected() {
        assert!(linear_tick_interval((1.0, 1.0)).is_err());
        assert!(linear_tick_interval((f64::NAN, 1.0)).is_err());
    }
}
