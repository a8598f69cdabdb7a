use figure_kit::api::{ExtendedFigure, LegendOptions, LegendPosition};
use figure_kit::core::{auto_axis_ticks, linear_tick_interval, make_heatmap};
use proptest::prelude::*;
use serde_json::json;

fn is_nice(interval: f64) -> bool {
    let magnitude = 10f64.powf(interval.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .iter()
        .any(|factor| (interval / magnitude - factor).abs() <= 1e-9)
}

proptest! {
    #[test]
    fn auto_interval_is_nice_and_fits_three_times(
        low in -1.0e6f64..1.0e6,
        span in 1.0e-3f64..1.0e6
    ) {
        let (interval, num_minor) = linear_tick_interval((low, low + span)).expect("interval");
        prop_assert!(is_nice(interval));
        prop_assert!(span / interval >= 3.0 - 1e-9);
        prop_assert!(span / interval < 30.0);
        prop_assert!(num_minor == 4 || num_minor == 5);
    }

    #[test]
    fn wide_log_ranges_tick_every_decade(low in -10.0f64..10.0, span in 2.001f64..20.0) {
        let spec = auto_axis_ticks((low, low + span), true).expect("ticks");
        prop_assert_eq!(spec.major, json!(1));
        prop_assert_eq!(spec.minor, json!("D1"));
    }

    #[test]
    fn legend_corners_stay_inside_figure(
        padding in 0.1f64..100.0,
        width in 200u32..2000,
        height in 200u32..2000,
        corner in 0usize..4
    ) {
        let position = [
            LegendPosition::UpperRight,
            LegendPosition::LowerRight,
            LegendPosition::UpperLeft,
            LegendPosition::LowerLeft,
        ][corner];
        let mut figure = ExtendedFigure::with_layout(json!({"width": width, "height": height}))
            .expect("figure");
        figure
            .set_legend(Some(position), LegendOptions::default().with_padding(padding))
            .expect("legend");

        let layout = figure.layout();
        for key in ["x", "y"] {
            let value = layout["legend"][key].as_f64().expect("coordinate");
            prop_assert!(value > 0.0 && value < 1.0);
        }
    }

    #[test]
    fn heatmap_edges_start_at_origin(
        rows in 1usize..6,
        cols in 1usize..6,
        x0 in -100.0f64..100.0,
        y0 in -100.0f64..100.0,
        dx in 0.1f64..10.0,
        dy in 0.1f64..10.0
    ) {
        let z: Vec<Vec<f64>> = (0..rows).map(|r| (0..cols).map(|c| (r * c) as f64).collect()).collect();
        let traces = make_heatmap(json!({"z": z, "origin": [x0, y0], "dx": dx, "dy": dy}))
            .expect("heatmap");

        let xs = traces[0].numeric_values("x");
        let ys = traces[0].numeric_values("y");
        prop_assert_eq!(xs.len(), rows + 1);
        prop_assert_eq!(ys.len(), cols + 1);
        prop_assert_eq!(xs[0], x0);
        prop_assert_eq!(ys[0], y0);
    }
}
