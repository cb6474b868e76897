use std::fmt::Display;
use std::path::Path;

use chrono::{TimeZone, Utc};
use plotters::prelude::*;
use tracing::info;

use crate::report::PlotSeries;
use crate::shared::{HegeError, Result};

pub const PLOT_SIZE: (u32, u32) = (800, 300);
pub const Y_MAX: f64 = 1.05;
const SECONDS_PER_DAY: i64 = 86_400;

/// ISO 3166 short name for an alpha-2 code.
pub fn country_name(country_code: &str) -> Result<&'static str> {
    isocountry::CountryCode::for_alpha2(&country_code.to_uppercase())
        .map(|code| code.name())
        .map_err(|_| HegeError::Argument(format!("unknown country code '{}'", country_code)))
}

fn plot_error<E: Display>(err: E) -> HegeError {
    HegeError::Plot(err.to_string())
}

fn format_tick(timestamp: i64) -> String {
    match Utc.timestamp_opt(timestamp, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => timestamp.to_string(),
    }
}

/// Draw one line per AS over time and save the chart as SVG.
pub fn render_svg(series: &PlotSeries, country_code: &str, path: &Path) -> Result<()> {
    let title = format!("AS dependency of {}", country_name(country_code)?);
    let (first, last) = series
        .time_bounds()
        .ok_or_else(|| HegeError::NoData("nothing to plot".to_string()))?;

    let x_start = first.timestamp();
    // a single instant still needs a non-empty axis
    let x_end = last.timestamp().max(x_start + SECONDS_PER_DAY);

    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&title, ("sans-serif", 18).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(45)
        .build_cartesian_2d(x_start..x_end, 0f64..Y_MAX)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_labels(6)
        .x_label_formatter(&|ts: &i64| format_tick(*ts))
        .y_desc("hegemony")
        .draw()
        .map_err(plot_error)?;

    for (idx, (asn, points)) in series.series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        chart
            .draw_series(LineSeries::new(
                points.iter().map(|&(time, score)| (time.timestamp(), score)),
                color.stroke_width(2),
            ))
            .map_err(plot_error)?
            .label(format!("AS{}", asn))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    info!(path = %path.display(), lines = series.len(), "plot saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_names() {
        assert_eq!(country_name("JP").unwrap(), "Japan");
        assert_eq!(country_name("jp").unwrap(), "Japan");
        assert!(country_name("ZZ").is_err());
    }

    #[test]
    fn tick_labels_are_dates() {
        assert_eq!(format_tick(1_704_067_200), "2024-01-01");
    }
}
