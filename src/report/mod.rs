pub mod plot;

use std::collections::BTreeMap;
use std::io::{self, Write};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::aggregator::AggregateResult;
use crate::population::PopulationEstimate;
use crate::shared::ASN;

pub use plot::render_svg;

/// Per-AS score over time, accumulated for the chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotSeries {
    pub series: BTreeMap<ASN, Vec<(DateTime<Utc>, f64)>>,
}

impl PlotSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, asn: ASN, time: DateTime<Utc>, score: f64) {
        self.series.entry(asn).or_insert_with(Vec::new).push((time, score));
    }

    pub fn get(&self, asn: &ASN) -> Option<&[(DateTime<Utc>, f64)]> {
        self.series.get(asn).map(|points| points.as_slice())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Earliest and latest timestamp over every series.
    pub fn time_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let mut times = self.series.values().flatten().map(|&(time, _)| time);
        let first = times.next()?;
        Some(times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }
}

/// `+` for the queried eyeball networks themselves, `-` for everything else.
pub fn label(population: &PopulationEstimate, asn: &ASN) -> char {
    if population.contains(asn) {
        '+'
    } else {
        '-'
    }
}

/// Shortest round-trip form, always with a decimal point.
pub fn format_score(score: f64) -> String {
    format!("{:?}", score)
}

pub fn format_instant(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, false)
}

pub struct ReportRenderer {
    /// Entries printed per instant
    pub top: usize,
    plot: Option<PlotSeries>,
}

impl ReportRenderer {
    pub fn new(top: usize) -> Self {
        ReportRenderer { top, plot: None }
    }

    pub fn with_plotting(mut self, plotting: bool) -> Self {
        self.plot = if plotting { Some(PlotSeries::new()) } else { None };
        self
    }

    pub fn found_networks(&self, out: &mut dyn Write, population: &PopulationEstimate) -> io::Result<()> {
        writeln!(
            out,
            "# Found {} eyeball networks in {}",
            population.len(),
            population.country_code
        )
    }

    pub fn render(
        &mut self,
        out: &mut dyn Write,
        date: DateTime<Utc>,
        population: &PopulationEstimate,
        result: &AggregateResult,
    ) -> io::Result<()> {
        writeln!(out, "# Results for {}", format_instant(date))?;
        for &(asn, score) in result.top(self.top) {
            writeln!(out, "{}, {}, {}", asn, format_score(score), label(population, &asn))?;
            if let Some(plot) = self.plot.as_mut() {
                plot.push(asn, date, score);
            }
        }
        Ok(())
    }

    pub fn no_results(&self, out: &mut dyn Write, date: DateTime<Utc>) -> io::Result<()> {
        writeln!(out, "# No results for {}", format_instant(date))
    }

    pub fn series(&self) -> Option<&PlotSeries> {
        self.plot.as_ref()
    }

    pub fn into_series(self) -> Option<PlotSeries> {
        self.plot
    }
}
