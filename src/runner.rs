use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::aggregator::{compute_hegemony, AggregationOptions};
use crate::date_range::DateRange;
use crate::hegemony::HegemonySource;
use crate::population::PopulationSource;
use crate::report::{plot, render_svg, PlotSeries, ReportRenderer};
use crate::shared::{HegeError, Result};

pub const DEFAULT_TOP: usize = 10;
pub const DEFAULT_MIN_POPULATION: f64 = 0.01;

/// Options of one report run
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    /// ISO 3166 alpha-2 code of the country
    pub country_code: String,

    pub options: AggregationOptions,

    /// Ranked entries printed per instant
    pub top: usize,

    /// Threshold passed to the population estimator
    pub min_population: f64,

    /// Start date as given by the user
    pub start: Option<String>,

    /// End date as given by the user
    pub end: Option<String>,

    /// Where to save the chart, if any
    pub plot: Option<PathBuf>,
}

impl ReportConfig {
    pub fn new(country_code: &str) -> Self {
        ReportConfig {
            country_code: country_code.to_uppercase(),
            options: AggregationOptions::default(),
            top: DEFAULT_TOP,
            min_population: DEFAULT_MIN_POPULATION,
            start: None,
            end: None,
            plot: None,
        }
    }

    pub fn with_options(mut self, options: AggregationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }

    pub fn with_min_population(mut self, min_population: f64) -> Self {
        self.min_population = min_population;
        self
    }

    pub fn with_start(mut self, start: Option<String>) -> Self {
        self.start = start;
        self
    }

    pub fn with_end(mut self, end: Option<String>) -> Self {
        self.end = end;
        self
    }

    pub fn with_plot(mut self, plot: Option<PathBuf>) -> Self {
        self.plot = plot;
        self
    }

    /// Check every option and resolve the date range against `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<DateRange> {
        plot::country_name(&self.country_code)?;

        if self.top == 0 {
            return Err(HegeError::Argument("--top must be at least 1".to_string()));
        }
        if !self.min_population.is_finite() || self.min_population < 0.0 {
            return Err(HegeError::Argument(format!(
                "--min_population must be a non-negative number, got {}",
                self.min_population
            )));
        }
        if let Some(path) = &self.plot {
            match path.extension().and_then(|ext| ext.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("svg") => {}
                _ => {
                    return Err(HegeError::Argument(format!(
                        "plot path {} must end in .svg",
                        path.display()
                    )))
                }
            }
        }

        DateRange::from_args(self.start.as_deref(), self.end.as_deref(), now)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Instants that produced a ranking
    pub instants: usize,

    /// Instants without hegemony data
    pub skipped: Vec<DateTime<Utc>>,

    pub series: Option<PlotSeries>,
}

/// Runs one report against explicitly passed data sources.
pub struct ReportRunner<'a> {
    pub config: ReportConfig,
    pub range: DateRange,
    population_source: &'a dyn PopulationSource,
    hegemony_source: &'a dyn HegemonySource,
}

impl<'a> ReportRunner<'a> {
    pub fn new(
        config: ReportConfig,
        now: DateTime<Utc>,
        population_source: &'a dyn PopulationSource,
        hegemony_source: &'a dyn HegemonySource,
    ) -> Result<Self> {
        let range = config.validate(now)?;
        Ok(ReportRunner {
            config,
            range,
            population_source,
            hegemony_source,
        })
    }

    pub fn run(&self, out: &mut dyn Write) -> Result<RunSummary> {
        let population = self
            .population_source
            .fetch(&self.config.country_code, self.config.min_population)?;
        if population.is_empty() {
            return Err(HegeError::NoData(format!(
                "no eyeball networks found in {} (min population {})",
                self.config.country_code, self.config.min_population
            )));
        }

        let mut renderer =
            ReportRenderer::new(self.config.top).with_plotting(self.config.plot.is_some());
        renderer.found_networks(out, &population)?;

        let total = self.range.len();
        info!(
            instants = total,
            granularity = %self.range.granularity,
            start = %self.range.start,
            end = %self.range.end,
            "walking date range"
        );

        let pb = if total > 1 {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} instants")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );

        let mut summary = RunSummary::default();
        for date in &self.range {
            pb.inc(1);
            match compute_hegemony(self.hegemony_source, &population, date, &self.config.options) {
                Ok(result) => {
                    renderer.render(out, date, &population, &result)?;
                    summary.instants += 1;
                }
                Err(err) if err.is_no_data() && total > 1 => {
                    warn!(%date, %err, "skipping instant");
                    renderer.no_results(out, date)?;
                    summary.skipped.push(date);
                }
                Err(err) => {
                    pb.finish_and_clear();
                    return Err(err);
                }
            }
        }
        pb.finish_and_clear();

        if summary.instants == 0 {
            return Err(HegeError::NoData(format!(
                "no hegemony data between {} and {}",
                self.range.start.date_naive(),
                self.range.end.date_naive()
            )));
        }

        summary.series = renderer.into_series();
        if let (Some(path), Some(series)) = (&self.config.plot, &summary.series) {
            render_svg(series, &self.config.country_code, path)?;
        }

        Ok(summary)
    }
}
