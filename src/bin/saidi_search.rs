//! Command-line entry point for the SAIDI parameter search.
//!
//! Without `--order` or `--preset` the whole grid is searched. With either,
//! that single configuration is scored and used for the predictions.
//!
//! Exit codes: 0 on completion, 130 when cancelled, 1 on any error.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{error, info};
use saidi_forecast::models::ModelSpec;
use saidi_forecast::pipeline::{
    AnalysisPipeline, AnalysisReport, FixedOrderReport, MonthlyPrediction,
};
use saidi_forecast::search::{
    CancellationController, FileBridge, FileCancellation, FileProgressSink, NullProgressSink,
    ParameterGrid, PresetKind, ProgressReporter, ProgressSink, SearchConfig,
    DEFAULT_BRIDGE_PATH, DEFAULT_FALLBACK_PERIOD,
};
use saidi_forecast::SearchError;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "saidi-search")]
#[command(version, about = "SARIMAX parameter search for monthly SAIDI series", long_about = None)]
struct Cli {
    /// CSV file with a date column and a SAIDI column
    #[arg(long)]
    file: PathBuf,

    /// Progress document to publish; also enables the cancel file next to it
    #[arg(long)]
    progress: Option<PathBuf>,

    /// Where to hand the final top models to the preset selector
    #[arg(long, default_value = DEFAULT_BRIDGE_PATH)]
    bridge: PathBuf,

    /// Skip the preset bridge handoff
    #[arg(long)]
    no_bridge: bool,

    /// Exclusive upper bound for p
    #[arg(long, default_value_t = 5)]
    p_max: usize,

    /// Exclusive upper bound for d
    #[arg(long, default_value_t = 4)]
    d_max: usize,

    /// Exclusive upper bound for q
    #[arg(long, default_value_t = 4)]
    q_max: usize,

    /// Exclusive upper bound for seasonal P
    #[arg(long, default_value_t = 5)]
    sp_max: usize,

    /// Exclusive upper bound for seasonal D
    #[arg(long, default_value_t = 4)]
    sd_max: usize,

    /// Exclusive upper bound for seasonal Q
    #[arg(long, default_value_t = 4)]
    sq_max: usize,

    /// Smallest seasonal period
    #[arg(long, default_value_t = 8)]
    s_min: usize,

    /// Exclusive upper bound for the seasonal period
    #[arg(long, default_value_t = 16)]
    s_max: usize,

    /// Seasonal period of the fallback automatic search
    #[arg(long, default_value_t = DEFAULT_FALLBACK_PERIOD)]
    fallback_period: usize,

    /// Skip the search and use this non-seasonal order
    #[arg(
        long,
        num_args = 3,
        value_names = ["P", "D", "Q"],
        requires = "seasonal_order",
        conflicts_with = "preset"
    )]
    order: Option<Vec<usize>>,

    /// Seasonal order used with --order
    #[arg(long, num_args = 4, value_names = ["SP", "SD", "SQ", "S"], requires = "order")]
    seasonal_order: Option<Vec<usize>>,

    /// Skip the search and use a preset stored by an earlier search
    #[arg(long, value_enum)]
    preset: Option<PresetArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresetArg {
    Conservative,
    TrendOnly,
    Aggressive,
}

impl From<PresetArg> for PresetKind {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Conservative => PresetKind::Conservative,
            PresetArg::TrendOnly => PresetKind::TrendOnly,
            PresetArg::Aggressive => PresetKind::Aggressive,
        }
    }
}

enum Report {
    Search(AnalysisReport),
    FixedOrder(FixedOrderReport),
}

impl Cli {
    fn search_config(&self) -> SearchConfig {
        let grid = ParameterGrid::default()
            .with_order(0..self.p_max, 0..self.d_max, 0..self.q_max)
            .with_seasonal_order(0..self.sp_max, 0..self.sd_max, 0..self.sq_max)
            .with_periods(self.s_min..self.s_max);
        SearchConfig::default()
            .with_grid(grid)
            .with_fallback_period(self.fallback_period)
    }

    /// The configuration given by `--order`/`--seasonal-order` or
    /// `--preset`, if any.
    fn fixed_spec(&self) -> anyhow::Result<Option<ModelSpec>> {
        if let (Some(order), Some(seasonal_order)) = (&self.order, &self.seasonal_order) {
            let order: [usize; 3] = order
                .as_slice()
                .try_into()
                .context("--order takes three values")?;
            let seasonal_order: [usize; 4] = seasonal_order
                .as_slice()
                .try_into()
                .context("--seasonal-order takes four values")?;
            return Ok(Some(ModelSpec::from_arrays(order, seasonal_order)));
        }
        let Some(preset) = self.preset else {
            return Ok(None);
        };
        let kind = PresetKind::from(preset);
        let preset = FileBridge::new(&self.bridge)
            .preset(kind)?
            .with_context(|| {
                format!(
                    "{} holds no {kind} preset, run a search first",
                    self.bridge.display()
                )
            })?;
        info!("{kind} preset: {}", preset.description);
        Ok(Some(preset.spec()))
    }
}

fn init_logging() {
    env_logger::Builder::new()
        .filter(None, log::LevelFilter::Warn)
        .filter(Some("saidi_forecast"), log::LevelFilter::Info)
        .filter(Some("saidi_search"), log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> anyhow::Result<Report> {
    let mut cancel = CancellationController::new();
    let sink: Box<dyn ProgressSink> = match &cli.progress {
        Some(path) => {
            cancel = cancel.with_source(FileCancellation::for_progress(path));
            let sink = FileProgressSink::create(path)
                .with_context(|| format!("progress file {} is not writable", path.display()))?;
            Box::new(sink)
        }
        None => Box::new(NullProgressSink),
    };
    cancel
        .install_signal_handlers()
        .context("failed to install signal handlers")?;

    let mut reporter = ProgressReporter::new(sink, cancel);
    let spec = match cli.fixed_spec() {
        Ok(spec) => spec,
        Err(err) => {
            reporter.publish_error(&format!("{err:#}"));
            return Err(err);
        }
    };
    if let Some(spec) = spec {
        info!("using fixed configuration {spec}");
        let report = AnalysisPipeline::run_with_spec(&cli.file, spec, reporter)?;
        return Ok(Report::FixedOrder(report));
    }

    let mut pipeline = AnalysisPipeline::new(cli.search_config());
    if !cli.no_bridge {
        pipeline = pipeline.with_bridge(FileBridge::new(&cli.bridge));
    }
    Ok(Report::Search(pipeline.run(&cli.file, reporter)?))
}

fn print_predictions(predictions: &[MonthlyPrediction]) {
    for p in predictions {
        println!(
            "{}\t{:.4}\t[{:.4}, {:.4}]",
            p.timestamp.format("%Y-%m-%d"),
            p.value,
            p.lower,
            p.upper
        );
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(Report::Search(AnalysisReport::NothingToPredict { observations })) => {
            println!("No missing months to predict ({observations} observations)");
            ExitCode::SUCCESS
        }
        Ok(Report::Search(AnalysisReport::Forecast {
            outcome,
            predictions,
        })) => {
            println!("Final model: {}", outcome.spec);
            for (rank, model) in outcome.top_models.iter().enumerate() {
                println!(
                    "  #{} {} precision={:.1}%",
                    rank + 1,
                    model.spec,
                    model.scorecard.precision_final()
                );
            }
            print_predictions(&predictions);
            ExitCode::SUCCESS
        }
        Ok(Report::FixedOrder(report)) => {
            println!("Model: {}", report.spec);
            match (&report.scorecard, report.grade()) {
                (Some(card), Some(grade)) => println!(
                    "  rmse={:.4} mae={:.4} mape={:.1}% r2={:.3} precision={:.1}% ({grade}: {})",
                    card.rmse,
                    card.mae,
                    card.mape,
                    card.r2,
                    card.precision_final(),
                    grade.description()
                ),
                _ => println!("  validation metrics unavailable"),
            }
            if report.extended {
                println!("No missing months; predicting past the history");
            }
            print_predictions(&report.predictions);
            ExitCode::SUCCESS
        }
        Err(err) => match err.downcast_ref::<SearchError>() {
            Some(search_err) if search_err.is_cancelled() => {
                info!("search cancelled");
                ExitCode::from(SearchError::CANCELLED_EXIT_CODE)
            }
            Some(search_err) => {
                error!("{search_err}");
                ExitCode::from(search_err.exit_code())
            }
            None => {
                error!("{err:#}");
                ExitCode::from(SearchError::FAILURE_EXIT_CODE)
            }
        },
    }
}
