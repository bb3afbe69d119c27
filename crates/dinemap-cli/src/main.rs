//! `dinemap`: drive the restaurant dashboard from a terminal

mod cli;
mod headless;

use anyhow::{Context, Result};
use clap::ArgMatches;
use dinemap_core::{Bounds, CategoryField, DashboardConfig};
use dinemap_engine::{load_options, Dashboard, StatPanel, Surfaces};
use dinemap_query::{HttpQueryService, SparqlQueries};
use headless::{chart_text, marker_table, ArgControls, HeadlessMap, PanelCollector};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::command().get_matches();
    init_tracing(matches.get_one::<String>("log-level").map(String::as_str));

    let config = load_config(&matches)?;
    tracing::debug!(endpoint = %config.endpoint, "configuration loaded");

    match matches.subcommand() {
        Some(("show", args)) => show(config, args).await,
        Some(("stats", args)) => stats(config, args.get_flag("json")).await,
        Some(("options", args)) => {
            let field = args
                .get_one::<CategoryField>("selector")
                .copied()
                .context("selector is required")?;
            options(config, field, args.get_flag("json")).await
        }
        _ => Ok(()),
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<DashboardConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => DashboardConfig::default(),
    };
    if let Some(endpoint) = matches.get_one::<String>("endpoint") {
        config = config.with_endpoint(endpoint);
    }
    if let Some(graph) = matches.get_one::<String>("graph") {
        config = config.with_named_graph(graph);
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn build_dashboard(
    config: DashboardConfig,
    viewport: Option<Bounds>,
) -> Result<(Dashboard, Arc<ArgControls>, Arc<PanelCollector>)> {
    let service = HttpQueryService::new(&config.endpoint)
        .with_context(|| format!("cannot use endpoint {}", config.endpoint))?;
    let controls = Arc::new(ArgControls::default());
    let charts = Arc::new(PanelCollector::default());
    let surfaces = Surfaces::new(
        Arc::new(HeadlessMap::new(viewport)),
        charts.clone(),
        controls.clone(),
    );
    Ok((Dashboard::new(config, Arc::new(service), surfaces), controls, charts))
}

async fn show(config: DashboardConfig, args: &ArgMatches) -> Result<()> {
    let filter = cli::filter_from_args(args);
    let viewport = args.get_one::<Bounds>("bbox").copied();
    let (dashboard, controls, _) = build_dashboard(config, viewport)?;

    controls.set(filter);
    let (load, outcome) = dashboard
        .load_records()
        .await
        .context("failed to load restaurants")?;
    if !load.skipped.is_empty() {
        tracing::warn!(skipped = load.skipped.len(), "some restaurant rows were malformed");
    }
    tracing::info!(?outcome, "filters applied");

    let markers = dashboard.visible_markers();
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&markers)?);
    } else {
        print!("{}", marker_table(&markers));
    }
    Ok(())
}

async fn stats(config: DashboardConfig, json: bool) -> Result<()> {
    let (dashboard, _, charts) = build_dashboard(config, None)?;
    let report = dashboard.load_statistics().await;

    let panels = charts.panels();
    if json {
        let named: Vec<_> = StatPanel::ALL
            .into_iter()
            .map(|p| (p, panels.get(&p)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&named)?);
    } else {
        for panel in StatPanel::ALL {
            match panels.get(&panel) {
                Some(chart) => println!("{}", chart_text(panel.title(), chart)),
                None => println!("{}\n  unavailable\n", panel.title()),
            }
        }
    }

    if report.loaded.is_empty() {
        anyhow::bail!("no statistics panel could be loaded");
    }
    Ok(())
}

async fn options(config: DashboardConfig, field: CategoryField, json: bool) -> Result<()> {
    let service = HttpQueryService::new(&config.endpoint)
        .with_context(|| format!("cannot use endpoint {}", config.endpoint))?;
    let queries = SparqlQueries::from_config(&config);
    let options = load_options(field, &service, &queries)
        .await
        .with_context(|| format!("failed to load {} options", field.name()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&options)?);
    } else {
        for option in &options {
            println!("{}", option.label);
        }
    }
    Ok(())
}
