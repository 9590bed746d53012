use crate::charts::{Panel, case_timeline, sex_breakdown_pies, summary_cards};
use crate::errors::GeoError;
use crate::fetch::{ApiQuery, DataSource, FetchOutcome, fetch_records};
use crate::geo::GeoReference;
use crate::maps::{ANIMATION_DAYS, animated_region_map, region_map};
use crate::models::{BreakdownRecord, Observation, SummaryCard};
use crate::table::{BreakdownTable, RecentTable, RegionTable, TimeSeriesTable};
use chrono::{Duration, NaiveDate};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub const RECENT_ROWS: usize = 10;

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub area_name: String,
    pub as_of: NaiveDate,
}

/// Everything the page shows, built once at startup.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub caption: String,
    pub as_of: String,
    pub cards: Vec<SummaryCard>,
    pub timeline: Panel,
    pub recent: RecentTable,
    pub pies: Panel,
    pub region_map: Panel,
    pub animated_map: Panel,
}

/// Days of the animation window, oldest first, ending on `as_of`.
pub fn animation_dates(as_of: NaiveDate) -> Vec<NaiveDate> {
    (0..ANIMATION_DAYS)
        .rev()
        .map(|back| as_of - Duration::days(i64::from(back)))
        .collect()
}

async fn fetch_regional<S: DataSource>(
    source: &S,
    dates: &[NaiveDate],
) -> BTreeMap<NaiveDate, FetchOutcome<Vec<Observation>>> {
    let mut pending: FuturesUnordered<_> = dates
        .iter()
        .map(|&date| async move {
            let query = ApiQuery::regional_cases(date);
            (date, fetch_records(source, &query).await)
        })
        .collect();

    let mut by_date = BTreeMap::new();
    while let Some((date, outcome)) = pending.next().await {
        by_date.insert(date, outcome);
    }
    by_date
}

pub async fn build_dashboard<S: DataSource>(
    source: &S,
    geo: Result<GeoReference, GeoError>,
    options: &BuildOptions,
) -> Dashboard {
    let dates = animation_dates(options.as_of);
    let series_query = ApiQuery::nation_series(&options.area_name);
    let breakdown_query = ApiQuery::sex_breakdown(&options.area_name);

    let (series, breakdown, regional) = tokio::join!(
        fetch_records::<_, Observation>(source, &series_query),
        fetch_records::<_, BreakdownRecord>(source, &breakdown_query),
        fetch_regional(source, &dates),
    );

    let area_label = area_label(&options.area_name);
    let series = series.map(TimeSeriesTable::from_records);
    let breakdown = breakdown.map(|records| BreakdownTable::from_records(&records));

    let timeline = Panel::from_outcome(&series, "case", |table| case_timeline(table, &area_label));
    let recent = series
        .data()
        .map(|table| table.recent(RECENT_ROWS))
        .unwrap_or_default();
    let cards = series.data().map(summary_cards).unwrap_or_default();
    let pies = Panel::from_outcome(&breakdown, "age breakdown", sex_breakdown_pies);

    let regional: BTreeMap<NaiveDate, FetchOutcome<RegionTable>> = regional
        .into_iter()
        .map(|(date, outcome)| {
            let label = date.format("%Y-%m-%d").to_string();
            (date, outcome.map(|records| RegionTable::from_records(label, records)))
        })
        .collect();

    let (region_panel, animated_panel) = match geo {
        Ok(geo) => {
            let missing = FetchOutcome::Empty;
            let today = regional.get(&options.as_of).unwrap_or(&missing);
            let region_panel =
                Panel::from_outcome(today, "regional", |table| region_map(table, &geo));

            if let Some(table) = today.data() {
                let unmatched = geo.unmatched(&table.areas);
                if !unmatched.is_empty() {
                    warn!(
                        "{} of {} regional rows match no boundary feature",
                        unmatched.len(),
                        table.areas.len()
                    );
                }
            }

            let failed = regional
                .values()
                .filter(|outcome| matches!(outcome, FetchOutcome::Failed(_)))
                .count();
            if failed > 0 {
                warn!("{failed} of {} animation days failed to load", dates.len());
            }
            let days: Vec<RegionTable> = regional
                .into_values()
                .filter_map(|outcome| match outcome {
                    FetchOutcome::Data(table) => Some(table),
                    _ => None,
                })
                .collect();
            let animated_panel = if failed > 0 && days.iter().all(RegionTable::is_empty) {
                Panel::failed(format!(
                    "Could not load regional data: {failed} of {} days failed",
                    dates.len()
                ))
            } else {
                animated_region_map(&days, &geo)
            };
            (region_panel, animated_panel)
        }
        Err(err) => {
            warn!("maps disabled: {err}");
            let reason = format!("Boundary file unavailable: {err}");
            (Panel::failed(reason.clone()), Panel::failed(reason))
        }
    };

    let dashboard = Dashboard {
        title: "COVID-19 Dashboard".to_string(),
        caption: "Data obtained using the GOV UK API".to_string(),
        as_of: options.as_of.format("%Y-%m-%d").to_string(),
        cards,
        timeline,
        recent,
        pies,
        region_map: region_panel,
        animated_map: animated_panel,
    };
    info!(
        "dashboard built: timeline={} pies={} map={} animation={}",
        status(&dashboard.timeline),
        status(&dashboard.pies),
        status(&dashboard.region_map),
        status(&dashboard.animated_map),
    );
    dashboard
}

fn status(panel: &Panel) -> &'static str {
    match panel {
        Panel::Ready { .. } => "ready",
        Panel::Empty { .. } => "empty",
        Panel::Failed { .. } => "failed",
    }
}

fn area_label(area_name: &str) -> String {
    let mut chars = area_name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
