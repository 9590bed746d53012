use crate::fetch::FetchOutcome;
use crate::figure::{Axis, Domain, Figure, Layout, PieTrace, ScatterTrace, Title, Trace};
use crate::models::{Sex, SummaryCard};
use crate::smoothing::SavitzkyGolay;
use crate::table::{BreakdownTable, TimeSeriesTable};
use serde::Serialize;

/// Early points are partial reporting; the x-axis starts here once the
/// series is long enough to have them.
pub const DISPLAY_OFFSET: usize = 60;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Panel {
    Ready { figure: Figure },
    Empty { reason: String },
    Failed { reason: String },
}

impl Panel {
    pub fn empty(reason: impl Into<String>) -> Self {
        Panel::Empty {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Panel::Failed {
            reason: reason.into(),
        }
    }

    pub fn figure(&self) -> Option<&Figure> {
        match self {
            Panel::Ready { figure } => Some(figure),
            _ => None,
        }
    }

    /// Turns a fetch result into a panel, building the chart only from data.
    pub fn from_outcome<T>(
        outcome: &FetchOutcome<T>,
        what: &str,
        build: impl FnOnce(&T) -> Panel,
    ) -> Self {
        match outcome {
            FetchOutcome::Data(value) => build(value),
            FetchOutcome::Empty => Panel::empty(format!("No {what} data was returned")),
            FetchOutcome::Failed(err) => Panel::failed(format!("Could not load {what}: {err}")),
        }
    }
}

/// Change between the last two values, `None` unless both are present.
pub fn day_delta(values: &[Option<i64>]) -> Option<i64> {
    match values {
        [.., Some(previous), Some(last)] => Some(last - previous),
        _ => None,
    }
}

pub fn format_delta(delta: i64) -> String {
    if delta > 0 {
        format!("+{delta}")
    } else {
        delta.to_string()
    }
}

pub fn delta_annotation(values: &[Option<i64>]) -> Option<String> {
    day_delta(values).map(|delta| format!("({})", format_delta(delta)))
}

/// Index of the first displayed point; the whole series is shown when it
/// is too short to skip the early window.
pub fn display_start(len: usize) -> usize {
    if len > DISPLAY_OFFSET {
        DISPLAY_OFFSET
    } else {
        0
    }
}

fn as_f64(values: &[Option<i64>]) -> Vec<Option<f64>> {
    values.iter().map(|v| v.map(|v| v as f64)).collect()
}

fn line(name: &str, x: &[String], y: Vec<Option<f64>>, yaxis: Option<&'static str>) -> Trace {
    Trace::Scatter(ScatterTrace {
        name: name.to_string(),
        mode: "lines",
        x: x.to_vec(),
        y,
        yaxis,
    })
}

/// Daily cases and deaths with their smoothed trends; deaths on a
/// secondary axis.
pub fn case_timeline(table: &TimeSeriesTable, area_label: &str) -> Panel {
    if table.is_empty() {
        return Panel::empty("No case data was returned");
    }

    let filter = SavitzkyGolay::trend();
    let cases = as_f64(&table.cases);
    let deaths = as_f64(&table.deaths);
    let case_trend = filter.smooth_with_gaps(&cases);
    let death_trend = filter.smooth_with_gaps(&deaths);

    let mut title = format!("Number of COVID-19 Cases within {area_label}");
    if let Some(annotation) = delta_annotation(&table.cases) {
        title.push(' ');
        title.push_str(&annotation);
    }

    let start = table.dates[display_start(table.len())].clone();
    let end = table.dates[table.len() - 1].clone();

    let figure = Figure {
        data: vec![
            line("Raw Data", &table.dates, cases, None),
            line("7 Day Case Average", &table.dates, case_trend, None),
            line("Deaths", &table.dates, deaths, Some("y2")),
            line("7 Day Death Average", &table.dates, death_trend, Some("y2")),
        ],
        layout: Layout {
            title: Some(Title::centred(title)),
            xaxis: Some(Axis {
                title: Some(Title::new("Time")),
                range: Some([start, end]),
                ..Axis::default()
            }),
            yaxis: Some(Axis {
                title: Some(Title::new("Number of Cases")),
                ..Axis::default()
            }),
            yaxis2: Some(Axis {
                title: Some(Title::new("Number of Deaths")),
                overlaying: Some("y"),
                side: Some("right"),
                ..Axis::default()
            }),
            ..Layout::default()
        },
        frames: Vec::new(),
    };
    Panel::Ready { figure }
}

/// One donut per sex of case counts by age band.
pub fn sex_breakdown_pies(table: &BreakdownTable) -> Panel {
    if table.is_empty() {
        return Panel::empty("No age breakdown was returned");
    }

    let slots = [(Sex::Female, [0.0, 0.48]), (Sex::Male, [0.52, 1.0])];
    let data = slots
        .into_iter()
        .map(|(sex, x)| {
            let columns = table.columns(sex);
            Trace::Pie(PieTrace {
                name: sex.title().to_string(),
                labels: columns.ages.clone(),
                values: columns.values.clone(),
                hole: 0.3,
                title: Title::new(sex.title()),
                domain: Domain { x, y: [0.0, 1.0] },
            })
        })
        .collect();

    Panel::Ready {
        figure: Figure {
            data,
            layout: Layout {
                title: Some(Title::centred("Female and Male case numbers by age category")),
                ..Layout::default()
            },
            frames: Vec::new(),
        },
    }
}

/// Headline numbers for the newest day in the series.
pub fn summary_cards(table: &TimeSeriesTable) -> Vec<SummaryCard> {
    let Some(date) = table.last_date() else {
        return Vec::new();
    };

    let card = |id: &str, title: &str, column: &[Option<i64>]| {
        let value = column
            .last()
            .copied()
            .flatten()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        let change = delta_annotation(column)
            .map(|annotation| format!(" {annotation} on the previous day"))
            .unwrap_or_default();
        SummaryCard {
            id: id.to_string(),
            title: title.to_string(),
            value,
            description: format!("Reported {date}{change}"),
        }
    };

    vec![
        card("cases", "New cases", &table.cases),
        card("deaths", "New deaths", &table.deaths),
    ]
}
