use crate::charts::Panel;
use crate::figure::{
    AnimationOptions, Button, ChoroplethTrace, ColorBar, CurrentValue, Figure, Frame, FrameTiming,
    LatLon, Layout, Mapbox, Slider, SliderStep, Title, Trace, Transition, UpdateMenu,
};
use crate::geo::{FEATURE_ID_KEY, GeoReference};
use crate::table::RegionTable;
use serde_json::{Value, json};

pub const MAP_CENTER: LatLon = LatLon {
    lat: 51.509865,
    lon: -0.128092,
};
pub const MAP_ZOOM: f64 = 7.0;
pub const MAP_HEIGHT: u32 = 800;
pub const MAP_STYLE: &str = "carto-positron";

/// Trailing window of days the animated map steps through.
pub const ANIMATION_DAYS: u32 = 31;
pub const COLOR_RANGE: (f64, f64) = (0.0, 500.0);
pub const FRAME_DURATION_MS: u32 = 500;
pub const TRANSITION_MS: u32 = 300;
pub const TRANSITION_EASING: &str = "cubic-in-out";

fn mapbox() -> Mapbox {
    Mapbox {
        style: MAP_STYLE,
        center: MAP_CENTER,
        zoom: MAP_ZOOM,
    }
}

fn z_values(table: &RegionTable) -> Vec<Option<f64>> {
    table.cases.iter().map(|v| v.map(|v| v as f64)).collect()
}

fn colorbar() -> Option<ColorBar> {
    Some(ColorBar {
        title: Title::new("Number of Cases"),
    })
}

/// New cases per local authority on one date.
pub fn region_map(table: &RegionTable, geo: &GeoReference) -> Panel {
    if table.is_empty() {
        return Panel::empty(format!("No regional data for {}", table.date));
    }

    let trace = ChoroplethTrace {
        name: table.date.clone(),
        geojson: Some(geo.collection().clone()),
        featureidkey: Some(FEATURE_ID_KEY),
        locations: table.areas.clone(),
        z: z_values(table),
        zmin: None,
        zmax: None,
        colorscale: Some("Viridis"),
        colorbar: colorbar(),
    };

    Panel::Ready {
        figure: Figure {
            data: vec![Trace::Choroplethmapbox(trace)],
            layout: Layout {
                title: Some(Title::centred(format!(
                    "New cases by local authority, {}",
                    table.date
                ))),
                mapbox: Some(mapbox()),
                height: Some(MAP_HEIGHT),
                ..Layout::default()
            },
            frames: Vec::new(),
        },
    }
}

fn frame_trace(table: &RegionTable) -> Trace {
    Trace::Choroplethmapbox(ChoroplethTrace {
        name: table.date.clone(),
        geojson: None,
        featureidkey: None,
        locations: table.areas.clone(),
        z: z_values(table),
        zmin: None,
        zmax: None,
        colorscale: None,
        colorbar: None,
    })
}

fn play_options() -> AnimationOptions {
    AnimationOptions {
        frame: FrameTiming {
            duration: FRAME_DURATION_MS,
            redraw: true,
        },
        transition: Transition {
            duration: TRANSITION_MS,
            easing: Some(TRANSITION_EASING),
        },
        mode: None,
        fromcurrent: Some(true),
    }
}

fn jump_options(duration: u32) -> AnimationOptions {
    AnimationOptions {
        frame: FrameTiming {
            duration,
            redraw: true,
        },
        transition: Transition {
            duration: 0,
            easing: None,
        },
        mode: Some("immediate"),
        fromcurrent: None,
    }
}

/// One frame per day that has data, in the order given. Callers pass the
/// days in ascending date order; days without rows are left out.
pub fn animated_region_map(days: &[RegionTable], geo: &GeoReference) -> Panel {
    let days: Vec<&RegionTable> = days.iter().filter(|day| !day.is_empty()).collect();
    let Some(first) = days.first() else {
        return Panel::empty("No regional data in the animation window");
    };

    let base = ChoroplethTrace {
        name: first.date.clone(),
        geojson: Some(geo.collection().clone()),
        featureidkey: Some(FEATURE_ID_KEY),
        locations: first.areas.clone(),
        z: z_values(first),
        zmin: Some(COLOR_RANGE.0),
        zmax: Some(COLOR_RANGE.1),
        colorscale: Some("Viridis"),
        colorbar: colorbar(),
    };

    let frames: Vec<Frame> = days
        .iter()
        .map(|day| Frame {
            name: day.date.clone(),
            data: vec![frame_trace(day)],
        })
        .collect();

    let steps = frames
        .iter()
        .map(|frame| SliderStep {
            label: frame.name.clone(),
            method: "animate",
            args: (json!([frame.name]), jump_options(FRAME_DURATION_MS)),
        })
        .collect();

    let controls = UpdateMenu {
        kind: "buttons",
        showactive: false,
        buttons: vec![
            Button {
                label: "Play",
                method: "animate",
                args: (Value::Null, play_options()),
            },
            Button {
                label: "Pause",
                method: "animate",
                args: (json!([null]), jump_options(0)),
            },
        ],
    };

    Panel::Ready {
        figure: Figure {
            data: vec![Trace::Choroplethmapbox(base)],
            layout: Layout {
                title: Some(Title::centred(format!(
                    "New cases by local authority, last {ANIMATION_DAYS} days"
                ))),
                mapbox: Some(mapbox()),
                height: Some(MAP_HEIGHT),
                updatemenus: vec![controls],
                sliders: vec![Slider {
                    active: 0,
                    currentvalue: CurrentValue { prefix: "Date: " },
                    steps,
                }],
                ..Layout::default()
            },
            frames,
        },
    }
}
