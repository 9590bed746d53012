use covid_dashboard::fetch::HttpSource;
use covid_dashboard::geo::GeoReference;
use covid_dashboard::{AppState, BuildOptions, Config, build_dashboard, router};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    info!(
        "building dashboard for {} as of {} from {}",
        config.area_name, config.as_of, config.api_base
    );

    let source = HttpSource::new(config.api_base.clone(), config.fetch_timeout)?;
    let geo = GeoReference::load(&config.geojson_path).await;
    if let Ok(geo) = &geo {
        info!("loaded {} boundary features", geo.feature_count());
    }
    let options = BuildOptions {
        area_name: config.area_name.clone(),
        as_of: config.as_of,
    };
    let dashboard = build_dashboard(&source, geo, &options).await;
    let state = AppState::new(dashboard)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
