use axum::{Json, Router, extract::Query, http::StatusCode, response::IntoResponse, routing::get};
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

const AS_OF: &str = "2021-01-31";
const BROKEN_DAY: &str = "2021-01-15";

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_path(name: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("covid_dashboard_{}_{}_{name}", std::process::id(), nanos));
    path
}

fn write_boundaries() -> String {
    let path = unique_path("geo.json");
    let geojson = json!({
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"lad15nm": "Leeds"}, "geometry": null},
            {"type": "Feature", "properties": {"lad15nm": "York"}, "geometry": null}
        ]
    });
    std::fs::write(&path, geojson.to_string()).expect("write geojson");
    path.to_string_lossy().to_string()
}

async fn stub_data(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let filters = params.get("filters").cloned().unwrap_or_default();
    let structure = params.get("structure").cloned().unwrap_or_default();

    if structure.contains("maleCases") {
        return Json(json!({"data": [{
            "female": [{"age": "0_to_4", "rate": 1.0, "value": 40}, {"age": "5_to_9", "rate": 2.0, "value": 60}],
            "male": [{"age": "0_to_4", "rate": 1.5, "value": 50}]
        }]}))
        .into_response();
    }

    if filters.contains("areaType=ltla") {
        let date = filters
            .split(';')
            .find_map(|part| part.strip_prefix("date="))
            .unwrap_or_default()
            .to_string();
        if date == BROKEN_DAY {
            return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
        }
        return Json(json!({"data": [
            {"date": date, "areaName": "Leeds", "newCases": 120},
            {"date": date, "areaName": "York", "newCases": 45}
        ]}))
        .into_response();
    }

    let data: Vec<Value> = (0..90)
        .map(|back| {
            let date = chrono::NaiveDate::from_ymd_opt(2021, 1, 31).unwrap()
                - chrono::Duration::days(back);
            json!({"date": date.to_string(), "newCases": 1000 - back, "newDeaths": 10})
        })
        .collect();
    Json(json!({ "data": data })).into_response()
}

async fn spawn_stub_api() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub api");
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/v1/data", get(stub_data));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/v1/data")
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/dashboard")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server(api_base: &str, geojson_path: &str) -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_covid_dashboard"))
        .env("PORT", port.to_string())
        .env("COVID_API_BASE", api_base)
        .env("GEOJSON_PATH", geojson_path)
        .env("DASHBOARD_DATE", AS_OF)
        .env("FETCH_TIMEOUT_SECS", "2")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let api_base = spawn_stub_api().await;
    let server = Arc::new(spawn_server(&api_base, &write_boundaries()).await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn snapshot(base_url: &str) -> Value {
    Client::new()
        .get(format!("{base_url}/api/dashboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_snapshot_contains_every_chart() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let dashboard = snapshot(&server.base_url).await;

    assert_eq!(dashboard["as_of"], AS_OF);
    for panel in ["timeline", "pies", "region_map", "animated_map"] {
        assert_eq!(dashboard[panel]["status"], "ready", "{panel}");
    }

    let timeline = &dashboard["timeline"]["figure"];
    assert_eq!(timeline["data"].as_array().unwrap().len(), 4);
    assert_eq!(timeline["layout"]["xaxis"]["range"][0], "2021-01-02");
    assert_eq!(timeline["layout"]["xaxis"]["range"][1], AS_OF);
    assert!(
        timeline["layout"]["title"]["text"]
            .as_str()
            .unwrap()
            .ends_with("(+1)")
    );

    let frames = dashboard["animated_map"]["figure"]["frames"].as_array().unwrap();
    assert_eq!(frames.len(), 30);
    assert!(frames.iter().all(|frame| frame["name"] != BROKEN_DAY));

    assert_eq!(dashboard["recent"]["header"].as_array().unwrap().len(), 10);
    assert_eq!(dashboard["cards"][0]["value"], "1000");
}

#[tokio::test]
async fn http_index_renders_page() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let response = Client::new().get(&server.base_url).send().await.unwrap();
    assert!(response.status().is_success());
    let html = response.text().await.unwrap();

    assert!(html.contains("<h1>COVID-19 Dashboard</h1>"));
    assert!(html.contains("Data obtained using the GOV UK API"));
    assert!(html.contains(r#"<div class="graph" id="timeline"></div>"#));
    assert!(html.contains(r#"<div class="graph" id="animated_map"></div>"#));
    assert!(html.contains("<th>Number of Cases</th>"));
}

#[tokio::test]
async fn http_unreachable_api_still_serves_placeholders() {
    let _guard = TEST_LOCK.lock().await;
    let dead_api = format!("http://127.0.0.1:{}/v1/data", pick_free_port());
    let missing_geo = unique_path("missing.json").to_string_lossy().to_string();
    let server = spawn_server(&dead_api, &missing_geo).await;

    let dashboard = snapshot(&server.base_url).await;
    for panel in ["timeline", "pies", "region_map", "animated_map"] {
        assert_eq!(dashboard[panel]["status"], "failed", "{panel}");
    }
    assert!(dashboard["cards"].as_array().unwrap().is_empty());

    let html = Client::new()
        .get(&server.base_url)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains(r#"class="placeholder failed" id="timeline""#));
}
