use std::{
    convert::Infallible,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    sync::Once,
};

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use log::{error, info};

pub const DEFAULT_METRICS_PORT: u16 = 8876;

lazy_static::lazy_static! {
    static ref REGISTRY: Registry = Registry::new();

    // Latest committed height
    pub static ref GALA_BLOCK_HEIGHT: IntGauge = IntGauge::new(
        "gala_block_height",
        "Latest committed block height"
    ).unwrap();

    // Block processing time in seconds
    pub static ref GALA_BLOCK_PROCESSING_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "gala_block_processing_seconds",
            "Time taken to execute and commit a block in seconds"
        ).buckets(vec![
            0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500,
            1.000, 2.500, 5.000, 10.000
        ]),
    ).unwrap();

    // Upgrades applied, by plan name
    pub static ref GALA_UPGRADES_APPLIED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "gala_upgrades_applied_total",
            "Total number of upgrade plans applied, labelled by name"
        ),
        &["name"]
    ).unwrap();

    // Upgrade handler failures
    pub static ref GALA_UPGRADE_FAILURES_TOTAL: IntCounter = IntCounter::new(
        "gala_upgrade_failures_total",
        "Total number of failed upgrade handlers"
    ).unwrap();

    // Inflation firings, by outcome
    pub static ref GALA_INFLATION_EPOCHS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "gala_inflation_epochs_total",
            "Total number of inflation epoch firings, labelled by outcome"
        ),
        &["outcome"]
    ).unwrap();

    // Skipped inflation transfers
    pub static ref GALA_INFLATION_TRANSFER_FAILURES_TOTAL: IntCounter = IntCounter::new(
        "gala_inflation_transfer_failures_total",
        "Total number of inflation transfers skipped after an error"
    ).unwrap();

    pub static ref GALA_INFLATION_PERIOD: IntGauge = IntGauge::new(
        "gala_inflation_period",
        "Current inflation period"
    ).unwrap();

    pub static ref GALA_INFLATION_LAST_MINTED: IntGauge = IntGauge::new(
        "gala_inflation_last_minted",
        "Amount minted at the last inflation epoch"
    ).unwrap();
}

/// Adds every collector to the registry. Safe to call more than once.
pub fn register_metrics() {
    static REGISTER: Once = Once::new();
    REGISTER.call_once(|| {
        macro_rules! register {
            ($collector:ident) => {
                REGISTRY
                    .register(Box::new($collector.clone()))
                    .expect("collector can't be registered");
            };
        }

        register!(GALA_BLOCK_HEIGHT);
        register!(GALA_BLOCK_PROCESSING_SECONDS);
        register!(GALA_UPGRADES_APPLIED_TOTAL);
        register!(GALA_UPGRADE_FAILURES_TOTAL);
        register!(GALA_INFLATION_EPOCHS_TOTAL);
        register!(GALA_INFLATION_TRANSFER_FAILURES_TOTAL);
        register!(GALA_INFLATION_PERIOD);
        register!(GALA_INFLATION_LAST_MINTED);
    });
}

pub fn gather_metrics() -> String {
    TextEncoder::new()
        .encode_to_string(&REGISTRY.gather())
        .unwrap_or_else(|error| {
            error!("could not encode custom metrics: {error}");
            String::new()
        })
}

fn text_response(status: u16, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = hyper::StatusCode::from_u16(status).unwrap_or(hyper::StatusCode::OK);
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("text/plain"),
    );
    response
}

async fn handle_metrics_request(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    match req.uri().path() {
        "/metrics" => Ok(text_response(200, gather_metrics())),
        _ => Ok(text_response(404, "Not Found".to_string())),
    }
}

/// Serves `/metrics` on all interfaces until the runtime shuts down.
pub async fn run_metrics_server(port: u16) -> anyhow::Result<()> {
    register_metrics();

    let address = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(0, 0, 0, 0), port));
    let listener = TcpListener::bind(address).await?;
    info!("Prometheus server started at http://{address}/metrics");

    loop {
        let (stream, _) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                error!("Prometheus accept failed: {e:?}");
                continue;
            }
        };

        let io = TokioIo::new(stream);
        tokio::spawn(async move {
            let service = service_fn(handle_metrics_request);
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("Prometheus connection failed: {e:?}");
            }
        });
    }
}

pub fn set_block_height(height: u64) {
    GALA_BLOCK_HEIGHT.set(height as i64);
}

pub fn observe_block_processing(duration_secs: f64) {
    GALA_BLOCK_PROCESSING_SECONDS.observe(duration_secs);
}

pub fn inc_upgrades_applied(name: &str) {
    GALA_UPGRADES_APPLIED_TOTAL.with_label_values(&[name]).inc();
}

pub fn inc_upgrade_failures() {
    GALA_UPGRADE_FAILURES_TOTAL.inc();
}

pub fn inc_inflation_epoch(outcome: &str) {
    GALA_INFLATION_EPOCHS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn inc_inflation_transfer_failures() {
    GALA_INFLATION_TRANSFER_FAILURES_TOTAL.inc();
}

pub fn set_inflation_period(period: u64) {
    GALA_INFLATION_PERIOD.set(period as i64);
}

pub fn set_inflation_last_minted(amount: u128) {
    GALA_INFLATION_LAST_MINTED.set(i64::try_from(amount).unwrap_or(i64::MAX));
}
