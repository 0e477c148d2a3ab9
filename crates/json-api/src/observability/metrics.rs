//! Prometheus HTTP metrics and their exposition endpoint.

use std::sync::OnceLock;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use salvo::{
    Request, Response, handler,
    http::{
        StatusCode,
        header::{CONTENT_TYPE, HeaderValue},
    },
};
use tracing::error;

const DURATION_BUCKETS: [f64; 12] = [
    0.002, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug)]
struct HttpMetrics {
    registry: Registry,
    requests: IntCounterVec,
    durations: HistogramVec,
    in_flight: IntGauge,
}

static HTTP_METRICS: OnceLock<Option<HttpMetrics>> = OnceLock::new();

/// Counts a request as in flight until dropped.
#[derive(Debug)]
pub(super) struct InFlight {
    tracked: bool,
}

impl InFlight {
    pub(super) fn start() -> Self {
        let tracked = metrics().inspect(|metrics| metrics.in_flight.inc()).is_some();

        Self { tracked }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.tracked
            && let Some(metrics) = metrics()
        {
            metrics.in_flight.dec();
        }
    }
}

pub(super) fn observe_request(method: &str, route: &str, status: u16, seconds: f64) {
    let Some(metrics) = metrics() else {
        return;
    };

    let status = status.to_string();

    metrics
        .requests
        .with_label_values(&[method, route, status.as_str()])
        .inc();

    metrics
        .durations
        .with_label_values(&[method, route])
        .observe(seconds);
}

/// Prometheus text exposition.
#[handler]
pub(crate) async fn metrics_handler(_req: &mut Request, res: &mut Response) {
    let Some(metrics) = metrics() else {
        res.status_code(StatusCode::SERVICE_UNAVAILABLE);

        return;
    };

    let encoder = TextEncoder::new();
    let mut body = Vec::new();

    if let Err(source) = encoder.encode(&metrics.registry.gather(), &mut body) {
        error!("failed to encode metrics: {source}");
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);

        return;
    }

    match HeaderValue::from_str(encoder.format_type()) {
        Ok(content_type) => {
            res.headers_mut().insert(CONTENT_TYPE, content_type);
        }
        Err(source) => error!("failed to encode metrics content type: {source}"),
    }

    res.render(String::from_utf8_lossy(&body).into_owned());
}

fn metrics() -> Option<&'static HttpMetrics> {
    HTTP_METRICS
        .get_or_init(|| {
            build()
                .inspect_err(|source| error!("failed to register http metrics: {source}"))
                .ok()
        })
        .as_ref()
}

fn build() -> Result<HttpMetrics, prometheus::Error> {
    let registry = Registry::new();

    let requests = IntCounterVec::new(
        Opts::new(
            "spareline_json_http_requests_total",
            "HTTP requests by method, route and status code.",
        ),
        &["method", "route", "status"],
    )?;

    let durations = HistogramVec::new(
        HistogramOpts::new(
            "spareline_json_http_request_duration_seconds",
            "HTTP request duration in seconds by method and route.",
        )
        .buckets(DURATION_BUCKETS.to_vec()),
        &["method", "route"],
    )?;

    let in_flight = IntGauge::with_opts(Opts::new(
        "spareline_json_http_requests_in_flight",
        "HTTP requests currently being served.",
    ))?;

    registry.register(Box::new(requests.clone()))?;
    registry.register(Box::new(durations.clone()))?;
    registry.register(Box::new(in_flight.clone()))?;

    Ok(HttpMetrics {
        registry,
        requests,
        durations,
        in_flight,
    })
}
