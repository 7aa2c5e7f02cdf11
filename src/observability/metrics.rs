use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

fn status_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "error"
    }
}

/// Prometheus metrics for the foodgram service
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // HTTP metrics
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub http_requests_in_flight: GaugeVec,

    // Business metrics
    pub recipe_operations_total: CounterVec,
    pub user_list_operations_total: CounterVec,
    pub shopping_list_requests_total: CounterVec,
    pub shopping_list_lines: HistogramVec,
    pub shopping_list_duration_seconds: HistogramVec,
}

impl Metrics {
    /// Create a new metrics instance with all required metrics registered
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        info!("Initializing Prometheus metrics");

        let http_requests_total = CounterVec::new(
            Opts::new(
                "http_requests_total",
                "Total number of HTTP requests processed",
            ),
            &["method", "endpoint", "status_code"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "endpoint"],
        )?;

        let http_requests_in_flight = GaugeVec::new(
            Opts::new(
                "http_requests_in_flight",
                "Number of HTTP requests currently being processed",
            ),
            &["method", "endpoint"],
        )?;

        let recipe_operations_total = CounterVec::new(
            Opts::new(
                "recipe_operations_total",
                "Total number of recipe operations",
            ),
            &["operation", "status"],
        )?;

        let user_list_operations_total = CounterVec::new(
            Opts::new(
                "user_list_operations_total",
                "Total number of favorite, shopping cart and subscription operations",
            ),
            &["list", "operation", "status"],
        )?;

        let shopping_list_requests_total = CounterVec::new(
            Opts::new(
                "shopping_list_requests_total",
                "Total number of shopping list builds",
            ),
            &["format", "status"],
        )?;

        let shopping_list_lines = HistogramVec::new(
            HistogramOpts::new(
                "shopping_list_lines",
                "Number of aggregated lines per shopping list",
            )
            .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
            &["format"],
        )?;

        let shopping_list_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "shopping_list_duration_seconds",
                "Time spent building a shopping list",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
            &["format"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(recipe_operations_total.clone()))?;
        registry.register(Box::new(user_list_operations_total.clone()))?;
        registry.register(Box::new(shopping_list_requests_total.clone()))?;
        registry.register(Box::new(shopping_list_lines.clone()))?;
        registry.register(Box::new(shopping_list_duration_seconds.clone()))?;

        info!("Prometheus metrics initialized successfully");

        Ok(Metrics {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            recipe_operations_total,
            user_list_operations_total,
            shopping_list_requests_total,
            shopping_list_lines,
            shopping_list_duration_seconds,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode all metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }

    pub fn record_http_request(
        &self,
        method: &str,
        endpoint: &str,
        status_code: u16,
        duration_seconds: f64,
    ) {
        let status_str = status_code.to_string();

        self.http_requests_total
            .with_label_values(&[method, endpoint, &status_str])
            .inc();

        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration_seconds);
    }

    pub fn record_recipe_operation(&self, operation: &str, success: bool) {
        self.recipe_operations_total
            .with_label_values(&[operation, status_label(success)])
            .inc();
    }

    pub fn record_user_list_operation(&self, list: &str, operation: &str, success: bool) {
        self.user_list_operations_total
            .with_label_values(&[list, operation, status_label(success)])
            .inc();
    }

    /// Record one shopping list build; `lines` is only known on success
    pub fn record_shopping_list(
        &self,
        format: &str,
        lines: Option<usize>,
        duration_seconds: f64,
    ) {
        self.shopping_list_requests_total
            .with_label_values(&[format, status_label(lines.is_some())])
            .inc();

        if let Some(lines) = lines {
            self.shopping_list_lines
                .with_label_values(&[format])
                .observe(lines as f64);
        }

        self.shopping_list_duration_seconds
            .with_label_values(&[format])
            .observe(duration_seconds);
    }

    pub fn increment_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .inc();
    }

    pub fn decrement_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .dec();
    }
}
