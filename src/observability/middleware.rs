use axum::{
    extract::{MatchedPath, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use opentelemetry::trace::TraceContextExt;
use std::{future::Future, sync::Arc, time::Instant};
use tracing::{error, info, instrument, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::Metrics;

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// First hop of X-Forwarded-For, then X-Real-IP
fn client_ip(headers: &HeaderMap) -> String {
    header_value(headers, "x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .or_else(|| header_value(headers, "x-real-ip"))
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

/// Wraps each request in a server span and records HTTP metrics
pub async fn observability_middleware(
    metrics: Arc<Metrics>,
    request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let uri = request.uri().to_string();
    let user_agent = header_value(request.headers(), "user-agent")
        .unwrap_or("unknown")
        .to_string();
    let client_ip = client_ip(request.headers());

    // Route template keeps metric cardinality bounded
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched_path| matched_path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let span_name = format!("{} {}", method, endpoint);
    let span = tracing::info_span!(
        target: "foodgram_rs::http",
        "{}", span_name,
        otel.name = %span_name,
        otel.kind = "server",
        http.method = %method,
        http.route = %endpoint,
        http.url = %uri,
        http.user_agent = %user_agent,
        client.address = %client_ip,
        http.response.status_code = tracing::field::Empty,
        http.response_time_ms = tracing::field::Empty,
    );

    async {
        metrics.increment_in_flight(&method, &endpoint);

        let trace_id = tracing::Span::current()
            .context()
            .span()
            .span_context()
            .trace_id()
            .to_string();

        info!(trace_id = %trace_id, method = %method, path = %endpoint, client_ip = %client_ip, "Processing request");

        let response = next.run(request).await;

        let duration = start_time.elapsed();
        let status_code = response.status().as_u16();

        let current_span = tracing::Span::current();
        current_span.record("http.response.status_code", status_code);
        current_span.record("http.response_time_ms", duration.as_millis() as u64);

        let otel_context = current_span.context();
        if status_code >= 500 {
            otel_context
                .span()
                .set_status(opentelemetry::trace::Status::error("HTTP server error"));
        } else {
            otel_context.span().set_status(opentelemetry::trace::Status::Ok);
        }

        metrics.record_http_request(&method, &endpoint, status_code, duration.as_secs_f64());
        metrics.decrement_in_flight(&method, &endpoint);

        if status_code >= 500 {
            error!(
                trace_id = %trace_id,
                method = %method,
                path = %endpoint,
                status_code,
                duration_ms = duration.as_millis() as u64,
                "Request failed"
            );
        } else {
            info!(
                trace_id = %trace_id,
                method = %method,
                path = %endpoint,
                status_code,
                duration_ms = duration.as_millis() as u64,
                "Request completed"
            );
        }

        response
    }
    .instrument(span)
    .await
}

/// Wraps service operations in spans and records business metrics
pub struct BusinessTracingMiddleware {
    metrics: Arc<Metrics>,
}

impl BusinessTracingMiddleware {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }

    /// Trace a recipe create/update/delete
    #[instrument(skip_all, fields(operation = %operation, recipe_id = recipe_id))]
    pub async fn trace_recipe_operation<F, T, E>(
        &self,
        operation: &str,
        recipe_id: Option<&str>,
        future: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let start_time = Instant::now();
        let result = future.await;

        self.metrics
            .record_recipe_operation(operation, result.is_ok());
        match &result {
            Ok(_) => info!(
                duration_ms = start_time.elapsed().as_millis() as u64,
                "Recipe operation completed"
            ),
            Err(error) => error!(
                error = %error,
                duration_ms = start_time.elapsed().as_millis() as u64,
                "Recipe operation failed"
            ),
        }

        result
    }

    /// Trace an add/remove on a favorite, cart or subscription list
    #[instrument(skip_all, fields(list = %list, operation = %operation, user_id = %user_id))]
    pub async fn trace_list_operation<F, T, E>(
        &self,
        list: &str,
        operation: &str,
        user_id: &str,
        future: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let start_time = Instant::now();
        let result = future.await;

        self.metrics
            .record_user_list_operation(list, operation, result.is_ok());
        match &result {
            Ok(_) => info!(
                duration_ms = start_time.elapsed().as_millis() as u64,
                "List operation completed"
            ),
            Err(error) => error!(
                error = %error,
                duration_ms = start_time.elapsed().as_millis() as u64,
                "List operation failed"
            ),
        }

        result
    }

    /// Trace a shopping list build; `line_count` extracts the size of a successful result
    #[instrument(skip_all, fields(format = %format, user_id = %user_id))]
    pub async fn trace_shopping_list<F, T, E>(
        &self,
        format: &str,
        user_id: &str,
        line_count: impl Fn(&T) -> usize,
        future: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let start_time = Instant::now();
        let result = future.await;
        let duration = start_time.elapsed();

        match &result {
            Ok(value) => {
                let lines = line_count(value);
                self.metrics
                    .record_shopping_list(format, Some(lines), duration.as_secs_f64());
                info!(
                    lines,
                    duration_ms = duration.as_millis() as u64,
                    "Shopping list built"
                );
            }
            Err(error) => {
                self.metrics
                    .record_shopping_list(format, None, duration.as_secs_f64());
                error!(
                    error = %error,
                    duration_ms = duration.as_millis() as u64,
                    "Shopping list build failed"
                );
            }
        }

        result
    }
}
