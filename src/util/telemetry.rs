use std::time::Duration;

use opentelemetry::trace::TracerProvider;
use opentelemetry::{KeyValue, global};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{self, Protocol, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::util::env::Env;

pub type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>;

const EXPORT_TIMEOUT: Duration = Duration::from_secs(5);

/// Tracing subscriber plus the OpenTelemetry providers feeding it.
///
/// With `OTEL_EXPORTER_OTLP_ENDPOINT` set, traces, logs and metrics are exported over OTLP/gRPC.
/// Without it, spans go to stdout and logs only reach the fmt layer.
#[derive(Debug)]
pub struct Telemetry {
    pub tracer_name: String,
    pub log_filter: String,

    tracer_provider: SdkTracerProvider,
    logger_provider: Option<SdkLoggerProvider>,
    meter_provider: Option<SdkMeterProvider>,
}

impl Telemetry {
    pub fn new(env: &Env) -> Result<Telemetry> {
        let base_resource = base_attrs(env.api_service_name.clone(), env!("CARGO_PKG_VERSION"));

        let (tracer_provider, logger_provider, meter_provider) =
            match env.otel_exporter_otlp_endpoint.as_deref() {
                Some(collector_url) => (
                    build_tracer_provider(collector_url, base_resource.clone())?,
                    Some(build_logger_provider(collector_url, base_resource.clone())?),
                    Some(build_meter_provider(collector_url, base_resource)?),
                ),
                None => (init_stdout_provider(base_resource), None, None),
            };

        Ok(Self {
            tracer_name: env.api_tracer_name.clone(),
            log_filter: env.log_filter.clone(),
            tracer_provider,
            logger_provider,
            meter_provider,
        })
    }

    pub fn register(self) -> Self {
        global::set_tracer_provider(self.tracer_provider.clone());
        let tracer = self.tracer_provider.tracer(self.tracer_name.clone());
        let trace_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        let log_layer = self
            .logger_provider
            .as_ref()
            .map(|provider| OpenTelemetryTracingBridge::new(provider));
        let meter_layer = self
            .meter_provider
            .clone()
            .map(tracing_opentelemetry::MetricsLayer::new);

        tracing_subscriber::registry()
            .with(trace_layer)
            .with(log_layer)
            .with(meter_layer)
            .with(EnvFilter::new(&self.log_filter))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true),
            )
            .init();

        self
    }

    pub fn shutdown(self) {
        if let Some(meter_provider) = self.meter_provider {
            if let Err(e) = meter_provider.shutdown() {
                eprintln!("error during metering shutdown: {e:?}");
            }
        }

        if let Some(logger_provider) = self.logger_provider {
            if let Err(e) = logger_provider.shutdown() {
                eprintln!("error during logging shutdown: {e:?}");
            }
        }

        if let Err(e) = self.tracer_provider.shutdown() {
            eprintln!("error during tracing shutdown: {e:?}");
        }
    }
}

fn build_logger_provider(
    collector_url: &str,
    base_resource: Resource,
) -> Result<SdkLoggerProvider> {
    let exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_protocol(Protocol::Grpc)
        .with_endpoint(collector_url)
        .with_timeout(EXPORT_TIMEOUT)
        .build()?;

    Ok(SdkLoggerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(base_resource)
        .build())
}

fn build_tracer_provider(
    collector_url: &str,
    base_resource: Resource,
) -> Result<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_protocol(Protocol::Grpc)
        .with_endpoint(collector_url)
        .with_timeout(EXPORT_TIMEOUT)
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(base_resource)
        .build())
}

fn build_meter_provider(
    collector_url: &str,
    base_resource: Resource,
) -> Result<SdkMeterProvider> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_protocol(Protocol::Grpc)
        .with_endpoint(collector_url)
        .with_timeout(EXPORT_TIMEOUT)
        .build()?;

    Ok(SdkMeterProvider::builder()
        .with_periodic_exporter(exporter)
        .with_resource(base_resource)
        .build())
}

/// Console-only tracing for local development, no collector required
fn init_stdout_provider(base_resource: Resource) -> SdkTracerProvider {
    let exporter = opentelemetry_stdout::SpanExporter::default();

    SdkTracerProvider::builder()
        .with_simple_exporter(exporter)
        .with_id_generator(RandomIdGenerator::default())
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(base_resource)
        .build()
}

fn base_attrs(name: String, version: &'static str) -> Resource {
    Resource::builder()
        .with_attributes([
            KeyValue::new("service.name", name),
            KeyValue::new("service.version", version),
        ])
        .build()
}
