use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::{
	metrics::{
		reader::{DefaultAggregationSelector, DefaultTemporalitySelector},
		Aggregation, Instrument, MeterProviderBuilder, PeriodicReader, SdkMeterProvider, Stream,
	},
	runtime,
	trace::{BatchConfig, Sampler, Tracer},
	Resource,
};
use opentelemetry_semantic_conventions::{
	resource::{DEPLOYMENT_ENVIRONMENT, SERVICE_NAME, SERVICE_VERSION},
	SCHEMA_URL,
};
use std::time::Duration;

use axum::http::Response;
use tower_http::trace::OnResponse;
use tracing::{level_filters::LevelFilter, Level, Span};
use tracing_opentelemetry::MetricsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("metrics error: {0}")]
	Metrics(#[from] opentelemetry::metrics::MetricsError),
	#[error("trace error: {0}")]
	Trace(#[from] opentelemetry::trace::TraceError),
}

/// Constructs a [`Resource`] which describes the service.
fn resource() -> Resource {
	Resource::from_schema_url(
		[
			KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
			KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
			KeyValue::new(
				DEPLOYMENT_ENVIRONMENT,
				if cfg!(debug_assertions) {
					"development"
				} else {
					"production"
				},
			),
		],
		SCHEMA_URL,
	)
}

/// Constructs an [`SdkMeterProvider`] that exports over OTLP, with a custom view for latency metrics.
fn init_meter_provider() -> Result<SdkMeterProvider, Error> {
	let exporter = opentelemetry_otlp::new_exporter()
		.tonic()
		.build_metrics_exporter(
			Box::new(DefaultAggregationSelector::new()),
			Box::new(DefaultTemporalitySelector::new()),
		)?;

	let reader = PeriodicReader::builder(exporter, runtime::Tokio)
		.with_interval(std::time::Duration::from_secs(5))
		.build();

	let view_latency = |instrument: &Instrument| -> Option<Stream> {
		(instrument.name == "latency_ms").then(|| {
			Stream::new()
				.name("latency_ms")
				.aggregation(Aggregation::Default)
		})
	};

	let meter_provider = MeterProviderBuilder::default()
		.with_resource(resource())
		.with_reader(reader)
		.with_view(view_latency)
		.build();

	global::set_meter_provider(meter_provider.clone());

	Ok(meter_provider)
}

/// Constructs a [`Tracer`] that samples every trace and exports them over OTLP.
fn init_tracer() -> Result<Tracer, Error> {
	let tracer = opentelemetry_otlp::new_pipeline()
		.tracing()
		.with_trace_config(
			opentelemetry_sdk::trace::Config::default()
				.with_sampler(Sampler::TraceIdRatioBased(1.0))
				.with_resource(resource()),
		)
		.with_batch_config(BatchConfig::default())
		.with_exporter(opentelemetry_otlp::new_exporter().tonic())
		.install_batch(runtime::Tokio)?;

	Ok(tracer)
}

/// Initializes the global tracing subscriber.
///
/// Events are always written to stdout. When `otlp` is set, traces and metrics are
/// also exported to the collector configured through the standard `OTEL_EXPORTER_OTLP_*`
/// variables, and the returned guard shuts the providers down when dropped.
pub fn init_tracing_subscriber(level: Level, otlp: bool) -> Result<Option<OtelGuard>, Error> {
	let registry = tracing_subscriber::registry()
		.with(LevelFilter::from_level(level))
		.with(tracing_subscriber::fmt::layer().with_ansi(true));

	if !otlp {
		registry.init();

		return Ok(None);
	}

	let meter_provider = init_meter_provider()?;
	let tracer = init_tracer()?;

	registry
		.with(MetricsLayer::new(meter_provider.clone()))
		.with(tracing_opentelemetry::layer().with_tracer(tracer))
		.init();

	Ok(Some(OtelGuard { meter_provider }))
}

/// Logs every response and records its latency in the `latency_ms` histogram.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordLatency;

impl<B> OnResponse<B> for RecordLatency {
	fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
		tracing::info!(
			histogram.latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
			status = response.status().as_u16(),
			"finished request"
		);
	}
}

/// Counts a change to a post in the `post_changes` metric.
pub fn count_post_change(action: &'static str) {
	tracing::info!(monotonic_counter.post_changes = 1_u64, action);
}

pub struct OtelGuard {
	meter_provider: SdkMeterProvider,
}

impl Drop for OtelGuard {
	fn drop(&mut self) {
		if let Err(err) = self.meter_provider.shutdown() {
			eprintln!("{err:?}");
		}

		global::shutdown_tracer_provider();
	}
}

#[cfg(test)]
mod test {
	use std::sync::{Arc, Mutex};

	use tracing::{field::Field, Event, Subscriber};
	use tracing_subscriber::layer::{Context, Layer};

	use super::*;

	/// Collects the field names of every event.
	#[derive(Clone, Default)]
	struct FieldNames(Arc<Mutex<Vec<String>>>);

	impl<S: Subscriber> Layer<S> for FieldNames {
		fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
			self.0
				.lock()
				.unwrap()
				.extend(event.fields().map(|field: Field| field.name().to_string()));
		}
	}

	fn recorded(f: impl FnOnce()) -> Vec<String> {
		let names = FieldNames::default();

		tracing::subscriber::with_default(tracing_subscriber::registry().with(names.clone()), f);

		let names = names.0.lock().unwrap().clone();
		names
	}

	#[test]
	fn test_latency_is_a_histogram() {
		let names = recorded(|| {
			RecordLatency.on_response(
				&Response::new(()),
				Duration::from_millis(3),
				&Span::none(),
			);
		});

		assert!(names.iter().any(|name| name == "histogram.latency_ms"));
	}

	#[test]
	fn test_post_changes_are_counted() {
		let names = recorded(|| count_post_change("created"));

		assert!(names
			.iter()
			.any(|name| name == "monotonic_counter.post_changes"));
	}
}
