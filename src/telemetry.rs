//! Log output, local and remote.
//!
//! Local logs always go to stderr through `tracing-subscriber`'s fmt
//! layer, filtered by `RUST_LOG` (default `info`). When remote shipping
//! is enabled, a second layer forwards every rendered event over a
//! channel to a background task that batches them into CloudWatch Logs
//! `put_log_events` calls. The layer itself never blocks or fails; a
//! broken CloudWatch pipe degrades to local-only logging.

use aws_sdk_cloudwatchlogs::Client;
use aws_sdk_cloudwatchlogs::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_cloudwatchlogs::types::InputLogEvent;
use std::fmt::Write as _;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber, warn};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use trellis_config::{AwsConfig, CloudWatchConfig};

// CloudWatch caps a batch at 10_000 events; stay far below it.
const MAX_BATCH: usize = 1_000;

/// Install the global subscriber. Returns the shipping task handle when
/// remote logging is on; the task runs for the life of the process.
pub fn init(aws: &AwsConfig, cloudwatch: &CloudWatchConfig) -> Option<JoinHandle<()>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let (remote_layer, task) = if cloudwatch.enabled {
        let (layer, task) = remote(aws, cloudwatch);
        (Some(layer), Some(task))
    } else {
        (None, None)
    };
    tracing_subscriber::registry().with(filter).with(fmt_layer).with(remote_layer).init();
    task
}

fn remote(aws: &AwsConfig, cloudwatch: &CloudWatchConfig) -> (CloudWatchLayer, JoinHandle<()>) {
    let credentials = Credentials::new(&aws.access_key_id, &aws.secret_access_key, None, None, "trellis-config");
    let config = aws_sdk_cloudwatchlogs::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .credentials_provider(credentials)
        .region(Region::new(aws.region.clone()))
        .build();
    let client = Client::from_conf(config);
    let (tx, rx) = mpsc::unbounded_channel();
    let shipper = Shipper {
        client,
        log_group: cloudwatch.log_group.clone(),
        stream_name: cloudwatch.stream_name.clone(),
        interval: Duration::from_secs(cloudwatch.send_interval_seconds),
    };
    let task = tokio::spawn(shipper.run(rx));
    (CloudWatchLayer { tx }, task)
}

struct CloudWatchLayer {
    tx: mpsc::UnboundedSender<InputLogEvent>,
}

impl<S: Subscriber> Layer<S> for CloudWatchLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // The shipper logs its own failures; forwarding those would loop.
        if event.metadata().target().starts_with(module_path!()) {
            return;
        }
        let mut rendered = RenderedEvent::default();
        event.record(&mut rendered);
        let message = format!("{:>5} {}: {}", event.metadata().level(), event.metadata().target(), rendered.text);
        let timestamp = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
        if let Ok(input) = InputLogEvent::builder().timestamp(timestamp).message(message).build() {
            let _ = self.tx.send(input);
        }
    }
}

#[derive(Default)]
struct RenderedEvent {
    text: String,
}

impl Visit for RenderedEvent {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.text, "{value:?}");
        } else {
            let _ = write!(self.text, " {}={:?}", field.name(), value);
        }
    }
}

struct Shipper {
    client: Client,
    log_group: String,
    stream_name: String,
    interval: Duration,
}

impl Shipper {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<InputLogEvent>) {
        self.ensure_stream().await;
        let mut pending: Vec<InputLogEvent> = Vec::new();
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(event) => {
                        pending.push(event);
                        if pending.len() >= MAX_BATCH {
                            self.flush(&mut pending).await;
                        }
                    },
                    None => break,
                },
                _ = ticker.tick() => {
                    if !pending.is_empty() {
                        self.flush(&mut pending).await;
                    }
                },
            }
        }
        self.flush(&mut pending).await;
    }

    /// Create the group and stream, tolerating that they already exist.
    async fn ensure_stream(&self) {
        if let Err(err) = self.client.create_log_group().log_group_name(&self.log_group).send().await {
            let err = err.into_service_error();
            if !err.is_resource_already_exists_exception() {
                warn!(group = %self.log_group, error = %err, "could not create log group");
            }
        }
        if let Err(err) = self
            .client
            .create_log_stream()
            .log_group_name(&self.log_group)
            .log_stream_name(&self.stream_name)
            .send()
            .await
        {
            let err = err.into_service_error();
            if !err.is_resource_already_exists_exception() {
                warn!(stream = %self.stream_name, error = %err, "could not create log stream");
            }
        }
    }

    async fn flush(&self, pending: &mut Vec<InputLogEvent>) {
        if pending.is_empty() {
            return;
        }
        let batch = std::mem::take(pending);
        let count = batch.len();
        if let Err(err) = self
            .client
            .put_log_events()
            .log_group_name(&self.log_group)
            .log_stream_name(&self.stream_name)
            .set_log_events(Some(batch))
            .send()
            .await
        {
            // Dropped, not requeued: remote logs are an observability aid,
            // never worth unbounded buffering.
            warn!(count, error = %err.into_service_error(), "dropped log batch");
        }
    }
}
