use std::fmt::Write as _;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, EnvFilter, Layer, Registry};

/// Fields that identify which spin a record belongs to. They are printed
/// ahead of the message so interleaved requests can be told apart.
const SPIN_FIELDS: [&str; 3] = ["case", "request", "trajectory"];

#[derive(Default)]
struct SpinEventVisitor {
    message: String,
    spin: Vec<(&'static str, String)>,
}

impl SpinEventVisitor {
    fn capture(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message.push_str(&value);
        } else if let Some(name) = SPIN_FIELDS.iter().find(|name| **name == field.name()) {
            self.spin.push((*name, value));
        }
    }

    fn prefix(&self) -> String {
        let mut prefix = String::new();
        for name in SPIN_FIELDS {
            if let Some((_, value)) = self.spin.iter().find(|(field, _)| *field == name) {
                let _ = write!(prefix, "{}{}={}", if prefix.is_empty() { "[" } else { " " }, name, value);
            }
        }
        if !prefix.is_empty() {
            prefix.push_str("] ");
        }
        prefix
    }
}

impl Visit for SpinEventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.capture(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.capture(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.capture(field, value.to_string());
    }
}

struct WheelLayer;

impl<S: Subscriber> Layer<S> for WheelLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = SpinEventVisitor::default();
        event.record(&mut visitor);
        if visitor.message.is_empty() {
            return;
        }

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let line = format!("{}{}", visitor.prefix(), visitor.message);
        match metadata.level().as_str() {
            "ERROR" => println!("[{}] ❌ Error: {} - {}", timestamp, metadata.target(), line),
            "WARN" => println!("[{}] ⚠️ Warning: {} - {}", timestamp, metadata.target(), line),
            "INFO" => println!("[{}] 🎡 {} - {}", timestamp, metadata.target(), line),
            _ => println!("[{}] 🔄 {} - {}", timestamp, metadata.target(), line),
        }
    }
}

pub fn default_filter() -> EnvFilter {
    EnvFilter::new("warn,wheel_sim=info,wheel_reconciler=info,wheel_shared=info")
}

/// Installs the global subscriber. `log` records from the library crates are
/// bridged into it.
pub fn setup() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter());

    Registry::default()
        .with(env_filter)
        .with(WheelLayer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))
}
