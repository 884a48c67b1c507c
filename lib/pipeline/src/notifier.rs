//! Default notifier sinks (§4.9, §9 "Notifier plurality"). [`Notifier`]
//! itself lives in `ekara_runner` so that crate stays usable without
//! pulling in the pipeline; this module just supplies the concrete
//! TTY/log sink and a fan-out multiplexer.

use ekara_runner::Notifier;

/// Logs every event through `tracing`, the way the rest of this
/// workspace reports progress (no bespoke TTY renderer).
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
  fn notify(&self, key: &str, message: &str) {
    tracing::info!(target: "ekara_pipeline::notify", key, "{message}");
  }

  fn notify_with_goal(&self, key: &str, current: usize, total: usize, message: &str) {
    tracing::info!(target: "ekara_pipeline::notify", key, current, total, "{message}");
  }

  fn detail(&self, message: &str) {
    tracing::info!(target: "ekara_pipeline::detail", "{message}");
  }
}

/// Fans every event out to each sink in turn. Sinks are expected to
/// serialize internally (§5 "the notifier is multi-writer but
/// serializes internally") — this type does not add its own locking.
#[derive(Default)]
pub struct MultiNotifier {
  sinks: Vec<Box<dyn Notifier>>,
}

impl MultiNotifier {
  pub fn new(sinks: Vec<Box<dyn Notifier>>) -> Self {
    MultiNotifier { sinks }
  }
}

impl Notifier for MultiNotifier {
  fn notify(&self, key: &str, message: &str) {
    for sink in &self.sinks {
      sink.notify(key, message);
    }
  }

  fn notify_with_goal(&self, key: &str, current: usize, total: usize, message: &str) {
    for sink in &self.sinks {
      sink.notify_with_goal(key, current, total, message);
    }
  }

  fn detail(&self, message: &str) {
    for sink in &self.sinks {
      sink.detail(message);
    }
  }
}
