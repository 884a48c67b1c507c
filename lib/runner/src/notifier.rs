/// Sink for Apply-Engine progress events (§5). Implemented by the
/// pipeline crate's `TracingNotifier`/`MultiNotifier`; the runner only
/// depends on the trait so it stays usable standalone (tests, `ekara
/// check --dry-run`-style tooling).
pub trait Notifier: Send + Sync {
  /// A step has started or finished, with no notion of sub-progress.
  fn notify(&self, key: &str, message: &str);

  /// A step reporting progress against a known total (e.g. node N of M).
  fn notify_with_goal(&self, key: &str, current: usize, total: usize, message: &str);

  /// A free-form detail line, used for `TASK [name]` events from the
  /// playbook runner.
  fn detail(&self, message: &str);
}

/// Discards every event. Used in tests and wherever a caller doesn't
/// care about progress reporting.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
  fn notify(&self, _key: &str, _message: &str) {}
  fn notify_with_goal(&self, _key: &str, _current: usize, _total: usize, _message: &str) {}
  fn detail(&self, _message: &str) {}
}
