//! Statement tracing and slow-query reporting.
//!
//! Reports are best-effort. Slow-query warnings are emitted from a detached
//! task when a Tokio runtime is available, so they are not ordered with
//! respect to the call that produced them.

use std::panic::Location;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::options::Options;
use crate::value::Value;

pub(crate) fn show_sql(
    options: &Options,
    caller: &'static Location<'static>,
    template: &str,
    sql: &str,
    params: &[Value],
) {
    if options.show_sql {
        info!(caller = %caller, template, sql, params = ?params, "prepared sql");
    }
}

pub(crate) fn finished(
    options: &Options,
    caller: &'static Location<'static>,
    template: &str,
    elapsed: Duration,
) {
    debug!(caller = %caller, elapsed_ms = elapsed.as_millis() as u64, "sql finished");
    if elapsed <= options.slow_log_duration {
        return;
    }

    let template = template.to_owned();
    let threshold = options.slow_log_duration;
    let report = move || {
        warn!(
            caller = %caller,
            template = %template,
            elapsed_ms = elapsed.as_millis() as u64,
            threshold_ms = threshold.as_millis() as u64,
            "slow sql"
        );
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move { report() });
        }
        Err(_) => report(),
    }
}
