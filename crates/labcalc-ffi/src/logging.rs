use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Installs a stderr formatter filtered by `LABCALC_LOG` (default `labcalc_core=warn`).
///
/// Returns `false` if the filter is malformed or a global subscriber is already set.
pub fn init() -> bool {
    let format_filter = match EnvFilter::try_from_env("LABCALC_LOG")
        .or_else(|_| EnvFilter::try_new("labcalc_core=warn,labcalc_ffi=warn"))
    {
        Ok(filter) => filter,
        Err(_) => return false,
    };
    let format_layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_writer(std::io::stderr)
        .with_filter(format_filter);

    tracing_subscriber::Registry::default()
        .with(format_layer)
        .try_init()
        .is_ok()
}
