use slog::Drain;

use crate::errors::Result;

/// Initialize the process-wide slog logger.
///
/// Human-readable output goes through `slog-term`; either way logging is
/// non-blocking via `slog-async`, and `log`/`slog-stdlog` are bridged so
/// dependency crates that use the `log` facade end up in the same drain.
pub fn init_logging(human_logs: bool) -> Result<()> {
    let hostname = gethostname::gethostname()
        .into_string()
        .unwrap_or_else(|_| "unknown".to_owned());

    let decorator = slog_term::TermDecorator::new().build();
    let logger = if human_logs {
        let drain = slog_term::FullFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        slog::Logger::root(drain, slog_o!("hostname" => hostname))
    } else {
        let drain = slog_term::FullFormat::new(decorator).use_utc_timestamp().build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        slog::Logger::root(drain, slog_o!("hostname" => hostname))
    };

    // XXX: cancel slog_scope's NoGlobalLoggerSet for now, it's difficult to
    // prevent it from potentially panicing during tests. reset_logging resets
    // the global logger during shutdown anyway:
    // https://github.com/slog-rs/slog/issues/169
    slog_scope::set_global_logger(logger).cancel_reset();
    slog_stdlog::init().ok();
    Ok(())
}

pub fn reset_logging() {
    let logger = slog::Logger::root(slog::Discard, o!());
    slog_scope::set_global_logger(logger).cancel_reset();
}
