// Copyright 2022 Oxide Computer Company

#[cfg(test)]
mod arbiter;
#[cfg(test)]
mod artifacts;
#[cfg(test)]
mod flow_table;
#[cfg(test)]
mod pipeline;
#[cfg(test)]
mod port_table;

pub mod programs;

#[cfg(test)]
pub(crate) fn test_logger() -> slog::Logger {
    use slog::Drain;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::new(drain).fuse();
    slog::Logger::root(std::sync::Mutex::new(drain).fuse(), slog::o!())
}
