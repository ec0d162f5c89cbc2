use log::{LevelFilter, SetLoggerError};
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    Config,
};

/// Route `log` records to stderr, at `level` and above.
///
/// Fails when a logger is already installed. Panics are logged before the default hook runs.
pub fn init_log(level: LevelFilter) -> Result<(), SetLoggerError> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("[{h({l})} - {f}:{L}] {m}{n}")))
        .build();
    let appender = Appender::builder().build("stderr", Box::new(stderr));
    let root = Root::builder().appender("stderr").build(level);

    // Only fails on duplicated appender names.
    let config = match Config::builder().appender(appender).build(root) {
        Ok(config) => config,
        Err(err) => unreachable!("Invalid logger configuration: {err}"),
    };

    log4rs::init_config(config)?;
    update_panic_hook();

    Ok(())
}

fn update_panic_hook() {
    let hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |info| {
        log::error!("PANIC => {}", info);
        hook(info);
    }));
}
