use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

/// Installs the colored stderr logger.
///
/// Success and error lines land at `info!`/`error!` and are always shown;
/// `--verbose` additionally lets `debug!` detail through.
pub fn setup(verbose: bool) -> Result<(), fern::InitError> {
    let colors = ColoredLevelConfig::new()
        .debug(Color::BrightBlack)
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red);
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!("[{}] {}", colors.color(record.level()), message))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}
