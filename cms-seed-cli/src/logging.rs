//! Logger setup for the `--quiet`, `--verbose` and `--logfile` flags.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use log::LevelFilter;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stderr;

use crate::error::CliError;

/// Writes every line to stderr and, when set, to a file with ANSI codes
/// removed.
struct Tee {
    file: Option<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = &mut self.file {
            file.write_all(&strip_ansi_escapes::strip(buf))?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = &mut self.file {
            file.flush()?;
        }
        Ok(())
    }
}

pub(crate) fn init(verbose: bool, quiet: bool, logfile: Option<&Path>) -> Result<(), CliError> {
    let level = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    let file = logfile.map(File::create).transpose()?;

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(Tee { file })))
        .format(move |buf, record| {
            let level = record.level();
            let prefix = match level {
                log::Level::Error => Some(
                    "error:"
                        .if_supports_color(Stderr, |t| t.red())
                        .to_string(),
                ),
                log::Level::Warn => Some(
                    "warning:"
                        .if_supports_color(Stderr, |t| t.yellow())
                        .to_string(),
                ),
                _ => None,
            };

            if verbose {
                write!(
                    buf,
                    "{} {:<5} ",
                    chrono::Local::now().format("%H:%M:%S%.3f"),
                    level
                )?;
            }
            match prefix {
                Some(p) => writeln!(buf, "{} {}", p, record.args()),
                None => writeln!(buf, "{}", record.args()),
            }
        });

    builder
        .try_init()
        .map_err(|e| CliError::runtime(format!("Failed to initialise logging: {}", e)))
}
