use clap::{crate_description, crate_version, App, Arg, ArgMatches};
use log::{self, error, info, Level, Log};
use std::ffi::CString;

use syswrap::system;

const DEFAULT_TARGET: &str = "/hopefully_nonexisting_file";

fn configure_arguments() -> App<'static, 'static> {
    let help_msg = "display this help and exit";
    let version_msg = "output version information and exit";
    App::new("syswrap")
        .version(crate_version!())
        .about(crate_description!())
        .help_message(help_msg)
        .version_message(version_msg)
        .arg(
            Arg::with_name("verbosity")
                .short("v")
                .long("verbose")
                .help("enable debug messages")
                .multiple(true),
        )
        .arg(
            Arg::with_name("path")
                .value_name("PATH")
                .help("path to try to remove, expected to be absent")
                .index(1),
        )
}

struct Logger {
    others: bool,
    level: Level,
}

impl Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
            && (self.others || metadata.target().starts_with("syswrap"))
    }

    fn log(&self, record: &log::Record) {
        use std::io::Write;

        if !self.enabled(record.metadata()) {
            return;
        }

        let lch = match record.level() {
            Level::Error => "[E ",
            Level::Warn => "[W ",
            Level::Info => "[I ",
            Level::Debug => "[D ",
            Level::Trace => "[T ",
        };

        let lout = std::io::stderr();
        let mut out = lout.lock();
        writeln!(&mut out, "{}{}] {}", lch, record.target(), record.args())
            .unwrap();
    }

    fn flush(&self) {
        //
    }
}

fn configure_log(verbosity: u64) {
    let filter: (bool, Level) = match verbosity {
        0 => (false, Level::Info),
        1 => (false, Level::Debug),
        2 => (true, Level::Debug),
        _ => (true, Level::Trace),
    };

    let logger = Logger {
        others: filter.0,
        level: filter.1,
    };
    log::set_boxed_logger(Box::new(logger)).unwrap();
    log::set_max_level(filter.1.to_level_filter())
}

fn command_unlink(matches: &ArgMatches) -> i32 {
    let path = matches.value_of("path").unwrap_or(DEFAULT_TARGET);

    let target = match CString::new(path) {
        Ok(target) => target,
        Err(err) => {
            error!("path {:?} contains an interior NUL: {}", path, err);
            return 2;
        }
    };

    // the expected outcome: the target is absent and unlink fails
    match system::unlink(&target) {
        Ok(()) => info!("removed {:?}", path),
        Err(err) => error!("unlink {:?}: {}", path, err),
    }
    0
}

fn run() -> i32 {
    let matches = configure_arguments().get_matches();
    configure_log(matches.occurrences_of("verbosity"));
    command_unlink(&matches)
}

fn main() {
    std::process::exit(run());
}
