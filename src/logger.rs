use std::fs::File;
use std::path::Path;

use time::{format_description, OffsetDateTime};
use tracing::{subscriber::set_global_default, Level};
use tracing_subscriber::{fmt::writer::BoxMakeWriter, FmtSubscriber};

/// Will panic on error
pub fn init_logger(log_file: bool, level: Level) {
    let timer = match time::UtcOffset::current_local_offset() {
        Ok(offset) => tracing_subscriber::fmt::time::OffsetTime::new(
            offset,
            format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]").unwrap(),
        ),
        Err(_) => tracing_subscriber::fmt::time::OffsetTime::new(
            time::UtcOffset::UTC,
            format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]").unwrap(),
        ),
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_timer(timer);

    let subscriber = if log_file {
        let file_name = get_log_file_name();
        let file = File::create(Path::new(&file_name)).unwrap();
        let writer = BoxMakeWriter::new(file);
        builder.with_ansi(false).with_writer(writer).finish()
    } else {
        builder.with_writer(BoxMakeWriter::new(std::io::stderr)).finish()
    };

    set_global_default(subscriber).expect("Could not set global default tracing subscriber. Consider disabling logs if you are already setting a subscriber.");
}

fn get_log_file_name() -> String {
    let format = format_description::parse("[year]-[month]-[day]_[hour]:[minute]:[second]_log.txt")
        .unwrap();
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(&format).unwrap()
}
