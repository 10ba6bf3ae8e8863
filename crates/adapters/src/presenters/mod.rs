use chrono::{Local, TimeZone};
use memeify_domain::ImageRecord;

const DIMENSIONS_UNAVAILABLE: &str = "dimensions unavailable";

pub fn present_image_row(record: &ImageRecord) -> String {
    format!(
        "{}\t{}\t{} kB\t{}",
        record.id.get(),
        record.display_name,
        record.size_kilobytes(),
        record.mime_type
    )
}

pub fn present_details(record: &ImageRecord) -> String {
    format!(
        "{}\n{}/{}\n{} kB\t{}\t{}",
        present_date(record.date_modified),
        record.relative_path,
        record.display_name,
        record.size_kilobytes(),
        present_dimensions(record),
        record.mime_type
    )
}

fn present_dimensions(record: &ImageRecord) -> String {
    match record.dimensions() {
        Some((width, height)) => format!("{}x{}", width, height),
        None => DIMENSIONS_UNAVAILABLE.to_string(),
    }
}

fn present_date(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(date) => date.format("%b %-d, %Y  %H:%M").to_string(),
        None => millis.to_string(),
    }
}
