use std::fmt::Display;
use std::io;
use std::process::{Command, Stdio};

use chrono::TimeZone;
use ratatui::layout::Rect;

use super::types::{NO_UPDATE_TIMESTAMP, SearchResult, UpdateInfo};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp<Tz>(secs: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    tz.timestamp_opt(secs, 0)
        .earliest()
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| secs.to_string())
}

pub fn format_update_line<Tz>(info: &UpdateInfo, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    // A zero timestamp means the server has never finished an import.
    let updated = match info.last_timestamp.filter(|secs| *secs != 0) {
        Some(secs) => format_timestamp(secs, tz),
        None => NO_UPDATE_TIMESTAMP.to_string(),
    };
    format!("Updated: {updated}, Version: {}", info.build_version)
}

pub fn result_metadata_line<Tz>(result: &SearchResult, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{} visits | last visit: {}",
        result.visit_count,
        format_timestamp(result.last_visit_time, tz)
    )
}

pub fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    let right = rect.x.saturating_add(rect.width);
    let bottom = rect.y.saturating_add(rect.height);
    x >= rect.x && x < right && y >= rect.y && y < bottom
}

/// Maps a mouse row inside a bordered list of fixed-height items to an item index.
pub fn list_item_index_at(
    area: Rect,
    mouse_row: u16,
    item_height: u16,
    offset: usize,
) -> Option<usize> {
    if area.height <= 2 || item_height == 0 {
        return None;
    }
    let first_row = area.y.saturating_add(1);
    let last_row = area.y + area.height - 1;
    if mouse_row >= first_row && mouse_row < last_row {
        Some(offset + ((mouse_row - first_row) / item_height) as usize)
    } else {
        None
    }
}

pub fn open_url_in_browser(url: &str) -> io::Result<()> {
    if url.trim().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty URL"));
    }

    #[cfg(target_os = "macos")]
    let mut command = {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    };

    #[cfg(target_os = "windows")]
    let mut command = {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", "", url]);
        cmd
    };

    #[cfg(all(not(target_os = "macos"), not(target_os = "windows")))]
    let mut command = {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    };

    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn timestamps_format_in_given_zone() {
        assert_eq!(format_timestamp(1_700_000_000, &Utc), "2023-11-14 22:13:20");
        assert_eq!(format_timestamp(0, &Utc), "1970-01-01 00:00:00");
    }

    #[test]
    fn update_line_with_and_without_timestamp() {
        let mut info = UpdateInfo {
            last_timestamp: Some(1_700_000_000),
            build_version: "v1.0.0".to_string(),
        };
        assert_eq!(
            format_update_line(&info, &Utc),
            "Updated: 2023-11-14 22:13:20, Version: v1.0.0"
        );
        info.last_timestamp = None;
        assert_eq!(
            format_update_line(&info, &Utc),
            "Updated: No update timestamp is available., Version: v1.0.0"
        );
        info.last_timestamp = Some(0);
        assert_eq!(
            format_update_line(&info, &Utc),
            "Updated: No update timestamp is available., Version: v1.0.0"
        );
    }

    #[test]
    fn metadata_line_shows_visits_and_last_visit() {
        let result = SearchResult {
            title: "Example".to_string(),
            url: "https://example.com".to_string(),
            visit_count: 3,
            last_visit_time: 1_700_000_000,
        };
        assert_eq!(
            result_metadata_line(&result, &Utc),
            "3 visits | last visit: 2023-11-14 22:13:20"
        );
    }

    #[test]
    fn mouse_rows_map_to_items() {
        let area = Rect::new(0, 4, 40, 11);
        assert_eq!(list_item_index_at(area, 4, 3, 0), None);
        assert_eq!(list_item_index_at(area, 5, 3, 0), Some(0));
        assert_eq!(list_item_index_at(area, 7, 3, 0), Some(0));
        assert_eq!(list_item_index_at(area, 8, 3, 0), Some(1));
        assert_eq!(list_item_index_at(area, 8, 3, 2), Some(3));
        assert_eq!(list_item_index_at(area, 14, 3, 0), None);
        assert!(point_in_rect(10, 5, area));
        assert!(!point_in_rect(40, 5, area));
    }

    #[test]
    fn empty_url_is_not_opened() {
        let err = open_url_in_browser("  ").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
