use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone};

/// Daylight saving gaps never last longer than this.
const LONGEST_GAP_MINUTES: i64 = 3 * 60;

/// First existing moment of `date` in `tz`. Usually midnight, but some zones skip midnight when
/// switching to summer time, then the day starts right after the gap.
pub fn day_start<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<DateTime<Tz>> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=LONGEST_GAP_MINUTES)
        .find_map(|minutes| {
            tz.from_local_datetime(&(midnight + Duration::minutes(minutes)))
                .earliest()
        })
        .ok_or_else(|| anyhow!("Day {date} has no start in the local timezone"))
}

/// Returns start of the next calendar day.
pub fn next_day_start<Tz: TimeZone>(date: &DateTime<Tz>) -> Result<DateTime<Tz>> {
    let next = date
        .date_naive()
        .succ_opt()
        .ok_or_else(|| anyhow!("{} is the last representable day", date.date_naive()))?;
    day_start(next, &date.timezone())
}

/// Range covering the whole calendar day of `moment`: from its start (inclusive) to the start of
/// the next day (exclusive). Days around daylight saving changes are 23 or 25 hours long.
pub fn day_range<Tz: TimeZone>(moment: DateTime<Tz>) -> Result<(DateTime<Tz>, DateTime<Tz>)> {
    let start = day_start(moment.date_naive(), &moment.timezone())?;
    let end = next_day_start(&moment)?;
    Ok((start, end))
}

/// Formats worked seconds the way counters are shown to the user. Unknown and zero values are
/// both rendered as `00:00:00`.
pub fn format_hhmmss(seconds: Option<u64>) -> String {
    let seconds = match seconds {
        Some(v) if v > 0 => v,
        _ => return "00:00:00".into(),
    };

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    format!("{hours:02}:{minutes:02}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
    use chrono_tz::America::{New_York, Santiago};

    use super::{day_range, format_hhmmss};

    #[test]
    fn test_format_empty_values() {
        assert_eq!(format_hhmmss(None), "00:00:00");
        assert_eq!(format_hhmmss(Some(0)), "00:00:00");
    }

    #[test]
    fn test_format_boundaries() {
        assert_eq!(format_hhmmss(Some(1)), "00:00:01");
        assert_eq!(format_hhmmss(Some(59)), "00:00:59");
        assert_eq!(format_hhmmss(Some(60)), "00:01:00");
        assert_eq!(format_hhmmss(Some(3599)), "00:59:59");
        assert_eq!(format_hhmmss(Some(3600)), "01:00:00");
        assert_eq!(format_hhmmss(Some(3661)), "01:01:01");
    }

    #[test]
    fn test_format_components() {
        for (h, m, s) in [(0, 0, 5), (2, 30, 0), (8, 0, 0), (12, 59, 59), (123, 4, 5)] {
            let total = h * 3600 + m * 60 + s;
            assert_eq!(
                format_hhmmss(Some(total)),
                format!("{h:02}:{m:02}:{s:02}")
            );
        }
    }

    #[test]
    fn test_day_range() {
        let moment = Utc.from_utc_datetime(&NaiveDateTime::new(
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            NaiveTime::from_hms_opt(18, 46, 32).unwrap(),
        ));
        let (start, end) = day_range(moment).unwrap();
        assert_eq!(
            start.naive_utc(),
            NaiveDate::from_ymd_opt(2023, 12, 31)
                .unwrap()
                .and_time(NaiveTime::MIN)
        );
        assert_eq!(
            end.naive_utc(),
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_time(NaiveTime::MIN)
        );
    }

    #[test]
    fn test_day_range_before_clocks_go_forward() {
        // Clocks in New York jump from 02:00 to 03:00 on 2024-03-10
        let moment = New_York.with_ymd_and_hms(2024, 3, 9, 23, 30, 0).unwrap();
        let (start, end) = day_range(moment).unwrap();

        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(end.time(), NaiveTime::MIN);
        assert_eq!(end - start, Duration::hours(24));
    }

    #[test]
    fn test_day_range_on_short_and_long_days() {
        let (start, end) =
            day_range(New_York.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()).unwrap();
        assert_eq!(end - start, Duration::hours(23));

        let (start, end) =
            day_range(New_York.with_ymd_and_hms(2024, 11, 3, 12, 0, 0).unwrap()).unwrap();
        assert_eq!(end - start, Duration::hours(25));
    }

    #[test]
    fn test_day_range_when_midnight_is_skipped() {
        // Santiago skips from 00:00 straight to 01:00 on 2024-09-08
        let moment = Santiago.with_ymd_and_hms(2024, 9, 8, 12, 0, 0).unwrap();
        let (start, end) = day_range(moment).unwrap();
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2024, 9, 8).unwrap());
        assert_eq!(start.hour(), 1);
        assert_eq!(start.minute(), 0);
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2024, 9, 9).unwrap());

        let day_before = Santiago.with_ymd_and_hms(2024, 9, 7, 23, 30, 0).unwrap();
        let (_, end) = day_range(day_before).unwrap();
        assert_eq!(end, start);
    }
}
