use std::{fmt::Display, sync::Arc};

use anyhow::Result;
use chrono::{DateTime, Local};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};

use crate::{
    api::{
        entities::{WorkReportByCategory, WorkReportByTask},
        http::HttpWorkApi,
    },
    utils::{
        percentage::seconds_percentage,
        time::{day_start, format_hhmmss, next_day_start},
    },
};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportGrouping {
    Total,
    Category,
    Task,
}

impl Display for ReportGrouping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportGrouping::Total => write!(f, "total"),
            ReportGrouping::Category => write!(f, "category"),
            ReportGrouping::Task => write!(f, "task"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[arg(
        long = "start",
        short,
        help = "First day of the report. Examples are \"yesterday\", \"monday\", \"15/03/2025\". Defaults to today"
    )]
    start_date: Option<String>,
    #[arg(
        long = "end",
        short,
        help = "Last day of the report, included. Defaults to today"
    )]
    end_date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, short, default_value_t = ReportGrouping::Category, help = "How worked time is grouped")]
    by: ReportGrouping,
}

/// A single printed line of a report.
#[derive(Debug, PartialEq)]
struct ReportRow {
    name: Arc<str>,
    seconds: f64,
}

impl From<WorkReportByCategory> for ReportRow {
    fn from(value: WorkReportByCategory) -> Self {
        Self {
            name: value
                .category
                .name
                .unwrap_or_else(|| format!("Category {}", value.category.id).into()),
            seconds: value.time,
        }
    }
}

impl From<WorkReportByTask> for ReportRow {
    fn from(value: WorkReportByTask) -> Self {
        let name = match value.task.category.name {
            Some(category) => format!("{category} / {}", value.task.name),
            None => value.task.name.to_string(),
        };
        Self {
            name: name.into(),
            seconds: value.time,
        }
    }
}

/// Command to process `report` command. Prints worked time between two days, both included.
pub async fn process_report_command(
    ReportCommand {
        start_date,
        end_date,
        date_style,
        by,
    }: ReportCommand,
    api: &HttpWorkApi,
) -> Result<()> {
    let (start, end) = parse_range(start_date, end_date, date_style, Local::now())?;

    let (total, rows) = match by {
        ReportGrouping::Total => (api.report_total(start, end).await?, vec![]),
        ReportGrouping::Category => {
            let (total, rows) =
                futures::try_join!(api.report_total(start, end), api.report_by_category(start, end))?;
            (total, rows.into_iter().map(ReportRow::from).collect())
        }
        ReportGrouping::Task => {
            let (total, rows) =
                futures::try_join!(api.report_total(start, end), api.report_by_task(start, end))?;
            (total, rows.into_iter().map(ReportRow::from).collect())
        }
    };

    println!(
        "{} - {}",
        start.format("%x"),
        (end - chrono::Duration::seconds(1)).format("%x")
    );
    for line in format_rows(rows, total.time) {
        println!("{line}");
    }
    println!("{}\tTotal", format_hhmmss(Some(total.seconds())));
    Ok(())
}

/// Also provides sensible defaults for `report` command. Dates are always widened to whole days.
fn parse_range(
    start_date: Option<String>,
    end_date: Option<String>,
    date_style: DateStyle,
    now: DateTime<Local>,
) -> Result<(DateTime<Local>, DateTime<Local>)> {
    let dialect: chrono_english::Dialect = date_style.into();
    let parse = |value: Option<String>, name: &str| -> Result<DateTime<Local>> {
        match value.map(|s| parse_date_string(&s, now, dialect)) {
            Some(Ok(v)) => Ok(v.with_timezone(&Local)),
            Some(Err(e)) => Err(Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Failed to valiate {name} date {e}"),
                )
                .into()),
            None => Ok(now),
        }
    };
    let start = parse(start_date, "start")?;
    let start = day_start(start.date_naive(), &Local)?;
    let end = next_day_start(&parse(end_date, "end")?)?;

    if end <= start {
        return Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                "End of the report can't be before its start",
            )
            .into());
    }
    Ok((start, end))
}

/// Rows sorted by worked time, each with its share of `total`.
fn format_rows(mut rows: Vec<ReportRow>, total: f64) -> Vec<String> {
    rows.sort_by(|a, b| b.seconds.total_cmp(&a.seconds));
    rows.into_iter()
        .map(|row| {
            format!(
                "{}\t{}%\t{}",
                format_hhmmss(Some(row.seconds.max(0.) as u64)),
                seconds_percentage(row.seconds, total).truncated(),
                row.name
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate, NaiveTime, TimeZone};

    use crate::api::entities::{CategoryMinimal, TaskWithCategory, WorkReportByTask};

    use super::{format_rows, parse_range, DateStyle, ReportRow};

    fn local(year: i32, month: u32, day: u32, hour: u32) -> chrono::DateTime<Local> {
        let naive = NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap());
        Local.from_local_datetime(&naive).earliest().unwrap()
    }

    #[test]
    fn test_default_range_is_today() {
        let now = local(2023, 12, 12, 15);
        let (start, end) = parse_range(None, None, DateStyle::Uk, now).unwrap();

        assert_eq!(start, local(2023, 12, 12, 0));
        assert_eq!(end, local(2023, 12, 13, 0));
    }

    #[test]
    fn test_explicit_days_are_included() {
        let now = local(2023, 12, 12, 15);
        let (start, end) = parse_range(
            Some("10/12/2023".into()),
            Some("11/12/2023".into()),
            DateStyle::Uk,
            now,
        )
        .unwrap();

        assert_eq!(start, local(2023, 12, 10, 0));
        assert_eq!(end, local(2023, 12, 12, 0));
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let now = local(2023, 12, 12, 15);
        let result = parse_range(
            Some("12/12/2023".into()),
            Some("10/12/2023".into()),
            DateStyle::Uk,
            now,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_rows_are_sorted_with_shares() {
        let rows = vec![
            ReportRow {
                name: "Reading".into(),
                seconds: 900.,
            },
            ReportRow {
                name: "Coding".into(),
                seconds: 2700.,
            },
        ];

        assert_eq!(
            format_rows(rows, 3600.),
            vec!["00:45:00\t75%\tCoding", "00:15:00\t25%\tReading"]
        );
    }

    #[test]
    fn test_task_rows_include_category() {
        let row = ReportRow::from(WorkReportByTask {
            task: TaskWithCategory {
                id: 3,
                name: "Write report".into(),
                category: CategoryMinimal {
                    id: 1,
                    name: Some("Office".into()),
                },
            },
            time: 60.,
        });

        assert_eq!(&*row.name, "Office / Write report");
    }
}
