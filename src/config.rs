use std::path::PathBuf;

use chrono::{Local, NaiveDate, Weekday};
use clap::Parser;
use reqwest::Url;

use crate::calendar::{Language, WeekdayStyle};

pub const NOON_CPH_MENU_LINK: &str = "https://www.nooncph.dk/ugens-menuer";
pub const SLACK_API_URL: &str = "https://slack.com/api";

/// Everything a run needs, resolved once at start-up.
///
/// Each option can also be given through the environment, which is how the
/// scheduled job configures it.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "noon-menu-bot",
    about = "Post today's Noon lunch menu to a Slack channel"
)]
pub struct Config {
    /// `da` for the Danish pages, anything else for English
    #[arg(long, env = "LANGUAGE", default_value = "en", value_parser = parse_language)]
    pub language: Language,

    /// Weekdays serving the full menu, comma separated (e.g. `tuesday,thursday`)
    #[arg(long, env = "FULL_NOON_DAYS", default_value = "", value_parser = parse_weekday_list)]
    pub full_noon_days: WeekdayList,

    /// Weekdays serving the green menu; when unset every non-full day is green
    #[arg(long, env = "GREEN_NOON_DAYS", value_parser = parse_weekday_list)]
    pub green_noon_days: Option<WeekdayList>,

    /// Post one image per page instead of the PDF
    #[arg(
        long,
        env = "CONVERT_TO_IMAGES",
        default_value = "false",
        default_missing_value = "true",
        num_args = 0..=1,
        action = clap::ArgAction::Set,
        value_parser = parse_flag
    )]
    pub convert_to_images: bool,

    #[arg(long, env = "SLACK_CHANNEL_ID")]
    pub slack_channel_id: String,

    #[arg(long, env = "SLACK_TOKEN", hide_env_values = true)]
    pub slack_token: String,

    /// Page listing the weekly menu PDFs
    #[arg(long, env = "NOON_MENU_URL", default_value = NOON_CPH_MENU_LINK)]
    pub menu_url: Url,

    #[arg(long, env = "SLACK_API_URL", default_value = SLACK_API_URL)]
    pub slack_api_url: Url,

    /// Whether menu links spell the weekday out or abbreviate it
    #[arg(long, env = "WEEKDAY_STYLE", value_enum, default_value_t = WeekdayStyle::Full)]
    pub weekday_style: WeekdayStyle,

    /// Directory for the files written during a run
    #[arg(long, env = "MENU_WORK_DIR", default_value = ".")]
    pub work_dir: PathBuf,

    /// Directory holding the pdfium shared library
    #[arg(long, env = "PDFIUM_LIBRARY_PATH")]
    pub pdfium_library: Option<PathBuf>,

    /// Run as if today were this date (YYYY-MM-DD or YYYY/MM/DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Do everything except talking to Slack
    #[arg(long)]
    pub dry_run: bool,
}

impl Config {
    pub fn run_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn green_noon_days(&self) -> Option<&[Weekday]> {
        self.green_noon_days.as_ref().map(WeekdayList::as_slice)
    }
}

/// A comma separated list of weekdays as it appears in the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekdayList(Vec<Weekday>);

impl WeekdayList {
    pub fn new(days: impl Into<Vec<Weekday>>) -> Self {
        WeekdayList(days.into())
    }

    pub fn as_slice(&self) -> &[Weekday] {
        &self.0
    }
}

fn parse_language(input: &str) -> Result<Language, String> {
    Ok(Language::from_code(input))
}

pub fn parse_weekday_list(input: &str) -> Result<WeekdayList, String> {
    let mut days = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let day = part
            .parse::<Weekday>()
            .map_err(|_| format!("{part:?} is not a weekday"))?;
        if !days.contains(&day) {
            days.push(day);
        }
    }
    Ok(WeekdayList(days))
}

/// Accepts the usual spellings of a boolean environment variable.
pub fn parse_flag(input: &str) -> Result<bool, String> {
    match input.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("{other:?} is not a boolean")),
    }
}

pub fn parse_date_param(input: &str) -> Option<NaiveDate> {
    let parts: Vec<_> = input
        .split(|c| c == '-' || c == '/')
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() != 3 {
        return None;
    }
    let year = parts[0].parse::<i32>().ok()?;
    let month = parts[1].parse::<u32>().ok()?;
    let day = parts[2].parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_date_arg(input: &str) -> Result<NaiveDate, String> {
    parse_date_param(input)
        .ok_or_else(|| "Invalid date format. Use YYYY-MM-DD or YYYY/MM/DD.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Vec<&'static str> {
        vec![
            "noon-menu-bot",
            "--slack-channel-id",
            "C123",
            "--slack-token",
            "xoxb-test",
        ]
    }

    #[test]
    fn weekday_list_accepts_names_and_abbreviations() {
        let list = parse_weekday_list("Monday, wed,FRIDAY,,monday").unwrap();
        assert_eq!(
            list.as_slice(),
            &[Weekday::Mon, Weekday::Wed, Weekday::Fri]
        );
        assert!(parse_weekday_list("").unwrap().as_slice().is_empty());
        assert!(parse_weekday_list("funday").is_err());
    }

    #[test]
    fn boolean_like_flags() {
        for truthy in ["true", "TRUE", "1", "yes", "on"] {
            assert_eq!(parse_flag(truthy), Ok(true), "{truthy}");
        }
        for falsy in ["false", "0", "no", "off", ""] {
            assert_eq!(parse_flag(falsy), Ok(false), "{falsy}");
        }
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn date_param_formats() {
        assert_eq!(
            parse_date_param("2024-10-16"),
            NaiveDate::from_ymd_opt(2024, 10, 16)
        );
        assert_eq!(
            parse_date_param("2024/10/16"),
            NaiveDate::from_ymd_opt(2024, 10, 16)
        );
        assert_eq!(parse_date_param("2024-13-01"), None);
        assert_eq!(parse_date_param("16-10"), None);
    }

    #[test]
    fn parses_full_command_line() {
        let mut args = base_args();
        args.extend([
            "--language",
            "da",
            "--full-noon-days",
            "tuesday,thursday",
            "--green-noon-days",
            "monday,thursday",
            "--convert-to-images",
            "yes",
            "--weekday-style",
            "short",
            "--date",
            "2024/10/17",
            "--dry-run",
        ]);
        let config = Config::try_parse_from(args).unwrap();

        assert_eq!(config.language, Language::Danish);
        assert_eq!(
            config.full_noon_days.as_slice(),
            &[Weekday::Tue, Weekday::Thu]
        );
        assert_eq!(
            config.green_noon_days(),
            Some(&[Weekday::Mon, Weekday::Thu][..])
        );
        assert!(config.convert_to_images);
        assert_eq!(config.weekday_style, WeekdayStyle::Short);
        assert_eq!(config.run_date(), NaiveDate::from_ymd_opt(2024, 10, 17).unwrap());
        assert!(config.dry_run);
        assert_eq!(config.slack_channel_id, "C123");
    }

    #[test]
    fn rejects_bad_date() {
        let mut args = base_args();
        args.extend(["--date", "yesterday"]);
        assert!(Config::try_parse_from(args).is_err());
    }
}
