use chrono::{Datelike, NaiveDate, Weekday};

/// Which translation of the menu a run should pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    Danish,
    #[default]
    English,
}

impl Language {
    /// `da` means Danish; every other value falls back to English.
    pub fn from_code(code: &str) -> Self {
        if code.trim().eq_ignore_ascii_case("da") {
            Language::Danish
        } else {
            Language::English
        }
    }
}

/// How the weekday appears in the restaurant's file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum WeekdayStyle {
    /// `mandag`, `tirsdag`, ...
    #[default]
    Full,
    /// `man`, `tir`, ...
    Short,
}

/// The two menus the restaurant serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuVariant {
    Green,
    Full,
}

impl MenuVariant {
    /// Zero-based page of this variant in the weekly menu PDF.
    ///
    /// The document is laid out as green/da, green/en, full/da, full/en.
    pub fn page_index(self, language: Language) -> usize {
        match (self, language) {
            (MenuVariant::Green, Language::Danish) => 0,
            (MenuVariant::Green, Language::English) => 1,
            (MenuVariant::Full, Language::Danish) => 2,
            (MenuVariant::Full, Language::English) => 3,
        }
    }
}

const DANISH_WEEKDAYS: [&str; 7] = [
    "mandag", "tirsdag", "onsdag", "torsdag", "fredag", "lørdag", "søndag",
];

/// Week count since January 1st, offset by the weekday January 1st fell on
/// (Sunday = 0).
pub fn week_number(date: NaiveDate) -> u32 {
    let first_of_jan = NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date);
    let days_since = (date - first_of_jan).num_days() as u32;
    let offset = first_of_jan.weekday().num_days_from_sunday();
    (days_since + offset + 1) / 7
}

pub fn week_marker(date: NaiveDate) -> String {
    format!("_u{}", week_number(date))
}

pub fn danish_weekday(weekday: Weekday) -> &'static str {
    DANISH_WEEKDAYS[weekday.num_days_from_monday() as usize]
}

pub fn weekday_marker(date: NaiveDate, style: WeekdayStyle) -> String {
    let name = danish_weekday(date.weekday());
    match style {
        WeekdayStyle::Full => name.to_string(),
        WeekdayStyle::Short => name.chars().take(3).collect(),
    }
}

/// Variants served on `weekday`, green before full.
///
/// Without an explicit green list every day that is not full is green.
pub fn menu_variants(
    weekday: Weekday,
    full_days: &[Weekday],
    green_days: Option<&[Weekday]>,
) -> Vec<MenuVariant> {
    let is_full = full_days.contains(&weekday);
    let is_green = match green_days {
        Some(days) => days.contains(&weekday),
        None => !is_full,
    };

    let mut variants = Vec::with_capacity(2);
    if is_green {
        variants.push(MenuVariant::Green);
    }
    if is_full {
        variants.push(MenuVariant::Full);
    }
    variants
}

pub fn page_indices(
    weekday: Weekday,
    full_days: &[Weekday],
    green_days: Option<&[Weekday]>,
    language: Language,
) -> Vec<usize> {
    menu_variants(weekday, full_days, green_days)
        .into_iter()
        .map(|variant| variant.page_index(language))
        .collect()
}
