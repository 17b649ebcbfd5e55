use std::io::{self, Write};

use chrono::NaiveDate;
use crossterm::style::{Color, Stylize};

use crate::age;
use crate::languages::LanguageByteMap;
use crate::models::{REPO_PAGE_SIZE, RepoListing, RepositorySummary, UserProfile};

pub const TOP_LANGUAGES: usize = 10;
pub const REPO_PREVIEW: usize = 5;

const MIN_PANEL_WIDTH: usize = 50;
const BAR_WIDTH: usize = 20;
const MISSING: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Dashboard,
}

impl Style {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "plain" => Some(Style::Plain),
            "dashboard" => Some(Style::Dashboard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

pub struct ThemeColors {
    pub text: Color,
    pub key: Color,
    pub value: Color,
    pub muted: Color,
}

const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb { r, g, b }
}

impl Theme {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn colors(self) -> ThemeColors {
        match self {
            Theme::Dark => ThemeColors {
                text: rgb(0xc9, 0xd1, 0xd9),
                key: rgb(0xff, 0xa6, 0x57),
                value: rgb(0xa5, 0xd6, 0xff),
                muted: rgb(0x61, 0x6e, 0x7f),
            },
            Theme::Light => ThemeColors {
                text: rgb(0x24, 0x29, 0x2f),
                key: rgb(0xd7, 0x3a, 0x49),
                value: rgb(0x03, 0x66, 0xd6),
                muted: rgb(0x6a, 0x73, 0x7d),
            },
        }
    }
}

/// Everything one run renders.
pub struct Report<'a> {
    pub profile: &'a UserProfile,
    pub listing: &'a RepoListing,
    pub languages: &'a LanguageByteMap,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageShare {
    pub name: String,
    pub bytes: u64,
    pub percent: f64,
}

/// Largest languages first, at most `limit` of them. Equal byte counts keep
/// the map's (alphabetical) order. A zero total is treated as 1.
pub fn language_shares(map: &LanguageByteMap, limit: usize) -> Vec<LanguageShare> {
    let total = map.total().max(1) as f64;

    let mut shares: Vec<LanguageShare> = map
        .iter()
        .map(|(name, bytes)| LanguageShare {
            name: name.to_string(),
            bytes,
            percent: bytes as f64 / total * 100.0,
        })
        .collect();

    shares.sort_by(|a, b| b.bytes.cmp(&a.bytes));
    shares.truncate(limit);
    shares
}

fn text_or_missing(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(MISSING)
}

fn count_or_missing(value: Option<u64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

fn member_for(profile: &UserProfile, today: NaiveDate) -> String {
    profile
        .created_at
        .as_deref()
        .and_then(age::parse_created_at)
        .map(|created| age::account_age(created, today))
        .unwrap_or_else(|| MISSING.to_string())
}

fn repo_line(repo: &RepositorySummary) -> String {
    format!(
        "- {}  | ★ {}  | Forks {}  | Lang: {}",
        repo.display_name(),
        repo.stars(),
        repo.forks(),
        text_or_missing(repo.language.as_deref())
    )
}

// Plain output

pub fn render_plain<W: Write>(out: &mut W, report: &Report<'_>) -> io::Result<()> {
    let profile = report.profile;

    writeln!(out, "\n=== Profile ===")?;
    writeln!(out, "Login: {}", text_or_missing(profile.login.as_deref()))?;
    writeln!(out, "Name : {}", text_or_missing(profile.name.as_deref()))?;
    writeln!(out, "Bio  : {}", text_or_missing(profile.bio.as_deref()))?;
    writeln!(
        out,
        "Followers: {}  • Following: {}",
        count_or_missing(profile.followers),
        count_or_missing(profile.following)
    )?;
    writeln!(out, "Public Repos: {}", count_or_missing(profile.public_repos))?;
    writeln!(out, "Member for: {}", member_for(profile, report.today))?;
    writeln!(out, "Profile URL: {}", text_or_missing(profile.html_url.as_deref()))?;

    let repos = &report.listing.repos;
    writeln!(
        out,
        "\n=== Repos (showing up to {REPO_PREVIEW} of {}) ===",
        repos.len()
    )?;
    for repo in repos.iter().take(REPO_PREVIEW) {
        writeln!(out, "{}", repo_line(repo))?;
    }
    if report.listing.truncated {
        writeln!(
            out,
            "(only the {REPO_PAGE_SIZE} most recently updated repositories were examined)"
        )?;
    }

    writeln!(out, "\n=== Languages (by code size — LIVE) ===")?;
    for share in language_shares(report.languages, TOP_LANGUAGES) {
        writeln!(
            out,
            "- {:<15} {:>12} bytes  ({:5.1}%)",
            share.name, share.bytes, share.percent
        )?;
    }
    if report.languages.is_fallback_only() {
        writeln!(out, "(no language data available; counting repositories instead)")?;
    }

    writeln!(out, "\nDone ✅")?;
    Ok(())
}

// Dashboard output

/// `key: .......... value`, padded with dots to `align_width` characters.
pub fn build_stat_row(key: &str, value: &str, align_width: usize) -> (String, String, String) {
    let key_part = format!("{key}: ");
    let used = key_part.chars().count() + value.chars().count();
    let available = align_width.saturating_sub(used);

    let dots = match available {
        0 => String::new(),
        1 => " ".to_string(),
        2 => ". ".to_string(),
        n => format!("{} ", ".".repeat(n - 1)),
    };

    (key_part, dots, value.to_string())
}

fn build_header_line(label: &str, align_width: usize) -> String {
    let base = format!("{label} ");
    let dash_count = align_width.saturating_sub(base.chars().count()) + 2;
    format!("{base}{}", "-".repeat(dash_count))
}

fn write_header<W: Write>(
    out: &mut W,
    label: &str,
    align_width: usize,
    color: Color,
) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        build_header_line(label, align_width).with(color).bold()
    )
}

fn bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - len))
    }
}

/// Key/value pairs for the dashboard's profile panel. Stars and forks are
/// summed over the listed repositories.
fn profile_rows(report: &Report<'_>) -> Vec<(&'static str, String)> {
    let profile = report.profile;
    let listing = report.listing;

    vec![
        ("Name", text_or_missing(profile.name.as_deref()).to_string()),
        ("Bio", text_or_missing(profile.bio.as_deref()).to_string()),
        ("Followers", count_or_missing(profile.followers)),
        ("Following", count_or_missing(profile.following)),
        ("Public repos", count_or_missing(profile.public_repos)),
        ("Member for", member_for(profile, report.today)),
        ("Stars", listing.total_stars().to_string()),
        ("Forks", listing.total_forks().to_string()),
        ("Profile", text_or_missing(profile.html_url.as_deref()).to_string()),
    ]
}

pub fn render_dashboard<W: Write>(
    out: &mut W,
    report: &Report<'_>,
    theme: Theme,
) -> io::Result<()> {
    let colors = theme.colors();
    let profile = report.profile;
    let listing = report.listing;
    let login = text_or_missing(profile.login.as_deref());

    let rows = profile_rows(report);

    let align_width = rows
        .iter()
        .map(|(k, v)| k.len() + 2 + v.chars().count())
        .max()
        .unwrap_or(0)
        .max(MIN_PANEL_WIDTH);

    writeln!(out)?;
    write_header(out, &format!("{login}@github"), align_width, colors.text)?;
    for (key, value) in &rows {
        let (k, d, v) = build_stat_row(key, value, align_width);
        writeln!(
            out,
            "{}{}{}",
            k.with(colors.key),
            d.with(colors.muted),
            v.with(colors.value)
        )?;
    }

    // Repositories table
    writeln!(out)?;
    write_header(
        out,
        &format!("- Repositories ({} listed)", listing.repos.len()),
        align_width,
        colors.text,
    )?;
    let preview: Vec<&RepositorySummary> = listing.repos.iter().take(REPO_PREVIEW).collect();
    let name_width = preview
        .iter()
        .map(|r| r.display_name().chars().count())
        .max()
        .unwrap_or(0)
        .max("Name".len());

    writeln!(
        out,
        "{}",
        format!(
            "{} {:>6} {:>6}  {}",
            pad("Name", name_width),
            "★",
            "Forks",
            "Language"
        )
        .with(colors.key)
        .bold()
    )?;
    for repo in &preview {
        writeln!(
            out,
            "{} {} {}  {}",
            pad(repo.display_name(), name_width).with(colors.value),
            format!("{:>6}", repo.stars()).with(colors.text),
            format!("{:>6}", repo.forks()).with(colors.text),
            text_or_missing(repo.language.as_deref()).with(colors.muted)
        )?;
    }
    if listing.truncated {
        writeln!(
            out,
            "{}",
            format!("Only the {REPO_PAGE_SIZE} most recently updated repositories were examined.")
                .with(colors.muted)
                .italic()
        )?;
    }

    // Languages table
    writeln!(out)?;
    let found = report.languages.len();
    write_header(
        out,
        &format!("- Languages (top {} of {found})", TOP_LANGUAGES.min(found)),
        align_width,
        colors.text,
    )?;
    let shares = language_shares(report.languages, TOP_LANGUAGES);
    let lang_width = shares
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Language".len());

    for share in &shares {
        writeln!(
            out,
            "{} {} {} {}",
            pad(&share.name, lang_width).with(colors.key),
            bar(share.percent).with(colors.value),
            format!("{:>12} bytes", share.bytes).with(colors.text),
            format!("{:5.1}%", share.percent).with(colors.muted)
        )?;
    }
    if report.languages.is_fallback_only() {
        writeln!(
            out,
            "{}",
            "No language data could be fetched; showing the repository count instead."
                .with(colors.muted)
                .italic()
        )?;
    }

    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::FALLBACK_LABEL;

    fn map_of(pairs: &[(&str, u64)]) -> LanguageByteMap {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn profile() -> UserProfile {
        UserProfile {
            login: Some("octocat".into()),
            name: Some("The Octocat".into()),
            bio: None,
            followers: Some(42),
            following: Some(7),
            public_repos: Some(8),
            html_url: Some("https://github.com/octocat".into()),
            created_at: Some("2011-01-25T18:44:36Z".into()),
            ..Default::default()
        }
    }

    fn repo(name: &str, stars: u64, language: Option<&str>) -> RepositorySummary {
        RepositorySummary {
            name: Some(name.into()),
            stargazers_count: Some(stars),
            forks_count: Some(1),
            language: language.map(String::from),
            ..Default::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, 25).unwrap()
    }

    fn plain(report: &Report<'_>) -> String {
        let mut buf = Vec::new();
        render_plain(&mut buf, report).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn dashboard(report: &Report<'_>) -> String {
        let mut buf = Vec::new();
        render_dashboard(&mut buf, report, Theme::Dark).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn shares_are_percent_of_total() {
        let shares = language_shares(&map_of(&[("Python", 300), ("HTML", 100)]), TOP_LANGUAGES);

        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].name, "Python");
        assert!((shares[0].percent - 75.0).abs() < 1e-9);
        assert_eq!(shares[1].name, "HTML");
        assert!((shares[1].percent - 25.0).abs() < 1e-9);
    }

    #[test]
    fn zero_total_does_not_divide_by_zero() {
        let shares = language_shares(&map_of(&[("Go", 0), ("Rust", 0)]), TOP_LANGUAGES);
        assert!(shares.iter().all(|s| s.percent == 0.0));
    }

    #[test]
    fn only_top_ten_descending_with_stable_ties() {
        let pairs: Vec<(String, u64)> = (0..12u64)
            .map(|i| (format!("Lang{i:02}"), 100 + i))
            .chain([("Aaa".to_string(), 111), ("Zzz".to_string(), 111)])
            .collect();
        let map: LanguageByteMap = pairs.into_iter().collect();
        let shares = language_shares(&map, TOP_LANGUAGES);

        assert_eq!(shares.len(), 10);
        assert_eq!(shares[0].name, "Aaa");
        assert_eq!(shares[1].name, "Lang11");
        assert_eq!(shares[2].name, "Zzz");
        assert!(shares.windows(2).all(|w| w[0].bytes >= w[1].bytes));
    }

    #[test]
    fn stat_row_pads_with_dots() {
        let (k, d, v) = build_stat_row("Stars", "12", 20);
        assert_eq!(k, "Stars: ");
        assert_eq!(v, "12");
        assert_eq!(k.len() + d.len() + v.len(), 20);
        assert!(d.starts_with('.'));

        let (_, d, _) = build_stat_row("Stars", "12", 5);
        assert_eq!(d, "");
    }

    #[test]
    fn bar_is_proportional() {
        assert_eq!(bar(0.0).chars().filter(|c| *c == '█').count(), 0);
        assert_eq!(bar(50.0).chars().filter(|c| *c == '█').count(), BAR_WIDTH / 2);
        assert_eq!(bar(100.0).chars().filter(|c| *c == '█').count(), BAR_WIDTH);
        assert_eq!(bar(100.0).chars().count(), BAR_WIDTH);
    }

    #[test]
    fn plain_layout() {
        let profile = profile();
        let listing = RepoListing::new(
            (0..7)
                .map(|i| repo(&format!("repo{i}"), i, if i == 0 { None } else { Some("Rust") }))
                .collect(),
        );
        let languages = map_of(&[("Python", 300), ("HTML", 100)]);
        let text = plain(&Report {
            profile: &profile,
            listing: &listing,
            languages: &languages,
            today: today(),
        });

        assert!(text.contains("Login: octocat"));
        assert!(text.contains("Name : The Octocat"));
        assert!(text.contains("Bio  : —"));
        assert!(text.contains("Followers: 42  • Following: 7"));
        assert!(text.contains("Member for: 10 years, 0 months, 0 days"));
        assert!(text.contains("=== Repos (showing up to 5 of 7) ==="));
        assert!(text.contains("- repo0  | ★ 0  | Forks 1  | Lang: —"));
        assert!(text.contains("- repo4  | ★ 4  | Forks 1  | Lang: Rust"));
        assert!(!text.contains("repo5"));
        assert!(text.contains("- Python                   300 bytes  ( 75.0%)"));
        assert!(text.contains("- HTML                     100 bytes  ( 25.0%)"));
        assert!(text.trim_end().ends_with("Done ✅"));
        assert!(!text.contains("most recently updated"));
    }

    #[test]
    fn plain_notes_truncation_and_fallback() {
        let profile = UserProfile::default();
        let listing = RepoListing::new(vec![repo("r", 0, None); REPO_PAGE_SIZE]);
        let languages = LanguageByteMap::fallback(REPO_PAGE_SIZE);
        let text = plain(&Report {
            profile: &profile,
            listing: &listing,
            languages: &languages,
            today: today(),
        });

        assert!(text.contains("Login: —"));
        assert!(text.contains("Member for: —"));
        assert!(text.contains("(only the 100 most recently updated repositories were examined)"));
        assert!(text.contains("(no language data available; counting repositories instead)"));
        assert!(text.contains("- Other                    100 bytes  (100.0%)"));
    }

    #[test]
    fn dashboard_shows_profile_repos_and_languages() {
        let profile = profile();
        let listing = RepoListing::new(vec![
            repo("hello-world", 10, Some("Ruby")),
            repo("spoon-knife", 5, None),
        ]);
        let languages = map_of(&[("Ruby", 900), ("HTML", 100)]);
        let text = dashboard(&Report {
            profile: &profile,
            listing: &listing,
            languages: &languages,
            today: today(),
        });

        assert!(text.contains("octocat@github"));
        assert!(text.contains("Member for: "));
        assert!(text.contains("10 years, 0 months, 0 days"));
        assert!(text.contains("- Repositories (2 listed)"));
        assert!(text.contains("hello-world"));
        assert!(text.contains("spoon-knife"));
        assert!(text.contains("- Languages (top 2 of 2)"));
        assert!(text.contains(" 90.0%"));
        assert!(text.contains(" 10.0%"));
        let stars_row = text
            .lines()
            .find(|line| line.contains("Stars: "))
            .expect("stars row");
        assert!(stars_row.contains(".."));
        assert!(stars_row.contains("15"));
        assert!(!stars_row.contains("Forks"));
        assert!(!text.contains("No language data"));
    }

    #[test]
    fn dashboard_flags_fallback_and_truncation() {
        let profile = profile();
        let listing = RepoListing::new(vec![repo("r", 0, None); REPO_PAGE_SIZE]);
        let languages = LanguageByteMap::fallback(REPO_PAGE_SIZE);
        let mut buf = Vec::new();
        render_dashboard(
            &mut buf,
            &Report {
                profile: &profile,
                listing: &listing,
                languages: &languages,
                today: today(),
            },
            Theme::Light,
        )
        .unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Only the 100 most recently updated repositories were examined."));
        assert!(text.contains("No language data could be fetched"));
    }

    #[test]
    fn profile_rows_sum_stars_and_forks() {
        let profile = profile();
        let listing = RepoListing::new(vec![
            repo("hello-world", 10, Some("Ruby")),
            repo("spoon-knife", 5, None),
        ]);
        let languages = map_of(&[("Ruby", 1)]);
        let rows = profile_rows(&Report {
            profile: &profile,
            listing: &listing,
            languages: &languages,
            today: today(),
        });

        assert!(rows.contains(&("Stars", "15".to_string())));
        assert!(rows.contains(&("Forks", "2".to_string())));
        assert!(rows.contains(&("Followers", "42".to_string())));
        assert!(rows.contains(&("Bio", MISSING.to_string())));
    }

    #[test]
    fn real_other_language_gets_no_fallback_note() {
        let profile = profile();
        let listing = RepoListing::new(vec![repo("r", 0, None)]);
        let languages = map_of(&[(FALLBACK_LABEL, 12)]);
        let report = Report {
            profile: &profile,
            listing: &listing,
            languages: &languages,
            today: today(),
        };

        let text = plain(&report);
        assert!(text.contains("- Other"));
        assert!(!text.contains("no language data available"));
        assert!(!dashboard(&report).contains("No language data could be fetched"));
    }

    #[test]
    fn style_and_theme_names() {
        assert_eq!(Style::parse(" Dashboard "), Some(Style::Dashboard));
        assert_eq!(Style::parse("rich"), None);
        assert_eq!(Theme::parse("LIGHT"), Some(Theme::Light));
        assert_eq!(Theme::parse("blue"), None);
    }
}
