// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use colored::*;
use kdam::{Bar, tqdm};

/// A spinner-style counter for tracking pages of unknown length
pub fn progress_counter(desc: &str, verbose: bool) -> Bar {
    if !verbose {
        return tqdm!(disable = true);
    }

    tqdm!(
        force_refresh = false,
        desc = progress_timestamp(desc),
        bar_format = "{desc suffix=' '}{count} ({rate:.1}/s)"
    )
}

/// A standardized timestamp prefix for console messages
pub fn progress_timestamp(desc: &str) -> String {
    let time = chrono::Local::now();
    let time = format!(
        "{} | {}",
        time.format("%Y-%m-%d"),
        time.format("%H:%M:%S")
    );

    format!(
        "{} {} {} {} {} {}",
        "[".bold(),
        time,
        "|".bold(),
        "roicopy".truecolor(196, 112, 58).bold(),
        "]".bold(),
        desc,
    )
}

/// Print timestamped statements to console
pub fn progress_log(desc: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("{}", progress_timestamp(desc));
}

/// Print a warning to stderr regardless of verbosity
pub fn progress_warn(scope: &str, desc: &str) {
    eprintln!("{} {}", format!("[roicopy::{}] WARNING:", scope).as_str().yellow(), desc);
}

/// Format numbers to readable thousands format
///
/// # Examples
///
/// ```
/// use roicopy_core::ut::track::thousands_format;
///
/// assert_eq!(thousands_format(1234567), "1,234,567");
/// assert_eq!(thousands_format(1234), "1234");
/// ```
pub fn thousands_format<T>(number: T) -> String
where
    T: std::fmt::Display,
{
    let number = number.to_string();
    if number.len() <= 4 {
        return number;
    }

    number
        .as_bytes()
        .rchunks(3)
        .rev()
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect::<Vec<&str>>()
        .join(",")
}

#[cfg(test)]
mod test {

    use super::*;

    use kdam::BarExt;

    #[test]
    fn test_thousands_format() {
        assert_eq!(thousands_format(0), "0");
        assert_eq!(thousands_format(50), "50");
        assert_eq!(thousands_format(12345), "12,345");
        assert_eq!(thousands_format(100000), "100,000");
    }

    #[test]
    fn test_quiet_counter_updates_silently() {
        let mut pb = progress_counter("Reading ROI pages", false);
        assert!(!pb.update(1).unwrap());
        assert!(!pb.update(1).unwrap());
    }

    #[test]
    fn test_progress_timestamp_contains_desc() {
        let stamp = progress_timestamp("Copying ROIs");
        assert!(stamp.ends_with("Copying ROIs"));
    }
}
