//! Formatting helpers shared across stages.
//!
//! Ages are stored as fractional years. Values below 1.0 are a fixed-point
//! encoding of months in tenths: `0.5` means 5 months. The encoding must
//! round-trip exactly through `format_age_label` and `parse_age_input`.

/// Normalize an age value into the canonical encoding.
///
/// Negative input clamps to 0. Values below 1.0 are snapped onto the
/// month-in-tenths grid so `0.449` and `0.45` both store as `0.4`/`0.5`.
pub fn normalize_age(value: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        return 0.0;
    }
    if value < 1.0 {
        let months = (value * 10.0).round();
        return months / 10.0;
    }
    value
}

/// Format an age for display: `0.5` -> "5mo", `7.0` -> "7", `2.5` -> "2.5".
pub fn format_age_label(age_years: f64) -> String {
    if age_years < 1.0 {
        let months = (age_years * 10.0).round() as i64;
        return format!("{}mo", months);
    }
    if age_years.fract() == 0.0 {
        format!("{}", age_years as i64)
    } else {
        format!("{}", age_years)
    }
}

/// Parse an operator-entered age.
///
/// Accepts plain years ("7", "2.5") and month-suffixed input ("5mo", "18m"):
/// months under 12 map onto the tenths encoding, 12 and above convert to
/// years rounded to one decimal.
pub fn parse_age_input(raw: &str) -> f64 {
    let value = raw.trim().to_lowercase();

    if value.ends_with("mo") || value.ends_with("mos") || value.ends_with('m') {
        let num = value
            .trim_end_matches('s')
            .trim_end_matches('o')
            .trim_end_matches('m')
            .trim();
        let months: f64 = num.parse().unwrap_or(0.0);
        if months < 12.0 {
            return ((months / 10.0) * 10.0).round().max(0.0) / 10.0;
        }
        return ((months / 12.0) * 10.0).round().max(0.0) / 10.0;
    }

    value.parse::<f64>().map(normalize_age).unwrap_or(0.0)
}

/// Derive the catalog age-recommendation label, e.g. "3-7" or "5mo+".
pub fn age_recommendation(min_age: f64, max_age: f64) -> String {
    let min_label = format_age_label(min_age);
    if max_age >= 99.0 {
        format!("{}+", min_label)
    } else {
        format!("{}-{}", min_label, format_age_label(max_age))
    }
}

/// Convert runtime minutes to display format: "22 min", "1 hr 30 min", "2 hr".
pub fn format_runtime(minutes: Option<u32>) -> String {
    let minutes = match minutes {
        Some(m) if m > 0 => m,
        _ => return String::new(),
    };
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        if mins > 0 {
            format!("{} hr {} min", hours, mins)
        } else {
            format!("{} hr", hours)
        }
    } else {
        format!("{} min", mins)
    }
}

/// Year range for a TV show: "2018–Present", "2020–2023", or "2021".
pub fn tv_year_range(first_air: &str, last_air: &str, status: &str) -> String {
    if first_air.len() < 4 {
        return String::new();
    }
    let start_year = &first_air[..4];

    if status == "Ended" && last_air.len() >= 4 {
        let end_year = &last_air[..4];
        if start_year == end_year {
            start_year.to_string()
        } else {
            format!("{}\u{2013}{}", start_year, end_year)
        }
    } else {
        format!("{}\u{2013}Present", start_year)
    }
}

/// Release year for a movie: "2019" or empty if unknown.
pub fn movie_year(release_date: &str) -> String {
    if release_date.len() >= 4 {
        release_date[..4].to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_encoding_round_trips() {
        // Every month count 1..11 must survive format + parse unchanged.
        for m in 1..=11i64 {
            let stored = m as f64 / 10.0;
            let label = format_age_label(stored);
            assert_eq!(label, format!("{}mo", m));
            let parsed = parse_age_input(&label);
            assert_eq!((parsed * 10.0).round() as i64, m, "month {} lost", m);
        }
    }

    #[test]
    fn normalize_age_snaps_sub_year_values() {
        assert_eq!(normalize_age(0.449), 0.4);
        assert_eq!(normalize_age(0.45), 0.5);
        assert_eq!(normalize_age(-2.0), 0.0);
        assert_eq!(normalize_age(7.0), 7.0);
    }

    #[test]
    fn parse_age_input_accepts_years_and_months() {
        assert_eq!(parse_age_input("7"), 7.0);
        assert_eq!(parse_age_input("2.5"), 2.5);
        assert_eq!(parse_age_input("5mo"), 0.5);
        assert_eq!(parse_age_input("18m"), 1.5);
        assert_eq!(parse_age_input("garbage"), 0.0);
    }

    #[test]
    fn age_labels() {
        assert_eq!(format_age_label(0.5), "5mo");
        assert_eq!(format_age_label(7.0), "7");
        assert_eq!(format_age_label(2.5), "2.5");
    }

    #[test]
    fn age_recommendation_labels() {
        assert_eq!(age_recommendation(3.0, 7.0), "3-7");
        assert_eq!(age_recommendation(0.5, 99.0), "5mo+");
        assert_eq!(age_recommendation(3.0, 18.0), "3-18");
    }

    #[test]
    fn runtime_formats() {
        assert_eq!(format_runtime(Some(22)), "22 min");
        assert_eq!(format_runtime(Some(90)), "1 hr 30 min");
        assert_eq!(format_runtime(Some(120)), "2 hr");
        assert_eq!(format_runtime(None), "");
        assert_eq!(format_runtime(Some(0)), "");
    }

    #[test]
    fn year_ranges() {
        assert_eq!(tv_year_range("2018-04-01", "", "Returning Series"), "2018\u{2013}Present");
        assert_eq!(tv_year_range("2020-01-01", "2023-06-01", "Ended"), "2020\u{2013}2023");
        assert_eq!(tv_year_range("2021-01-01", "2021-12-01", "Ended"), "2021");
        assert_eq!(tv_year_range("", "", "Ended"), "");
        assert_eq!(movie_year("2019-07-12"), "2019");
        assert_eq!(movie_year(""), "");
    }
}
