// Field extraction from the free text of the visual zone
use crate::models::{VisualField, VisualFields};
use lazy_static::lazy_static;
use regex::Regex;

/// Date layouts recognized on the visual page, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateShape {
    /// 01 JAN 2023
    DayMonthNameYear,
    /// 2023-01-01, 2023/01/01, 2023.01.01
    YearMonthDay,
    /// 01-01-2023, 1/1/2023, 01.01.2023
    DayMonthYear,
    /// 20230101
    Compact,
    /// JAN 01 2023
    MonthNameDayYear,
    /// 01-JAN-2023
    DashedMonthName,
}

pub struct DatePattern {
    pub shape: DateShape,
    pub regex: Regex,
}

lazy_static! {
    static ref KOREAN_NAME_PATTERN: Regex =
        Regex::new(r"(?:한글성명|성\s*명)\s*:?\s*([가-힣]{2,5})").unwrap();

    static ref AUTHORITY_PATTERN: Regex =
        Regex::new(r"(?:Authority|발행관청)\s*:?\s*(.+)").unwrap();

    static ref ISSUE_LABEL_PATTERN: Regex =
        Regex::new(r"(?i)(?:date\s*of\s*issue|발급일)").unwrap();

    static ref CANONICAL_DATE_PATTERN: Regex =
        Regex::new(r"^\d{2}\s+[A-Z]{3}\s+\d{4}").unwrap();

    // Priority order matters: earlier shapes win on the same line
    pub static ref DATE_PATTERNS: Vec<DatePattern> = vec![
        DatePattern {
            shape: DateShape::DayMonthNameYear,
            regex: Regex::new(r"(?i)\d{2}\s+[A-Z]{3}\s+\d{4}").unwrap(),
        },
        DatePattern {
            shape: DateShape::YearMonthDay,
            regex: Regex::new(r"(?i)\d{4}[-/.]\d{2}[-/.]\d{2}").unwrap(),
        },
        DatePattern {
            shape: DateShape::DayMonthYear,
            regex: Regex::new(r"(?i)\d{1,2}[-/.]\d{1,2}[-/.]\d{4}").unwrap(),
        },
        DatePattern {
            shape: DateShape::Compact,
            regex: Regex::new(r"(?i)\d{8}").unwrap(),
        },
        DatePattern {
            shape: DateShape::MonthNameDayYear,
            regex: Regex::new(r"(?i)[A-Z]{3}\s+\d{1,2}\s+\d{4}").unwrap(),
        },
        DatePattern {
            shape: DateShape::DashedMonthName,
            regex: Regex::new(r"(?i)\d{1,2}[-\s][A-Z]{3}[-\s]\d{4}").unwrap(),
        },
    ];
}

pub struct FieldExtractor;

impl FieldExtractor {
    /// Pull the visual-zone fields out of an OCR corpus. Misses are simply absent.
    pub fn extract(corpus: &str) -> VisualFields {
        let rules: [(VisualField, fn(&str) -> Option<String>); 3] = [
            (VisualField::KoreanName, Self::extract_korean_name),
            (VisualField::Authority, Self::extract_authority),
            (VisualField::DateOfIssue, Self::extract_issue_date),
        ];

        rules
            .iter()
            .fold(VisualFields::new(), |fields, (field, rule)| match rule(corpus) {
                Some(value) => fields.with(*field, value),
                None => fields,
            })
    }

    /// Hangul name following a `한글성명` or `성명` label.
    pub fn extract_korean_name(corpus: &str) -> Option<String> {
        KOREAN_NAME_PATTERN
            .captures(corpus)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    }

    /// Rest of the line after an `Authority` or `발행관청` label.
    pub fn extract_authority(corpus: &str) -> Option<String> {
        let captured = AUTHORITY_PATTERN.captures(corpus)?.get(1)?.as_str();
        let line = captured.split('\n').next().unwrap_or_default().trim();
        if line.is_empty() {
            None
        } else {
            Some(line.to_string())
        }
    }

    pub fn extract_issue_date(corpus: &str) -> Option<String> {
        if let Some(date) = Self::labeled_issue_date(corpus) {
            log::info!("Issue date found on labeled line: {}", date);
            return Some(date);
        }
        let date = Self::any_date(corpus)?;
        log::info!("Issue date taken from corpus-wide scan: {}", date);
        Some(date)
    }

    /// First date on the first issue-date labeled line that has one.
    pub fn labeled_issue_date(corpus: &str) -> Option<String> {
        corpus
            .split('\n')
            .filter(|line| ISSUE_LABEL_PATTERN.is_match(line))
            .find_map(|line| {
                let (shape, date) = Self::match_date(line)?;
                log::debug!("Labeled line matched {:?}: {}", shape, date);
                Some(date)
            })
    }

    /// Highest-priority date in `text`, with the layout that matched.
    pub fn match_date(text: &str) -> Option<(DateShape, String)> {
        DATE_PATTERNS.iter().find_map(|pattern| {
            pattern
                .regex
                .find(text)
                .map(|m| (pattern.shape, m.as_str().trim().to_string()))
        })
    }

    /// Corpus-wide fallback: prefer a canonical `DD MMM YYYY` value, else the
    /// first date found in pattern priority order.
    pub fn any_date(corpus: &str) -> Option<String> {
        let found = Self::all_dates(corpus);
        log::debug!("Dates found across corpus: {:?}", found);

        found
            .iter()
            .find(|date| CANONICAL_DATE_PATTERN.is_match(date))
            .or_else(|| found.first())
            .map(|date| date.trim().to_string())
    }

    /// Every date match, grouped by pattern priority, then by position.
    pub fn all_dates(corpus: &str) -> Vec<String> {
        DATE_PATTERNS
            .iter()
            .flat_map(|pattern| {
                pattern.regex.find_iter(corpus).map(move |m| {
                    log::trace!("{:?} date at {}: {}", pattern.shape, m.start(), m.as_str());
                    m.as_str().to_string()
                })
            })
            .collect()
    }
}
