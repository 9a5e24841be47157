use crate::models::{DocumentFormat, MrzField, MrzFields, SegmentationMode};
use crate::processing::engine::TesseractEngine;
use crate::utils::PassportError;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::ops::Range;
use std::path::Path;

const MRZ_CHARSET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789<";
const MIN_MRZ_LINE: usize = 28;

/// Source of MRZ field sets, read from the original (unprocessed) image.
pub trait MrzReader {
    fn read(&self, image_path: &Path) -> Result<MrzFields, PassportError>;
}

impl<R: MrzReader + ?Sized> MrzReader for &R {
    fn read(&self, image_path: &Path) -> Result<MrzFields, PassportError> {
        (**self).read(image_path)
    }
}

/// Reads the MRZ band with a character-restricted Tesseract pass.
pub struct TesseractMrzReader {
    engine: TesseractEngine,
    language: String,
}

impl TesseractMrzReader {
    pub fn new(engine: TesseractEngine, language: &str) -> Self {
        TesseractMrzReader {
            engine,
            language: language.to_string(),
        }
    }
}

impl MrzReader for TesseractMrzReader {
    fn read(&self, image_path: &Path) -> Result<MrzFields, PassportError> {
        let img = image::open(image_path).map_err(|e| {
            PassportError::MrzExtractionError(format!("Failed to open image: {}", e))
        })?;

        let mut png = Vec::new();
        DynamicImage::ImageLuma8(img.to_luma8())
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| PassportError::MrzExtractionError(format!("Failed to encode image: {}", e)))?;

        let text = self
            .engine
            .read_text(&png, &self.language, SegmentationMode::Auto, Some(MRZ_CHARSET))
            .map_err(|e| PassportError::MrzExtractionError(e.to_string()))?;
        log::debug!("MRZ OCR result:\n{}", text);

        MrzParser::parse_text(&text)
    }
}

/// ICAO 9303 machine readable zone parsing.
pub struct MrzParser;

impl MrzParser {
    pub fn parse_text(text: &str) -> Result<MrzFields, PassportError> {
        let (format, lines) = Self::locate(text)
            .ok_or_else(|| PassportError::MrzExtractionError("no valid MRZ found".to_string()))?;
        log::debug!("MRZ located as {:?}: {:?}", format, lines);

        for field in Self::failed_check_digits(format, &lines) {
            log::warn!("MRZ check digit mismatch on {}", field);
        }

        Self::parse_lines(format, &lines)
    }

    /// Find the MRZ block in OCR text. Runs of consecutive MRZ-like lines are
    /// split into windows of two or three lines that fit a document format;
    /// the window with the most matching check digits wins, later on ties.
    pub fn locate(text: &str) -> Option<(DocumentFormat, Vec<String>)> {
        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut current = Vec::new();

        for line in text.lines().map(Self::clean_mrz_line).filter(|l| !l.is_empty()) {
            if line.len() >= MIN_MRZ_LINE && line.contains('<') {
                current.push(line);
            } else if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            groups.push(current);
        }

        groups
            .iter()
            .flat_map(|group| Self::candidates(group))
            .map(|(format, lines)| {
                let passed = 4 - Self::failed_check_digits(format, &lines).len();
                (passed, format, lines)
            })
            .max_by_key(|(passed, _, _)| *passed)
            .map(|(_, format, lines)| (format, lines))
    }

    /// Every window of a candidate group that fits a format, in line order.
    fn candidates(group: &[String]) -> Vec<(DocumentFormat, Vec<String>)> {
        let mut found = Vec::new();
        for start in 0..group.len() {
            if let Some(window) = group.get(start..start + 2) {
                let width = window.iter().map(String::len).max().unwrap_or(0);
                let format = if width >= 40 {
                    Some(DocumentFormat::TD3)
                } else if width >= 34 {
                    Some(DocumentFormat::TD2)
                } else {
                    None
                };
                if let Some(format) = format {
                    found.push((format, Self::fit(window, format)));
                }
            }
            if let Some(window) = group.get(start..start + 3) {
                if window.iter().all(|line| line.len() <= 33) {
                    found.push((DocumentFormat::TD1, Self::fit(window, DocumentFormat::TD1)));
                }
            }
        }
        found
    }

    fn fit(lines: &[String], format: DocumentFormat) -> Vec<String> {
        let width = format.mrz_chars_per_line();
        lines
            .iter()
            .map(|line| {
                let mut fitted: String = line.chars().take(width).collect();
                while fitted.len() < width {
                    fitted.push('<');
                }
                fitted
            })
            .collect()
    }

    /// Uppercase, drop spaces and anything outside the MRZ alphabet.
    fn clean_mrz_line(line: &str) -> String {
        line.chars()
            .map(|c| match c {
                '«' | '‹' => '<',
                other => other.to_ascii_uppercase(),
            })
            .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '<')
            .collect()
    }

    /// Parse fitted MRZ lines (as returned by `locate`) into a field set.
    pub fn parse_lines(format: DocumentFormat, lines: &[String]) -> Result<MrzFields, PassportError> {
        if lines.len() != format.mrz_lines()
            || lines.iter().any(|l| l.len() != format.mrz_chars_per_line() || !l.is_ascii())
        {
            return Err(PassportError::MrzParsingError(format!(
                "expected {} lines of {} characters for {:?}",
                format.mrz_lines(),
                format.mrz_chars_per_line(),
                format
            )));
        }

        let fields = match format {
            DocumentFormat::TD1 => {
                let (l1, l2, l3) = (&lines[0], &lines[1], &lines[2]);
                let (surname, names) = Self::split_names(l3);
                MrzFields::new()
                    .with(MrzField::Type, Self::code(l1, 0..2))
                    .with(MrzField::IssuingCountry, Self::code(l1, 2..5))
                    .with(MrzField::PassportNumber, Self::code(l1, 5..14))
                    .with(MrzField::PersonalNumber, Self::code(l1, 15..30))
                    .with(MrzField::DateOfBirth, Self::code(l2, 0..6))
                    .with(MrzField::Sex, Self::code(l2, 7..8))
                    .with(MrzField::DateOfExpiry, Self::code(l2, 8..14))
                    .with(MrzField::Nationality, Self::code(l2, 15..18))
                    .with(MrzField::Surname, surname)
                    .with(MrzField::GivenNames, names)
            }
            DocumentFormat::TD2 | DocumentFormat::TD3 => {
                let (l1, l2) = (&lines[0], &lines[1]);
                let personal = if format == DocumentFormat::TD3 { 28..42 } else { 28..35 };
                let (surname, names) = Self::split_names(Self::slice(l1, 5..l1.len()));
                MrzFields::new()
                    .with(MrzField::Type, Self::code(l1, 0..2))
                    .with(MrzField::IssuingCountry, Self::code(l1, 2..5))
                    .with(MrzField::Surname, surname)
                    .with(MrzField::GivenNames, names)
                    .with(MrzField::PassportNumber, Self::code(l2, 0..9))
                    .with(MrzField::Nationality, Self::code(l2, 10..13))
                    .with(MrzField::DateOfBirth, Self::code(l2, 13..19))
                    .with(MrzField::Sex, Self::code(l2, 20..21))
                    .with(MrzField::DateOfExpiry, Self::code(l2, 21..27))
                    .with(MrzField::PersonalNumber, Self::code(l2, personal))
            }
        };

        // The MRZ never carries an issue date
        Ok(fields.with(MrzField::IssuingDate, None))
    }

    /// Fields whose check digit does not match, by name.
    pub fn failed_check_digits(format: DocumentFormat, lines: &[String]) -> Vec<&'static str> {
        if lines.len() < format.mrz_lines() {
            return Vec::new();
        }
        let checks: Vec<(&'static str, String, char)> = match format {
            DocumentFormat::TD1 => {
                let (l1, l2) = (&lines[0], &lines[1]);
                let composite = [
                    Self::slice(l1, 5..30),
                    Self::slice(l2, 0..7),
                    Self::slice(l2, 8..15),
                    Self::slice(l2, 18..29),
                ]
                .concat();
                vec![
                    ("number", Self::slice(l1, 5..14).to_string(), Self::char_at(l1, 14)),
                    ("date_of_birth", Self::slice(l2, 0..6).to_string(), Self::char_at(l2, 6)),
                    ("expiration_date", Self::slice(l2, 8..14).to_string(), Self::char_at(l2, 14)),
                    ("composite", composite, Self::char_at(l2, 29)),
                ]
            }
            DocumentFormat::TD2 | DocumentFormat::TD3 => {
                let l2 = &lines[1];
                let end = format.mrz_chars_per_line() - 1;
                let composite = [
                    Self::slice(l2, 0..10),
                    Self::slice(l2, 13..20),
                    Self::slice(l2, 21..end),
                ]
                .concat();
                vec![
                    ("number", Self::slice(l2, 0..9).to_string(), Self::char_at(l2, 9)),
                    ("date_of_birth", Self::slice(l2, 13..19).to_string(), Self::char_at(l2, 19)),
                    ("expiration_date", Self::slice(l2, 21..27).to_string(), Self::char_at(l2, 27)),
                    ("composite", composite, Self::char_at(l2, end)),
                ]
            }
        };

        checks
            .into_iter()
            .filter(|(_, data, check)| {
                let expected = Self::check_digit(data);
                let actual = if *check == '<' { Some(0) } else { check.to_digit(10) };
                actual != Some(expected)
            })
            .map(|(name, _, _)| name)
            .collect()
    }

    /// ICAO 9303 check digit: weights 7, 3, 1 over digit/letter values, `<` = 0.
    pub fn check_digit(data: &str) -> u32 {
        const WEIGHTS: [u32; 3] = [7, 3, 1];
        data.chars()
            .enumerate()
            .map(|(i, c)| {
                let value = match c {
                    '0'..='9' => c as u32 - '0' as u32,
                    'A'..='Z' => c as u32 - 'A' as u32 + 10,
                    _ => 0,
                };
                value * WEIGHTS[i % 3]
            })
            .sum::<u32>()
            % 10
    }

    /// Surname and given names, split on the first `<<`.
    fn split_names(part: &str) -> (Option<String>, Option<String>) {
        let mut halves = part.splitn(2, "<<");
        let surname = halves.next().map(|s| s.replace('<', " ").trim().to_string());
        let names = halves.next().map(|s| s.replace('<', " ").trim().to_string());
        (surname.filter(|s| !s.is_empty()), names)
    }

    /// Field text with `<` fillers removed; `None` when nothing is left.
    fn code(line: &str, range: Range<usize>) -> Option<String> {
        let value = Self::slice(line, range).replace('<', "");
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    fn slice(line: &str, range: Range<usize>) -> &str {
        line.get(range).unwrap_or("")
    }

    fn char_at(line: &str, index: usize) -> char {
        line.as_bytes().get(index).map(|b| *b as char).unwrap_or('<')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TD3_LINE1: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<";
    const TD3_LINE2: &str = "L898902C36UTO7408122F1204159ZE184226B<<<<<10";

    const TD1_LINE1: &str = "I<UTOD231458907<<<<<<<<<<<<<<<";
    const TD1_LINE2: &str = "7408122F1204159UTO<<<<<<<<<<<6";
    const TD1_LINE3: &str = "ERIKSSON<<ANNA<MARIA<<<<<<<<<<";

    #[test]
    fn check_digits_match_icao_specimen() {
        assert_eq!(MrzParser::check_digit("L898902C3"), 6);
        assert_eq!(MrzParser::check_digit("740812"), 2);
        assert_eq!(MrzParser::check_digit("120415"), 9);
        assert_eq!(MrzParser::check_digit("D23145890"), 7);
    }

    #[test]
    fn parses_td3_passport() {
        let text = format!("REPUBLIC OF UTOPIA\n\n{}\n{}\n", TD3_LINE1, TD3_LINE2);
        let fields = MrzParser::parse_text(&text).unwrap();

        assert_eq!(fields.get(MrzField::Type), Some("P"));
        assert_eq!(fields.get(MrzField::IssuingCountry), Some("UTO"));
        assert_eq!(fields.get(MrzField::Surname), Some("ERIKSSON"));
        assert_eq!(fields.get(MrzField::GivenNames), Some("ANNA MARIA"));
        assert_eq!(fields.get(MrzField::PassportNumber), Some("L898902C3"));
        assert_eq!(fields.get(MrzField::Nationality), Some("UTO"));
        assert_eq!(fields.get(MrzField::DateOfBirth), Some("740812"));
        assert_eq!(fields.get(MrzField::Sex), Some("F"));
        assert_eq!(fields.get(MrzField::DateOfExpiry), Some("120415"));
        assert_eq!(fields.get(MrzField::PersonalNumber), Some("ZE184226B"));
        assert_eq!(fields.get(MrzField::IssuingDate), None);
    }

    #[test]
    fn td3_specimen_passes_check_digits() {
        let (format, lines) = MrzParser::locate(&format!("{}\n{}", TD3_LINE1, TD3_LINE2)).unwrap();
        assert_eq!(format, DocumentFormat::TD3);
        assert!(MrzParser::failed_check_digits(format, &lines).is_empty());
    }

    #[test]
    fn parses_td1_card() {
        let text = format!("{}\n{}\n{}", TD1_LINE1, TD1_LINE2, TD1_LINE3);
        let (format, lines) = MrzParser::locate(&text).unwrap();
        assert_eq!(format, DocumentFormat::TD1);
        assert!(MrzParser::failed_check_digits(format, &lines).is_empty());

        let fields = MrzParser::parse_lines(format, &lines).unwrap();
        assert_eq!(fields.get(MrzField::Type), Some("I"));
        assert_eq!(fields.get(MrzField::PassportNumber), Some("D23145890"));
        assert_eq!(fields.get(MrzField::DateOfBirth), Some("740812"));
        assert_eq!(fields.get(MrzField::Nationality), Some("UTO"));
        assert_eq!(fields.get(MrzField::GivenNames), Some("ANNA MARIA"));
        assert_eq!(fields.get(MrzField::PersonalNumber), None);
    }

    #[test]
    fn short_and_spaced_lines_are_fitted() {
        // OCR dropped trailing fillers and inserted spaces
        let text = "PMKOR HONG<<GILDONG<<<<<<<<<<\nM123456784KOR8501011M3001015<<<<<<<<<<<<<<00";
        let (format, lines) = MrzParser::locate(text).unwrap();
        assert_eq!(format, DocumentFormat::TD3);
        assert!(lines.iter().all(|l| l.len() == 44));

        let fields = MrzParser::parse_lines(format, &lines).unwrap();
        assert_eq!(fields.get(MrzField::Type), Some("PM"));
        assert_eq!(fields.get(MrzField::Surname), Some("HONG"));
        assert_eq!(fields.get(MrzField::GivenNames), Some("GILDONG"));
        assert_eq!(fields.get(MrzField::PassportNumber), Some("M12345678"));
    }

    #[test]
    fn wrong_check_digit_is_reported() {
        let broken = TD3_LINE2.replacen("C36", "C35", 1);
        let (format, lines) = MrzParser::locate(&format!("{}\n{}", TD3_LINE1, broken)).unwrap();
        let failed = MrzParser::failed_check_digits(format, &lines);
        assert!(failed.contains(&"number"));
    }

    #[test]
    fn trailing_filler_line_does_not_shift_the_mrz() {
        let text = format!(
            "{}\n{}\nSPECIMEN<<<VOID<<<<<<<<<<<<<<<<<<<<<<<<<<<<<\n",
            TD3_LINE1, TD3_LINE2
        );
        let fields = MrzParser::parse_text(&text).unwrap();

        assert_eq!(fields.get(MrzField::PassportNumber), Some("L898902C3"));
        assert_eq!(fields.get(MrzField::Surname), Some("ERIKSSON"));
        assert_eq!(fields.get(MrzField::IssuingCountry), Some("UTO"));
    }

    #[test]
    fn leading_filler_line_does_not_shift_the_mrz() {
        let text = format!("<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<\n{}\n{}", TD3_LINE1, TD3_LINE2);
        let (format, lines) = MrzParser::locate(&text).unwrap();

        assert_eq!(format, DocumentFormat::TD3);
        assert_eq!(lines, vec![TD3_LINE1.to_string(), TD3_LINE2.to_string()]);
    }

    #[test]
    fn text_without_mrz_is_an_extraction_error() {
        let err = MrzParser::parse_text("PASSPORT\nREPUBLIC OF KOREA\n").unwrap_err();
        assert!(matches!(err, PassportError::MrzExtractionError(_)));
    }

    #[test]
    fn parse_lines_rejects_wrong_shape() {
        let err = MrzParser::parse_lines(DocumentFormat::TD3, &[TD3_LINE1.to_string()]).unwrap_err();
        assert!(matches!(err, PassportError::MrzParsingError(_)));
    }
}
