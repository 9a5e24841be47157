use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    TD1, // ID Card (85.6mm × 54.0mm)
    TD2, // ID Card (105.0mm × 74.0mm)
    TD3, // Passport (125.0mm × 88.0mm)
}

impl DocumentFormat {
    pub fn mrz_lines(&self) -> usize {
        match self {
            DocumentFormat::TD1 => 3,
            DocumentFormat::TD2 => 2,
            DocumentFormat::TD3 => 2,
        }
    }

    pub fn mrz_chars_per_line(&self) -> usize {
        match self {
            DocumentFormat::TD1 => 30,
            DocumentFormat::TD2 => 36,
            DocumentFormat::TD3 => 44,
        }
    }
}

/// Fields an MRZ parser reports, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MrzField {
    Type,
    IssuingCountry,
    IssuingDate,
    PassportNumber,
    Surname,
    GivenNames,
    DateOfBirth,
    Sex,
    Nationality,
    PersonalNumber,
    DateOfExpiry,
}

impl MrzField {
    pub const ALL: [MrzField; 11] = [
        MrzField::Type,
        MrzField::IssuingCountry,
        MrzField::IssuingDate,
        MrzField::PassportNumber,
        MrzField::Surname,
        MrzField::GivenNames,
        MrzField::DateOfBirth,
        MrzField::Sex,
        MrzField::Nationality,
        MrzField::PersonalNumber,
        MrzField::DateOfExpiry,
    ];

    /// Key used by MRZ parsers for this field.
    pub fn key(&self) -> &'static str {
        match self {
            MrzField::Type => "type",
            MrzField::IssuingCountry => "country",
            MrzField::IssuingDate => "date_of_issue",
            MrzField::PassportNumber => "number",
            MrzField::Surname => "surname",
            MrzField::GivenNames => "names",
            MrzField::DateOfBirth => "date_of_birth",
            MrzField::Sex => "sex",
            MrzField::Nationality => "nationality",
            MrzField::PersonalNumber => "personal_number",
            MrzField::DateOfExpiry => "expiration_date",
        }
    }

    /// Key used in the output record.
    pub fn label(&self) -> &'static str {
        match self {
            MrzField::Type => "Type",
            MrzField::IssuingCountry => "Issuing country",
            MrzField::IssuingDate => "Issuing date",
            MrzField::PassportNumber => "Passport No.",
            MrzField::Surname => "Surname",
            MrzField::GivenNames => "Given names",
            MrzField::DateOfBirth => "Date of birth",
            MrzField::Sex => "Sex",
            MrzField::Nationality => "Nationality",
            MrzField::PersonalNumber => "Personal No.",
            MrzField::DateOfExpiry => "Date of expiry",
        }
    }

    pub fn from_key(key: &str) -> Option<MrzField> {
        MrzField::ALL.iter().copied().find(|field| field.key() == key)
    }
}

/// Field set produced by the MRZ branch.
///
/// A failed read keeps only the error message; every field then reads as null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MrzFields {
    values: BTreeMap<MrzField, Option<String>>,
    error: Option<String>,
}

impl MrzFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failed(message: impl Into<String>) -> Self {
        MrzFields {
            values: BTreeMap::new(),
            error: Some(message.into()),
        }
    }

    pub fn with(mut self, field: MrzField, value: Option<String>) -> Self {
        self.values.insert(field, value);
        self
    }

    /// Builds a set from parser keys (`country`, `names`, ...); unknown keys are ignored.
    pub fn from_keyed<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<String>)>,
    {
        pairs
            .into_iter()
            .filter_map(|(key, value)| MrzField::from_key(key).map(|field| (field, value)))
            .fold(MrzFields::new(), |set, (field, value)| set.with(field, value))
    }

    pub fn get(&self, field: MrzField) -> Option<&str> {
        self.values.get(&field).and_then(|value| value.as_deref())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Every field of the fixed vocabulary, null where the parser had nothing.
    pub fn iter(&self) -> impl Iterator<Item = (MrzField, Option<&str>)> + '_ {
        MrzField::ALL.iter().map(move |field| (*field, self.get(*field)))
    }
}

/// Fields recovered from the visible text of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualField {
    KoreanName,
    Authority,
    DateOfIssue,
}

impl VisualField {
    pub fn key(&self) -> &'static str {
        match self {
            VisualField::KoreanName => "한글성명",
            VisualField::Authority => "Authority",
            VisualField::DateOfIssue => "Date of issue",
        }
    }
}

/// Field set produced by the OCR branch. Only found fields are present, in
/// the order they were found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualFields {
    values: Vec<(String, String)>,
}

impl VisualFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, field: VisualField, value: impl Into<String>) -> Self {
        self.with_key(field.key(), value)
    }

    pub fn with_key(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        match self.values.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((key, value)),
        }
        self
    }

    pub fn get(&self, field: VisualField) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == field.key())
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Final merged record, serialized as a flat JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputRecord {
    entries: Vec<(String, Option<String>)>,
    error: Option<String>,
}

impl OutputRecord {
    pub(crate) fn new(error: Option<String>) -> Self {
        OutputRecord {
            entries: Vec::new(),
            error,
        }
    }

    pub(crate) fn set(&mut self, key: &str, value: Option<String>) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Value for `key`; `None` covers both a missing key and a null value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Message of the MRZ failure, if the MRZ branch failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_all_null(&self) -> bool {
        self.entries.iter().all(|(_, v)| v.is_none())
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

impl Serialize for OutputRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(self.error.is_some());
        let mut map = serializer.serialize_map(Some(self.entries.len() + extra))?;
        if let Some(error) = &self.error {
            map.serialize_entry("error", error)?;
        }
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
