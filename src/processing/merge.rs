use crate::models::{MrzField, MrzFields, OutputRecord, VisualField, VisualFields};

/// Reconciles MRZ and visual field sets. MRZ values win whenever they are
/// non-null; visual values only fill gaps.
pub struct MergeEngine;

impl MergeEngine {
    pub fn merge(mrz: &MrzFields, visual: &VisualFields) -> OutputRecord {
        let mut record = OutputRecord::new(mrz.error().map(str::to_string));

        // A failed MRZ read contributes every field as null
        for (field, value) in mrz.iter() {
            record.set(field.label(), value.map(str::to_string));
        }

        for (key, value) in visual.iter() {
            if key == VisualField::DateOfIssue.key() {
                // The visual issue date lands on the MRZ issuing-date key, never its own
                let label = MrzField::IssuingDate.label();
                if record.get(label).map_or(true, str::is_empty) {
                    record.set(label, Some(value.to_string()));
                }
            } else if record.get(key).is_none() {
                record.set(key, Some(value.to_string()));
            }
        }

        record
    }
}
