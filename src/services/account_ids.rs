use chrono::{DateTime, Datelike, Utc};
use mongodb::{
    bson::doc,
    options::ReturnDocument,
    Collection, Database,
};
use rand::Rng;

use crate::errors::{AppError, Result};
use crate::models::counter::{Counter, DOCTOR_ID_SEQUENCE};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Reserves the next doctor sequence number with a single `$inc` upsert, so
/// two concurrent registrations can never be handed the same value.
pub async fn allocate_doctor_id(db: &Database) -> Result<String> {
    let counters: Collection<Counter> = db.collection("counters");

    let counter = counters
        .find_one_and_update(
            doc! { "_id": DOCTOR_ID_SEQUENCE },
            doc! { "$inc": { "seq": 1 } },
        )
        .upsert(true)
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::internal("counter upsert returned no document"))?;

    Ok(format_doctor_id(counter.seq))
}

pub fn format_doctor_id(seq: i64) -> String {
    format!("DOC{:03}", seq)
}

/// Patient account number: registration date (yymmdd) + first two characters
/// of the name, lower-cased + two random base-36 characters.
pub fn generate_patient_id(name: &str, now: DateTime<Utc>) -> String {
    let date_part = format!(
        "{:02}{:02}{:02}",
        now.year() % 100,
        now.month(),
        now.day()
    );

    let name_part: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(2)
        .flat_map(|c| c.to_lowercase())
        .collect();

    let mut rng = rand::thread_rng();
    let suffix: String = (0..2)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    format!("{}{}{}", date_part, name_part, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use regex::Regex;

    #[test]
    fn doctor_id_is_zero_padded() {
        assert_eq!(format_doctor_id(1), "DOC001");
        assert_eq!(format_doctor_id(42), "DOC042");
        assert_eq!(format_doctor_id(999), "DOC999");
        // sequence can outgrow the pad without colliding
        assert_eq!(format_doctor_id(1000), "DOC1000");
    }

    #[test]
    fn patient_id_matches_documented_pattern() {
        let now = Utc.with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap();
        let id = generate_patient_id("Arun", now);

        let pattern = Regex::new(r"^\d{6}[a-z]{2}[a-z0-9]{2}$").unwrap();
        assert!(pattern.is_match(&id), "unexpected id shape: {}", id);
        assert!(id.starts_with("260828ar"));
    }

    #[test]
    fn patient_id_lowercases_name_prefix() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        let id = generate_patient_id("MEERA", now);
        assert!(id.starts_with("260105me"));
    }

    #[test]
    fn patient_id_tolerates_single_char_name() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        let id = generate_patient_id("J", now);
        assert!(id.starts_with("260105j"));
        assert_eq!(id.len(), 9);
    }

    #[test]
    fn patient_id_suffix_is_base36() {
        let now = Utc.with_ymd_and_hms(2026, 8, 28, 0, 0, 0).unwrap();
        for _ in 0..100 {
            let id = generate_patient_id("Arun", now);
            let suffix = &id[8..];
            assert!(suffix
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
        }
    }
}
