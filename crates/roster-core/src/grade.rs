//! Grade label to year-group bucket.
//!
//! Destination year groups are keyed by grade number, one above the source
//! grade (`5` and `Grade 5` land in bucket `6`). Labels that carry no number
//! must be listed explicitly (`KG` is bucket `1` by default).

use roster_model::{GradeRules, IntegrityError};

pub fn grade_bucket(grade: Option<&str>, rules: &GradeRules) -> Result<u32, IntegrityError> {
    let label = grade.map(str::trim).unwrap_or_default();
    if let Some(bucket) = rules.labels.get(label) {
        return Ok(*bucket);
    }

    let digits = label.trim_start_matches(|ch: char| !ch.is_ascii_digit());
    if !digits.is_empty()
        && digits.chars().all(|ch| ch.is_ascii_digit())
        && let Some(bucket) = digits.parse::<u32>().ok().and_then(|n| n.checked_add(1))
    {
        return Ok(bucket);
    }

    Err(IntegrityError::UnmappedGrade {
        grade: label.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn labels_and_numbers() {
        let rules = GradeRules::default();
        assert_eq!(grade_bucket(Some("KG"), &rules), Ok(1));
        assert_eq!(grade_bucket(Some("0"), &rules), Ok(1));
        assert_eq!(grade_bucket(Some("12"), &rules), Ok(13));
        assert_eq!(grade_bucket(Some("Grade 6"), &rules), Ok(7));
    }

    #[test]
    fn unknown_labels_are_rejected() {
        let rules = GradeRules::default();
        for label in ["PK", "", "5A", "Grade"] {
            assert_eq!(
                grade_bucket(Some(label), &rules),
                Err(IntegrityError::UnmappedGrade {
                    grade: label.to_string()
                })
            );
        }
        assert!(grade_bucket(None, &rules).is_err());
    }

    proptest! {
        #[test]
        fn numeric_grades_shift_by_one(
            n in 0u32..1000,
            prefix in prop_oneof![Just(""), Just("G"), Just("Grade "), Just("Y")],
        ) {
            let label = format!("{prefix}{n}");
            prop_assert_eq!(grade_bucket(Some(&label), &GradeRules::default()), Ok(n + 1));
        }
    }
}
