//! Home-room advisor resolution.
//!
//! The source labels a student's home room with its teacher's full name
//! (`last, first[ middle]`). The label is matched against the source teacher
//! list, and the single match is looked up at the destination by e-mail.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use roster_model::{DestTeacher, Email, EntityId, SourceTeacher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvisorMatch {
    /// No home room, or no teacher carries that name.
    Unassigned,
    /// Several teachers share the name; never guessed.
    Ambiguous(Vec<Email>),
    /// The teacher exists in the source only.
    NotInDestination(Email),
    Found(EntityId),
}

pub fn resolve_advisor(
    home_room: Option<&str>,
    source_teachers: &IndexMap<Email, SourceTeacher>,
    destination_teachers: &BTreeMap<Email, DestTeacher>,
) -> AdvisorMatch {
    let Some(home_room) = home_room else {
        return AdvisorMatch::Unassigned;
    };

    let mut matches: Vec<Email> = source_teachers
        .values()
        .filter(|teacher| teacher.full_name() == home_room)
        .map(|teacher| teacher.email.clone())
        .collect();

    match matches.len() {
        0 => AdvisorMatch::Unassigned,
        1 => {
            let email = matches.remove(0);
            match destination_teachers.get(&email) {
                Some(teacher) => AdvisorMatch::Found(teacher.id),
                None => AdvisorMatch::NotInDestination(email),
            }
        }
        _ => AdvisorMatch::Ambiguous(matches),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(email: &str, first: &str, last: &str) -> (Email, SourceTeacher) {
        let email = Email::new(email).unwrap();
        let mut teacher = SourceTeacher::new(email.clone());
        teacher.first_name = Some(first.to_string());
        teacher.last_name = Some(last.to_string());
        (email, teacher)
    }

    fn destination(email: &str, id: i64) -> (Email, DestTeacher) {
        (
            Email::new(email).unwrap(),
            DestTeacher {
                id: EntityId(id),
                email: Some(email.to_string()),
                first_name: None,
                middle_name: None,
                last_name: None,
                archived: false,
            },
        )
    }

    #[test]
    fn single_match_resolves_to_destination_id() {
        let sources = IndexMap::from([source("ann@school.org", "Ann", "Lee")]);
        let destinations = BTreeMap::from([destination("ann@school.org", 70)]);
        assert_eq!(
            resolve_advisor(Some("Lee, Ann"), &sources, &destinations),
            AdvisorMatch::Found(EntityId(70))
        );
        assert_eq!(
            resolve_advisor(Some("Kim, Bo"), &sources, &destinations),
            AdvisorMatch::Unassigned
        );
        assert_eq!(resolve_advisor(None, &sources, &destinations), AdvisorMatch::Unassigned);
    }

    #[test]
    fn shared_names_are_ambiguous() {
        let sources = IndexMap::from([
            source("ann1@school.org", "Ann", "Lee"),
            source("ann2@school.org", "Ann", "Lee"),
        ]);
        let destinations = BTreeMap::from([destination("ann1@school.org", 70)]);
        assert!(matches!(
            resolve_advisor(Some("Lee, Ann"), &sources, &destinations),
            AdvisorMatch::Ambiguous(emails) if emails.len() == 2
        ));
    }

    #[test]
    fn teacher_missing_at_destination() {
        let sources = IndexMap::from([source("ann@school.org", "Ann", "Lee")]);
        let destinations = BTreeMap::new();
        assert_eq!(
            resolve_advisor(Some("Lee, Ann"), &sources, &destinations),
            AdvisorMatch::NotInDestination(Email::new("ann@school.org").unwrap())
        );
    }
}
