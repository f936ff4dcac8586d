// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::create_test_session;
use crate::{
    ClassType, CoachingSession, DomainError, MAX_COMMENT_LENGTH, validate_capacity,
    validate_comment, validate_email, validate_full_name, validate_rating,
    validate_session_fields,
};

#[test]
fn test_validate_email_normalizes() {
    assert_eq!(
        validate_email("  Jane.Doe@Example.COM ").unwrap(),
        "jane.doe@example.com"
    );
}

#[test]
fn test_validate_email_rejects_malformed() {
    for bad in ["", "plain", "@example.com", "a@b", "a@.com", "a b@example.com", "a@b@c.com"] {
        assert!(
            matches!(validate_email(bad), Err(DomainError::InvalidEmail(_))),
            "expected '{bad}' to be rejected"
        );
    }
}

#[test]
fn test_validate_full_name() {
    assert_eq!(validate_full_name("  Ana Lima ").unwrap(), "Ana Lima");
    assert!(matches!(
        validate_full_name("   "),
        Err(DomainError::InvalidName(_))
    ));
}

#[test]
fn test_capacity_rules() {
    assert!(validate_capacity(ClassType::Individual, 1).is_ok());
    assert!(validate_capacity(ClassType::Individual, 2).is_err());
    assert!(validate_capacity(ClassType::Group, 1).is_err());
    assert!(validate_capacity(ClassType::Group, 2).is_ok());
    assert!(validate_capacity(ClassType::Group, 50).is_ok());
    assert!(validate_capacity(ClassType::Group, 51).is_err());
}

#[test]
fn test_session_fields_accepts_valid_session() {
    let session: CoachingSession = create_test_session(1, "2026-05-10", "10:00", "11:00");
    assert!(validate_session_fields(&session).is_ok());
}

#[test]
fn test_session_fields_rejects_negative_price() {
    let mut session: CoachingSession = create_test_session(1, "2026-05-10", "10:00", "11:00");
    session.price_cents = -1;
    assert!(matches!(
        validate_session_fields(&session),
        Err(DomainError::InvalidPrice(-1))
    ));
}

#[test]
fn test_session_fields_rejects_blank_sport_and_location() {
    let mut session: CoachingSession = create_test_session(1, "2026-05-10", "10:00", "11:00");
    session.sport = String::from("  ");
    assert!(matches!(
        validate_session_fields(&session),
        Err(DomainError::InvalidSport(_))
    ));

    let mut session: CoachingSession = create_test_session(1, "2026-05-10", "10:00", "11:00");
    session.location = String::new();
    assert!(matches!(
        validate_session_fields(&session),
        Err(DomainError::InvalidLocation(_))
    ));
}

#[test]
fn test_session_fields_rejects_overbooked() {
    let mut session: CoachingSession = create_test_session(1, "2026-05-10", "10:00", "11:00");
    session.student_ids = (1..=9).collect();
    assert!(matches!(
        validate_session_fields(&session),
        Err(DomainError::InvalidCapacity { .. })
    ));
}

#[test]
fn test_rating_bounds() {
    assert!(validate_rating(1).is_ok());
    assert!(validate_rating(5).is_ok());
    assert!(matches!(validate_rating(0), Err(DomainError::InvalidRating(0))));
    assert!(validate_rating(6).is_err());
}

#[test]
fn test_comment_trimmed_and_bounded() {
    assert_eq!(validate_comment(None).unwrap(), None);
    assert_eq!(validate_comment(Some("  ")).unwrap(), None);
    assert_eq!(
        validate_comment(Some(" Great session ")).unwrap(),
        Some(String::from("Great session"))
    );

    let long: String = "x".repeat(MAX_COMMENT_LENGTH + 1);
    assert!(matches!(
        validate_comment(Some(&long)),
        Err(DomainError::CommentTooLong { .. })
    ));
}
