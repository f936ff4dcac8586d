// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::{create_test_coach, create_test_persistence, create_test_student};
use crate::{NotificationData, Persistence, PersistenceError};

#[test]
fn test_notifications_newest_first_and_mark_read() {
    let mut persistence: Persistence = create_test_persistence();
    let coach_id: i64 = create_test_coach(&mut persistence);

    let first: i64 = persistence
        .create_notification(coach_id, "New booking", "Sam booked Tennis")
        .unwrap();
    let second: i64 = persistence
        .create_notification(coach_id, "Booking cancelled", "Sam cancelled Tennis")
        .unwrap();

    let listed: Vec<NotificationData> = persistence.list_notifications(coach_id).unwrap();
    let ids: Vec<i64> = listed.iter().map(|n| n.notification_id).collect();
    assert_eq!(ids, vec![second, first]);
    assert!(listed.iter().all(|n| !n.is_read));

    persistence.mark_notification_read(first, coach_id).unwrap();

    let listed: Vec<NotificationData> = persistence.list_notifications(coach_id).unwrap();
    assert!(listed.iter().any(|n| n.notification_id == first && n.is_read));
}

#[test]
fn test_cannot_mark_someone_elses_notification() {
    let mut persistence: Persistence = create_test_persistence();
    let coach_id: i64 = create_test_coach(&mut persistence);
    let student_id: i64 = create_test_student(&mut persistence, "a@example.com");

    let notification_id: i64 = persistence
        .create_notification(coach_id, "Title", "Body")
        .unwrap();

    assert!(matches!(
        persistence.mark_notification_read(notification_id, student_id),
        Err(PersistenceError::NotFound(_))
    ));
}
