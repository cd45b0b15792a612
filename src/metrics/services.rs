use serde::Serialize;
use tracing::debug;

use crate::error::AppError;
use crate::metrics::repo::MetricsRepo;
use crate::users::repo_types::User;

/// Ticket status counted as a confirmed attendee.
pub const CONFIRMED_TICKET_STATUS: i32 = 2;

/// Per-creator counts. All fields are `None` when the user is not eligible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub attendees: Option<i64>,
    pub events: Option<i64>,
    pub pictures: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct UserWithMetrics {
    pub user: User,
    pub metrics: Metrics,
}

/// Scrubs the user and, for creators and admins, attaches attendee/event/picture counts.
/// A user with no resolvable role is treated as ineligible.
pub async fn compute_metrics(
    repo: &dyn MetricsRepo,
    user: User,
) -> Result<UserWithMetrics, AppError> {
    let user = user.scrubbed();

    let eligible = user.role().is_some_and(|r| r.is_metrics_eligible());
    if !eligible {
        debug!(user_id = user.id, role = ?user.role_name, "metrics skipped for role");
        return Ok(UserWithMetrics {
            user,
            metrics: Metrics::default(),
        });
    }

    let (attendees, events, pictures) = tokio::try_join!(
        repo.count_attendees(user.id, CONFIRMED_TICKET_STATUS),
        repo.count_events(user.id),
        repo.count_pictures(user.id),
    )?;
    debug!(user_id = user.id, attendees, events, pictures, "metrics computed");

    Ok(UserWithMetrics {
        user,
        metrics: Metrics {
            attendees: Some(attendees),
            events: Some(events),
            pictures: Some(pictures),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::MemoryStore;
    use crate::roles::Role;

    #[tokio::test]
    async fn creator_with_one_event_and_mixed_tickets() {
        let store = MemoryStore::new();
        let u1 = store.seed_user(42, "u1", Some(Role::Creator));
        let e1 = store.add_event(42);
        store.add_ticket(e1, 2);
        store.add_ticket(e1, 1);

        let out = compute_metrics(&store, u1).await.unwrap();
        assert_eq!(
            out.metrics,
            Metrics {
                attendees: Some(1),
                events: Some(1),
                pictures: Some(0),
            }
        );
        assert_eq!(out.user.password, "");
    }

    #[tokio::test]
    async fn creator_without_events_gets_zeros_not_nulls() {
        let store = MemoryStore::new();
        let user = store.seed_user(7, "fresh", Some(Role::Creator));

        let out = compute_metrics(&store, user).await.unwrap();
        assert_eq!(out.metrics.attendees, Some(0));
        assert_eq!(out.metrics.events, Some(0));
        assert_eq!(out.metrics.pictures, Some(0));
    }

    #[tokio::test]
    async fn admin_is_eligible_and_counts_only_own_events() {
        let store = MemoryStore::new();
        let admin = store.seed_user(1, "root", Some(Role::Admin));
        store.seed_user(2, "other", Some(Role::Creator));

        let mine = store.add_event(1);
        store.add_ticket(mine, 2);
        store.add_ticket(mine, 2);
        store.add_photo(mine);
        store.add_photo(mine);
        store.add_photo(mine);
        store.add_event(1);

        let theirs = store.add_event(2);
        store.add_ticket(theirs, 2);
        store.add_photo(theirs);

        let out = compute_metrics(&store, admin).await.unwrap();
        assert_eq!(
            out.metrics,
            Metrics {
                attendees: Some(2),
                events: Some(2),
                pictures: Some(3),
            }
        );
    }

    #[tokio::test]
    async fn attendee_gets_null_metrics() {
        let store = MemoryStore::new();
        let user = store.seed_user(5, "fan", Some(Role::Attendee));
        let ev = store.add_event(5);
        store.add_ticket(ev, 2);

        let out = compute_metrics(&store, user).await.unwrap();
        assert_eq!(out.metrics, Metrics::default());
        assert_eq!(out.metrics.attendees, None);
        assert_eq!(out.user.password, "");
    }

    #[tokio::test]
    async fn missing_role_is_ineligible_not_an_error() {
        let store = MemoryStore::new();
        let user = store.seed_user(9, "orphan", None);

        let out = compute_metrics(&store, user).await.unwrap();
        assert_eq!(out.metrics, Metrics::default());
    }

    #[tokio::test]
    async fn role_name_must_match_exactly() {
        let store = MemoryStore::new();
        let mut user = store.seed_user(6, "maker", Some(Role::Creator));
        let ev = store.add_event(6);
        store.add_ticket(ev, 2);
        user.role_name = Some("creator".into());

        let out = compute_metrics(&store, user).await.unwrap();
        assert_eq!(out.metrics, Metrics::default());
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let store = MemoryStore::new();
        let user = store.seed_user(3, "creator", Some(Role::Creator));
        store.fail_metrics();

        let err = compute_metrics(&store, user).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn null_metrics_serialize_as_null() {
        let json = serde_json::to_value(Metrics::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "attendees": null, "events": null, "pictures": null })
        );
    }
}
