//! Publication state machine.
//!
//! `is_published` is a one-way latch: it moves from `false` to `true` exactly
//! once and `published_date` is stamped on that transition. `is_public` is a
//! separate visibility toggle the author may flip at any time.

use time::OffsetDateTime;

/// Publication fields of a persisted post that drive the next transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicationState {
    pub is_published: bool,
    pub published_date: Option<OffsetDateTime>,
}

impl PublicationState {
    pub const UNPUBLISHED: Self = Self {
        is_published: false,
        published_date: None,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationMode {
    Create,
    Edit,
}

/// Resolved publication fields to persist on the meta view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicationOutcome {
    pub is_public: bool,
    pub is_published: bool,
    pub published_date: Option<OffsetDateTime>,
}

impl PublicationOutcome {
    pub fn state(&self) -> PublicationState {
        PublicationState {
            is_published: self.is_published,
            published_date: self.published_date,
        }
    }
}

pub fn next_publication_state(
    current: PublicationState,
    requested_public: bool,
    mode: PublicationMode,
    now: OffsetDateTime,
) -> PublicationOutcome {
    if mode == PublicationMode::Create {
        return PublicationOutcome {
            is_public: requested_public,
            is_published: requested_public,
            published_date: requested_public.then_some(now),
        };
    }

    match (current.is_published, requested_public) {
        (false, true) => PublicationOutcome {
            is_public: true,
            is_published: true,
            published_date: Some(now),
        },
        // A latched record that lost its date is restamped rather than left null.
        (true, _) => PublicationOutcome {
            is_public: requested_public,
            is_published: true,
            published_date: current.published_date.or(Some(now)),
        },
        (false, false) => PublicationOutcome {
            is_public: false,
            is_published: false,
            published_date: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const CREATED: OffsetDateTime = datetime!(2024-05-01 09:00 UTC);
    const LATER: OffsetDateTime = datetime!(2024-05-02 18:30 UTC);

    #[test]
    fn create_public_publishes_immediately() {
        let outcome = next_publication_state(
            PublicationState::UNPUBLISHED,
            true,
            PublicationMode::Create,
            CREATED,
        );

        assert!(outcome.is_public);
        assert!(outcome.is_published);
        assert_eq!(outcome.published_date, Some(CREATED));
    }

    #[test]
    fn create_private_stays_a_draft() {
        let outcome = next_publication_state(
            PublicationState::UNPUBLISHED,
            false,
            PublicationMode::Create,
            CREATED,
        );

        assert!(!outcome.is_public);
        assert!(!outcome.is_published);
        assert_eq!(outcome.published_date, None);
    }

    #[test]
    fn first_publish_during_edit_stamps_the_date() {
        let outcome = next_publication_state(
            PublicationState::UNPUBLISHED,
            true,
            PublicationMode::Edit,
            LATER,
        );

        assert_eq!(
            outcome,
            PublicationOutcome {
                is_public: true,
                is_published: true,
                published_date: Some(LATER),
            }
        );
    }

    #[test]
    fn hiding_a_published_post_keeps_the_latch() {
        let current = PublicationState {
            is_published: true,
            published_date: Some(CREATED),
        };

        let hidden = next_publication_state(current, false, PublicationMode::Edit, LATER);
        assert!(!hidden.is_public);
        assert!(hidden.is_published);
        assert_eq!(hidden.published_date, Some(CREATED));

        let shown = next_publication_state(hidden.state(), true, PublicationMode::Edit, LATER);
        assert!(shown.is_public);
        assert_eq!(shown.published_date, Some(CREATED));
    }

    #[test]
    fn unpublished_draft_stays_unpublished() {
        let outcome = next_publication_state(
            PublicationState::UNPUBLISHED,
            false,
            PublicationMode::Edit,
            LATER,
        );

        assert_eq!(outcome.state(), PublicationState::UNPUBLISHED);
        assert!(!outcome.is_public);
    }

    #[test]
    fn latched_record_without_date_is_restamped() {
        let current = PublicationState {
            is_published: true,
            published_date: None,
        };

        let outcome = next_publication_state(current, false, PublicationMode::Edit, LATER);
        assert!(outcome.is_published);
        assert_eq!(outcome.published_date, Some(LATER));
    }

    #[test]
    fn no_edit_sequence_unlatches_a_published_post() {
        // Every visibility sequence of length five after the first publish.
        for mask in 0u32..32 {
            let mut state = next_publication_state(
                PublicationState::UNPUBLISHED,
                true,
                PublicationMode::Create,
                CREATED,
            )
            .state();

            for bit in 0..5 {
                let requested = mask & (1 << bit) != 0;
                let outcome =
                    next_publication_state(state, requested, PublicationMode::Edit, LATER);
                assert_eq!(outcome.is_public, requested);
                state = outcome.state();
                assert!(state.is_published, "mask {mask:#07b} unlatched at step {bit}");
                assert_eq!(state.published_date, Some(CREATED));
            }
        }
    }
}
