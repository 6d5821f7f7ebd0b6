//! Aggregation and Sorting
//!
//! Flattens every identity's talks into one global list, collapses
//! duplicates that were reached through more than one identity, and
//! produces the two orderings the renderer needs: talks ascending by
//! canonical timestamp and authors ascending by surname.
//!
//! Pure transformations over immutable input; all network work is done by
//! the time these run.

use crate::types::{AuthorIdentity, TalkRecord};
use std::collections::HashMap;

/// Flatten all talks across identities and collapse duplicate talk refs
///
/// Two entries sharing a talk ref are the same underlying event reached
/// via two directory identities of the same person. Exactly one survives:
/// the entry whose first-author name is lexicographically first, so the
/// attribution is deterministic regardless of iteration order. An exact
/// tie keeps the earlier-encountered entry.
pub fn dedupe_talks(identities: &[AuthorIdentity]) -> Vec<TalkRecord> {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut talks: Vec<TalkRecord> = Vec::new();

    for identity in identities {
        for talk in identity.talks.values() {
            match position.get(&talk.talk_ref) {
                Some(&index) => {
                    if talk.first_author_name < talks[index].first_author_name {
                        tracing::debug!(
                            "Duplicate talk {} reattributed '{}' -> '{}'",
                            talk.talk_ref,
                            talks[index].first_author_name,
                            talk.first_author_name
                        );
                        talks[index] = talk.clone();
                    }
                }
                None => {
                    position.insert(talk.talk_ref.clone(), talks.len());
                    talks.push(talk.clone());
                }
            }
        }
    }

    talks
}

/// Deduplicated talks with a timestamp, ascending by start time
///
/// Talks the Normalizer could not parse carry no timestamp and are
/// excluded here; they remain visible in the run report. The sort is
/// stable, so same-minute talks keep their discovery order.
pub fn sorted_talks(identities: &[AuthorIdentity]) -> Vec<TalkRecord> {
    let mut talks: Vec<TalkRecord> = dedupe_talks(identities)
        .into_iter()
        .filter(|talk| talk.canonical_timestamp.is_some())
        .collect();
    talks.sort_by_key(|talk| talk.canonical_timestamp);
    talks
}

/// All identities ascending by surname, ties broken by display name
///
/// The author index lists every resolved identity whether or not it
/// contributed talks.
pub fn sorted_authors(identities: &[AuthorIdentity]) -> Vec<AuthorIdentity> {
    let mut authors = identities.to_vec();
    authors.sort_by(|a, b| {
        a.last_name
            .cmp(&b.last_name)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
    authors
}
