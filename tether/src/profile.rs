//! Profile aggregation: counts plus the viewer's follow relationship to one or many targets.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::{
    errors::RepoError,
    models::{Counts, Edge, ProfileDetails, PublicUser},
    store::{IdentityStore, RelationshipStore},
};

/// How a viewer relates to a target, as rendered on Follow / Unfollow / Friends buttons.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowState {
    None,
    Following,
    Mutual,
}

impl FollowState {
    /// Derives the state from the two directed point lookups.
    pub fn derive(viewer_follows_target: bool, target_follows_viewer: bool) -> Self {
        match (viewer_follows_target, target_follows_viewer) {
            (true, true) => FollowState::Mutual,
            (true, false) => FollowState::Following,
            (false, _) => FollowState::None,
        }
    }

    pub fn is_following(self) -> bool {
        matches!(self, FollowState::Following | FollowState::Mutual)
    }

    pub fn is_mutual(self) -> bool {
        self == FollowState::Mutual
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub user: PublicUser,
    pub details: ProfileDetails,
    pub counts: Counts,
    /// Present only for a viewer looking at someone else.
    pub follow_state: Option<FollowState>,
}

/// A follower/following list entry or directory row, annotated for the viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionEntry {
    pub user: PublicUser,
    pub followed_at: Option<DateTime<Utc>>,
    pub follow_state: Option<FollowState>,
}

#[derive(Clone)]
pub struct ProfileAggregator {
    identity: IdentityStore,
    relationships: RelationshipStore,
}

impl ProfileAggregator {
    pub fn new(identity: IdentityStore, relationships: RelationshipStore) -> Self {
        Self {
            identity,
            relationships,
        }
    }

    pub async fn summary(&self, target_id: &str, viewer_id: Option<&str>) -> Result<ProfileSummary, RepoError> {
        let user = self.identity.require(target_id).await?;
        let counts = self.relationships.counts(target_id).await?;
        let follow_state = match viewer_id {
            Some(viewer_id) if viewer_id != target_id => {
                let flags = self.relationships.follow_flags(viewer_id, &[target_id.to_string()]).await?;
                flags.first().map(|(forward, backward)| FollowState::derive(*forward, *backward))
            }
            _ => None,
        };
        Ok(ProfileSummary {
            user: user.public(),
            details: user.details(),
            counts,
            follow_state,
        })
    }

    /// Joins edges with user fields and the viewer's follow state, keeping edge order.
    /// Edges pointing at users that no longer exist are dropped.
    pub async fn annotate(&self, viewer_id: Option<&str>, edges: Vec<Edge>) -> Result<Vec<ConnectionEntry>, RepoError> {
        let ids: Vec<String> = edges.iter().map(|edge| edge.user_id.clone()).collect();
        let users = self.identity.get_many(&ids).await?;
        let states = self.states_for(viewer_id, &ids).await?;
        Ok(edges
            .into_iter()
            .zip(states)
            .filter_map(|(edge, state)| {
                users.get(&edge.user_id).map(|user| ConnectionEntry {
                    user: user.public(),
                    followed_at: Some(edge.followed_at),
                    follow_state: state,
                })
            })
            .collect())
    }

    /// Every other user, annotated for the viewer.
    pub async fn directory(&self, viewer_id: Option<&str>) -> Result<Vec<ConnectionEntry>, RepoError> {
        let users: Vec<_> = self
            .identity
            .list_all()
            .await?
            .into_iter()
            .filter(|user| Some(user.id.as_str()) != viewer_id)
            .collect();
        let ids: Vec<String> = users.iter().map(|user| user.id.clone()).collect();
        let states = self.states_for(viewer_id, &ids).await?;
        Ok(users
            .into_iter()
            .zip(states)
            .map(|(user, state)| ConnectionEntry {
                user: user.public(),
                followed_at: None,
                follow_state: state,
            })
            .collect())
    }

    async fn states_for(&self, viewer_id: Option<&str>, ids: &[String]) -> Result<Vec<Option<FollowState>>, RepoError> {
        let Some(viewer_id) = viewer_id else {
            return Ok(vec![None; ids.len()]);
        };
        let flags = self.relationships.follow_flags(viewer_id, ids).await?;
        Ok(ids
            .iter()
            .zip(flags)
            .map(|(id, (forward, backward))| (id != viewer_id).then(|| FollowState::derive(forward, backward)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn derive_covers_every_combination() {
        assert_eq!(FollowState::derive(false, false), FollowState::None);
        assert_eq!(FollowState::derive(false, true), FollowState::None);
        assert_eq!(FollowState::derive(true, false), FollowState::Following);
        assert_eq!(FollowState::derive(true, true), FollowState::Mutual);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&FollowState::Mutual).unwrap(), "\"mutual\"");
    }

    proptest! {
        #[test]
        fn mutual_is_symmetric(a_follows_b: bool, b_follows_a: bool) {
            let from_a = FollowState::derive(a_follows_b, b_follows_a);
            let from_b = FollowState::derive(b_follows_a, a_follows_b);
            prop_assert_eq!(from_a.is_mutual(), from_b.is_mutual());
            prop_assert_eq!(from_a.is_mutual(), a_follows_b && b_follows_a);
            prop_assert_eq!(from_a.is_following(), a_follows_b);
        }
    }
}
