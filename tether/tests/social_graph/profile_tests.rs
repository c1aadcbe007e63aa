use super::support::*;

#[tokio::test]
async fn summary_reports_counts_and_viewer_state() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let graph = ns.client.relationships();
    let ada = ns.user("ada").await;
    let bob = ns.user("bob").await;
    let cy = ns.user("cy").await;

    graph.follow(&ada.id, &bob.id).await.expect("follow");
    graph.follow(&bob.id, &ada.id).await.expect("follow back");
    graph.follow(&cy.id, &bob.id).await.expect("follow");

    let profiles = ns.profiles();
    let own = profiles.summary(&bob.id, Some(&bob.id)).await.expect("own profile");
    assert_eq!(own.follow_state, None);
    assert_eq!((own.counts.followers, own.counts.following), (2, 1));
    assert_eq!(own.details.email, "bob@example.com");

    let anonymous = profiles.summary(&bob.id, None).await.expect("anonymous");
    assert_eq!(anonymous.follow_state, None);

    let by_ada = profiles.summary(&bob.id, Some(&ada.id)).await.expect("ada's view");
    assert_eq!(by_ada.follow_state, Some(FollowState::Mutual));
    let by_cy = profiles.summary(&bob.id, Some(&cy.id)).await.expect("cy's view");
    assert_eq!(by_cy.follow_state, Some(FollowState::Following));
    let of_cy = profiles.summary(&cy.id, Some(&ada.id)).await.expect("ada looks at cy");
    assert_eq!(of_cy.follow_state, Some(FollowState::None));

    let err = profiles.summary(&generate_entity_id(), None).await.expect_err("ghost profile");
    assert!(matches!(err, RepoError::NotFound { .. }), "unexpected error: {err:?}");

    ns.cleanup().await;
}

#[tokio::test]
async fn follower_lists_are_annotated_for_the_viewer() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let graph = ns.client.relationships();
    let star = ns.user("star").await;
    let friend = ns.user("friend").await;
    let stranger = ns.user("stranger").await;
    let viewer = ns.user("viewer").await;

    graph.follow(&friend.id, &star.id).await.expect("follow");
    tick().await;
    graph.follow(&stranger.id, &star.id).await.expect("follow");
    tick().await;
    graph.follow(&viewer.id, &star.id).await.expect("follow");
    graph.follow(&viewer.id, &friend.id).await.expect("follow");
    graph.follow(&friend.id, &viewer.id).await.expect("follow");

    let edges = graph.list_followers(&star.id, None).await.expect("followers");
    let entries = ns.profiles().annotate(Some(&viewer.id), edges).await.expect("annotate");
    let states: Vec<(&str, Option<FollowState>)> = entries
        .iter()
        .map(|entry| (entry.user.username.as_str(), entry.follow_state))
        .collect();
    assert_eq!(
        states,
        vec![
            ("viewer", None),
            ("stranger", Some(FollowState::None)),
            ("friend", Some(FollowState::Mutual)),
        ]
    );
    assert!(entries.iter().all(|entry| entry.followed_at.is_some()));

    let edges = graph.list_followers(&star.id, None).await.expect("followers");
    let anonymous = ns.profiles().annotate(None, edges).await.expect("annotate");
    assert!(anonymous.iter().all(|entry| entry.follow_state.is_none()));

    ns.cleanup().await;
}

#[tokio::test]
async fn directory_lists_everyone_but_the_viewer() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let ada = ns.user("ada").await;
    let bob = ns.user("bob").await;
    ns.client.relationships().follow(&ada.id, &bob.id).await.expect("follow");

    let entries = ns.profiles().directory(Some(&ada.id)).await.expect("directory");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].user.id, bob.id);
    assert_eq!(entries[0].follow_state, Some(FollowState::Following));

    let everyone = ns.profiles().directory(None).await.expect("directory");
    assert_eq!(everyone.len(), 2);

    ns.cleanup().await;
}
