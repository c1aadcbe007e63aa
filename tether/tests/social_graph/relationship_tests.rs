use super::support::*;

#[tokio::test]
async fn follow_counts_and_repeat_is_a_no_op() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let graph = ns.client.relationships();
    let ada = ns.user("ada").await;
    let bob = ns.user("bob").await;

    let before = graph.counts(&bob.id).await.expect("counts");
    assert_eq!(graph.follow(&ada.id, &bob.id).await.expect("follow"), FollowOutcome::Followed);
    assert!(graph.is_following(&ada.id, &bob.id).await.expect("lookup"));
    assert!(!graph.is_following(&bob.id, &ada.id).await.expect("reverse lookup"));

    let after = graph.counts(&bob.id).await.expect("counts");
    assert_eq!(after.followers, before.followers + 1);
    assert_eq!(graph.counts(&ada.id).await.expect("counts").following, 1);

    assert_eq!(
        graph.follow(&ada.id, &bob.id).await.expect("repeat follow"),
        FollowOutcome::AlreadyFollowing
    );
    assert_eq!(graph.counts(&bob.id).await.expect("counts"), after);

    ns.cleanup().await;
}

#[tokio::test]
async fn self_follow_is_rejected() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let graph = ns.client.relationships();
    let ada = ns.user("ada").await;

    let err = graph.follow(&ada.id, &ada.id).await.expect_err("self follow");
    assert!(is_validation(&err, "self_follow"), "unexpected error: {err:?}");
    assert_eq!(graph.counts(&ada.id).await.expect("counts").following, 0);

    ns.cleanup().await;
}

#[tokio::test]
async fn following_an_unknown_user_is_not_found() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let ada = ns.user("ada").await;

    let err = ns
        .client
        .relationships()
        .follow(&ada.id, &generate_entity_id())
        .await
        .expect_err("ghost followee");
    assert!(matches!(err, RepoError::NotFound { .. }), "unexpected error: {err:?}");

    ns.cleanup().await;
}

#[tokio::test]
async fn mutual_follow_scenario() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let graph = ns.client.relationships();
    let one = ns.user("user_one").await;
    let two = ns.user("user_two").await;

    graph.follow(&one.id, &two.id).await.expect("one follows two");
    assert!(!graph.is_mutual(&one.id, &two.id).await.expect("mutual"));
    assert!(!graph.is_mutual(&two.id, &one.id).await.expect("mutual"));

    graph.follow(&two.id, &one.id).await.expect("two follows back");
    assert!(graph.is_following(&one.id, &two.id).await.expect("lookup"));
    assert!(graph.is_following(&two.id, &one.id).await.expect("lookup"));
    assert!(graph.is_mutual(&one.id, &two.id).await.expect("mutual"));
    assert!(graph.is_mutual(&two.id, &one.id).await.expect("mutual"));

    for user in [&one, &two] {
        let counts = graph.counts(&user.id).await.expect("counts");
        assert_eq!((counts.followers, counts.following), (1, 1));
    }

    ns.cleanup().await;
}

#[tokio::test]
async fn unfollow_restores_counts_and_tolerates_missing_edges() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let graph = ns.client.relationships();
    let ada = ns.user("ada").await;
    let bob = ns.user("bob").await;

    let before = graph.counts(&bob.id).await.expect("counts");
    graph.follow(&ada.id, &bob.id).await.expect("follow");
    assert!(graph.unfollow(&ada.id, &bob.id).await.expect("unfollow"));
    assert!(!graph.is_following(&ada.id, &bob.id).await.expect("lookup"));
    assert_eq!(graph.counts(&bob.id).await.expect("counts"), before);

    assert!(!graph.unfollow(&ada.id, &bob.id).await.expect("second unfollow"));
    assert!(graph.list_followers(&bob.id, None).await.expect("followers").is_empty());

    ns.cleanup().await;
}

#[tokio::test]
async fn listings_are_newest_first() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let graph = ns.client.relationships();
    let star = ns.user("star").await;
    let mut fans = Vec::new();
    for handle in ["fan_a", "fan_b", "fan_c"] {
        let fan = ns.user(handle).await;
        graph.follow(&fan.id, &star.id).await.expect("follow");
        graph.follow(&star.id, &fan.id).await.expect("follow back");
        fans.push(fan);
        tick().await;
    }

    let followers = graph.list_followers(&star.id, None).await.expect("followers");
    let ids: Vec<&str> = followers.iter().map(|edge| edge.user_id.as_str()).collect();
    let expected: Vec<&str> = fans.iter().rev().map(|fan| fan.id.as_str()).collect();
    assert_eq!(ids, expected);
    assert!(followers.windows(2).all(|pair| pair[0].followed_at >= pair[1].followed_at));

    let following = graph.list_following(&star.id, None).await.expect("following");
    assert_eq!(following.len(), 3);
    assert_eq!(following[0].user_id, fans[2].id);

    let second_page = graph
        .list_followers(&star.id, Some(tether::Page::new(2, 2)))
        .await
        .expect("page two");
    assert_eq!(second_page.len(), 1);
    assert_eq!(second_page[0].user_id, fans[0].id);

    ns.cleanup().await;
}

#[tokio::test]
async fn racing_follows_store_one_edge() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let graph = ns.client.relationships();
    let ada = ns.user("ada").await;
    let bob = ns.user("bob").await;

    let (first, second) = tokio::join!(graph.follow(&ada.id, &bob.id), graph.follow(&ada.id, &bob.id));
    let mut outcomes = [first.expect("first"), second.expect("second")];
    outcomes.sort_by_key(|outcome| *outcome == FollowOutcome::AlreadyFollowing);
    assert_eq!(outcomes, [FollowOutcome::Followed, FollowOutcome::AlreadyFollowing]);
    assert_eq!(graph.counts(&bob.id).await.expect("counts").followers, 1);

    ns.cleanup().await;
}
