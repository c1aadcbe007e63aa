use super::support::*;

#[tokio::test]
async fn unauthenticated_viewer_gets_an_empty_feed() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let ada = ns.user("ada").await;
    ns.text_post(&ada, "public?").await;

    let items = ns.feed().feed(None, None).await.expect("anonymous feed");
    assert!(items.is_empty());

    ns.cleanup().await;
}

#[tokio::test]
async fn feed_is_newest_first_and_annotated_per_viewer() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let posts = ns.client.posts();
    let ada = ns.user("ada").await;
    let bob = ns.user("bob").await;

    let older = ns.text_post(&ada, "older").await;
    tick().await;
    let newer = ns.text_post(&bob, "newer").await;
    posts.like(&older.id, &bob.id, LikeMode::Toggle).await.expect("bob likes");
    posts.like(&older.id, &ada.id, LikeMode::Toggle).await.expect("ada likes");
    posts.add_comment(&older.id, &bob.id, "agreed").await.expect("comment");

    let for_bob = ns.feed().feed(Some(&bob.id), None).await.expect("feed");
    let ids: Vec<&str> = for_bob.iter().map(|item| item.post.id.as_str()).collect();
    assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);

    let item = &for_bob[1];
    assert_eq!(item.author.id, ada.id);
    assert_eq!(item.author.username, "ada");
    assert_eq!(item.likes, 2);
    assert!(item.is_liked);
    assert_eq!(item.comments, 1);
    assert!(!for_bob[0].is_liked);
    assert_eq!(for_bob[0].likes, 0);

    posts.unlike(&older.id, &bob.id).await.expect("unlike");
    let again = ns.feed().feed(Some(&bob.id), None).await.expect("feed");
    assert_eq!(again[1].likes, 1);
    assert!(!again[1].is_liked);

    ns.cleanup().await;
}

#[tokio::test]
async fn feed_pages_through_posts() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let ada = ns.user("ada").await;
    for n in 0..5 {
        ns.text_post(&ada, &format!("post {n}")).await;
        tick().await;
    }

    let page = ns
        .feed()
        .feed(Some(&ada.id), Some(tether::Page::new(2, 2)))
        .await
        .expect("second page");
    let bodies: Vec<&str> = page.iter().filter_map(|item| item.post.body.as_deref()).collect();
    assert_eq!(bodies, vec!["post 2", "post 1"]);

    ns.cleanup().await;
}

#[tokio::test]
async fn author_feed_only_shows_that_author() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let ada = ns.user("ada").await;
    let bob = ns.user("bob").await;
    let mine = ns.text_post(&ada, "mine").await;
    ns.text_post(&bob, "theirs").await;

    let items = ns.feed().author_feed(&ada.id, Some(&bob.id), None).await.expect("author feed");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].post.id, mine.id);

    ns.cleanup().await;
}

#[tokio::test]
async fn comments_are_listed_oldest_first_with_authors() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let posts = ns.client.posts();
    let ada = ns.user("ada").await;
    let bob = ns.user("bob").await;
    let post = ns.text_post(&ada, "discuss").await;

    posts.add_comment(&post.id, &bob.id, "first").await.expect("comment");
    tick().await;
    posts.add_comment(&post.id, &ada.id, "second").await.expect("comment");

    let comments = ns.feed().comments_for(&post.id).await.expect("comments");
    let rendered: Vec<(&str, &str)> = comments
        .iter()
        .map(|view| (view.author.username.as_str(), view.comment.body.as_str()))
        .collect();
    assert_eq!(rendered, vec![("bob", "first"), ("ada", "second")]);

    let err = ns.feed().comments_for(&generate_entity_id()).await.expect_err("ghost post");
    assert!(matches!(err, RepoError::NotFound { .. }), "unexpected error: {err:?}");

    ns.cleanup().await;
}
