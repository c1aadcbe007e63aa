use super::support::*;

#[tokio::test]
async fn empty_post_fails_before_any_write() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let posts = ns.client.posts();
    let ada = ns.user("ada").await;

    let err = posts
        .create_post(&ada.id, NewPost::new(Some("   ".to_string()), None))
        .await
        .expect_err("blank post");
    assert!(is_validation(&err, "empty_post"), "unexpected error: {err:?}");
    assert!(posts.list_by_author(&ada.id, None).await.expect("list").is_empty());
    assert!(posts.list_all(None).await.expect("list").is_empty());

    ns.cleanup().await;
}

#[tokio::test]
async fn media_only_post_is_accepted() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let ada = ns.user("ada").await;

    let media = Media {
        reference: "/uploads/holiday.png".to_string(),
        kind: MediaKind::Image,
    };
    let post = ns
        .client
        .posts()
        .create_post(&ada.id, NewPost::new(None, Some(media.clone())))
        .await
        .expect("media post");
    assert_eq!(post.body, None);
    assert_eq!(post.media, Some(media));

    ns.cleanup().await;
}

#[tokio::test]
async fn toggle_likes_never_double_count() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let posts = ns.client.posts();
    let ada = ns.user("ada").await;
    let bob = ns.user("bob").await;
    let post = ns.text_post(&ada, "hello").await;

    let first = posts.like(&post.id, &bob.id, LikeMode::Toggle).await.expect("like");
    assert!(first.liked);
    assert_eq!(first.likes, 1);

    let second = posts.like(&post.id, &bob.id, LikeMode::Toggle).await.expect("toggle off");
    assert!(!second.liked);
    assert_eq!(second.likes, 0);

    ns.cleanup().await;
}

#[tokio::test]
async fn add_only_likes_are_idempotent() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let posts = ns.client.posts();
    let ada = ns.user("ada").await;
    let bob = ns.user("bob").await;
    let post = ns.text_post(&ada, "hello").await;

    let (first, second) = tokio::join!(
        posts.like(&post.id, &bob.id, LikeMode::AddOnly),
        posts.like(&post.id, &bob.id, LikeMode::AddOnly)
    );
    assert_eq!(first.expect("first").likes, 1);
    assert_eq!(second.expect("second").likes, 1);

    let self_like = posts.like(&post.id, &ada.id, LikeMode::AddOnly).await.expect("author like");
    assert_eq!(self_like.likes, 2);

    let unliked = posts.unlike(&post.id, &bob.id).await.expect("unlike");
    assert!(!unliked.liked);
    assert_eq!(unliked.likes, 1);

    ns.cleanup().await;
}

#[tokio::test]
async fn liking_a_missing_post_is_not_found() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let ada = ns.user("ada").await;

    let err = ns
        .client
        .posts()
        .like(&generate_entity_id(), &ada.id, LikeMode::Toggle)
        .await
        .expect_err("ghost post");
    assert!(matches!(err, RepoError::NotFound { .. }), "unexpected error: {err:?}");

    ns.cleanup().await;
}

#[tokio::test]
async fn only_the_author_deletes_a_comment() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let posts = ns.client.posts();
    let ada = ns.user("ada").await;
    let bob = ns.user("bob").await;
    let post = ns.text_post(&ada, "thoughts?").await;

    let err = posts.add_comment(&post.id, &bob.id, "  ").await.expect_err("blank comment");
    assert!(is_validation(&err, "empty_comment"), "unexpected error: {err:?}");

    let comment = posts.add_comment(&post.id, &bob.id, "nice").await.expect("comment");
    let err = posts.delete_comment(&comment.id, &ada.id).await.expect_err("non-author delete");
    assert!(matches!(err, RepoError::Forbidden { .. }), "unexpected error: {err:?}");
    assert_eq!(posts.list_comments(&post.id).await.expect("comments").len(), 1);

    posts.delete_comment(&comment.id, &bob.id).await.expect("author delete");
    assert!(posts.list_comments(&post.id).await.expect("comments").is_empty());
    assert_eq!(posts.get_comment(&comment.id).await.expect("get"), None);

    ns.cleanup().await;
}

#[tokio::test]
async fn deleting_a_post_cascades_to_comments() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let posts = ns.client.posts();
    let ada = ns.user("ada").await;
    let bob = ns.user("bob").await;
    let post = ns.text_post(&ada, "short lived").await;
    let comment = posts.add_comment(&post.id, &bob.id, "first").await.expect("comment");
    posts.like(&post.id, &bob.id, LikeMode::Toggle).await.expect("like");

    let err = posts.delete_post(&post.id, &bob.id).await.expect_err("non-author delete");
    assert!(matches!(err, RepoError::Forbidden { .. }), "unexpected error: {err:?}");

    posts.delete_post(&post.id, &ada.id).await.expect("author delete");
    assert_eq!(posts.get(&post.id).await.expect("get"), None);
    assert_eq!(posts.get_comment(&comment.id).await.expect("get comment"), None);
    assert!(posts.list_all(None).await.expect("list").is_empty());
    assert!(posts.list_by_author(&ada.id, None).await.expect("list").is_empty());

    ns.cleanup().await;
}

#[tokio::test]
async fn listings_are_newest_first() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let posts = ns.client.posts();
    let ada = ns.user("ada").await;
    let bob = ns.user("bob").await;

    let first = ns.text_post(&ada, "one").await;
    tick().await;
    let second = ns.text_post(&bob, "two").await;
    tick().await;
    let third = ns.text_post(&ada, "three").await;

    let by_ada: Vec<String> = posts
        .list_by_author(&ada.id, None)
        .await
        .expect("by author")
        .into_iter()
        .map(|post| post.id)
        .collect();
    assert_eq!(by_ada, vec![third.id.clone(), first.id.clone()]);

    let all: Vec<String> = posts.list_all(None).await.expect("all").into_iter().map(|post| post.id).collect();
    assert_eq!(all, vec![third.id, second.id, first.id]);

    ns.cleanup().await;
}
