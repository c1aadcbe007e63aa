use super::support::*;

#[tokio::test]
async fn register_then_authenticate() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let identity = ns.client.identity();
    let ada = ns.user("ada").await;

    let signed_in = identity
        .authenticate("ADA@example.com", "correct horse")
        .await
        .expect("authenticate");
    assert_eq!(signed_in.id, ada.id);
    assert!(signed_in.password_hash.starts_with("$argon2"));

    let err = identity.authenticate("ada@example.com", "wrong horse").await.expect_err("bad password");
    assert!(matches!(err, RepoError::Unauthorized));
    let err = identity.authenticate("nobody@example.com", "correct horse").await.expect_err("unknown email");
    assert!(matches!(err, RepoError::Unauthorized));

    ns.cleanup().await;
}

#[tokio::test]
async fn usernames_and_emails_are_unique_ignoring_case() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let identity = ns.client.identity();
    let ada = ns.user("ada").await;

    let err = identity
        .register(NewUser {
            name: "Impostor".to_string(),
            username: "ADA".to_string(),
            email: "other@example.com".to_string(),
            password: "correct horse".to_string(),
        })
        .await
        .expect_err("duplicate username");
    match err {
        RepoError::UniqueConstraintViolation {
            fields,
            existing_entity_id,
            ..
        } => {
            assert_eq!(fields, vec!["username".to_string()]);
            assert_eq!(existing_entity_id, ada.id);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = identity
        .register(NewUser {
            name: "Impostor".to_string(),
            username: "ada_two".to_string(),
            email: "Ada@Example.com".to_string(),
            password: "correct horse".to_string(),
        })
        .await
        .expect_err("duplicate email");
    assert!(matches!(err, RepoError::UniqueConstraintViolation { .. }));
    assert_eq!(identity.count().await.expect("count"), 1);

    ns.cleanup().await;
}

#[tokio::test]
async fn profile_edits_persist() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let identity = ns.client.identity();
    let ada = ns.user("ada").await;

    let updated = identity
        .update_profile(
            &ada.id,
            tether::ProfileUpdate {
                bio: Some("analytical engines".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.bio.as_deref(), Some("analytical engines"));
    assert_eq!(updated.name, ada.name);

    let (_, previous) = identity
        .set_profile_picture(&ada.id, "/uploads/ada.png")
        .await
        .expect("set picture");
    assert_eq!(previous, None);
    let (user, previous) = identity.remove_profile_picture(&ada.id).await.expect("remove picture");
    assert_eq!(user.profile_picture, None);
    assert_eq!(previous.as_deref(), Some("/uploads/ada.png"));

    let reloaded = identity.require(&ada.id).await.expect("reload");
    assert_eq!(reloaded.bio.as_deref(), Some("analytical engines"));

    ns.cleanup().await;
}

#[tokio::test]
async fn stale_profile_write_is_rejected() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let identity = ns.client.identity();
    let ada = ns.user("ada").await;

    // Two readers take the same snapshot; the second writer still holds version 1.
    let mut stale = identity.require(&ada.id).await.expect("snapshot");
    identity
        .update_profile(
            &ada.id,
            tether::ProfileUpdate {
                bio: Some("first".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("first write");

    stale.profile_picture = Some("/uploads/stale.png".to_string());
    stale.version += 1;
    let command = build_user_update(ns.client.keys(), &stale, 1).expect("command");
    let mut conn = ns.client.connection();
    let err = RedisExecutor::new(&mut conn)
        .execute(MutationPlan::single(MutationCommand::UpdateEntity(command)))
        .await
        .expect_err("stale write");
    assert!(matches!(
        err,
        RepoError::VersionConflict {
            expected: Some(1),
            actual: Some(2)
        }
    ));

    let reloaded = identity.require(&ada.id).await.expect("reload");
    assert_eq!(reloaded.bio.as_deref(), Some("first"));
    assert_eq!(reloaded.profile_picture, None);
    assert_eq!(reloaded.version, 2);

    ns.cleanup().await;
}

#[tokio::test]
async fn racing_profile_edits_never_lose_a_write() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let identity = ns.client.identity();
    let ada = ns.user("ada").await;

    let mut expected = identity.require(&ada.id).await.expect("reload");
    for round in 0..10 {
        let bio = format!("bio {round}");
        let picture = format!("/uploads/ada-{round}.png");
        let (updated, pictured) = tokio::join!(
            identity.update_profile(
                &ada.id,
                tether::ProfileUpdate {
                    bio: Some(bio.clone()),
                    ..Default::default()
                },
            ),
            identity.set_profile_picture(&ada.id, &picture),
        );
        match updated {
            Ok(_) => {
                expected.bio = Some(bio);
                expected.version += 1;
            }
            Err(RepoError::VersionConflict { .. }) => {}
            Err(err) => panic!("round {round}: {err}"),
        }
        match pictured {
            Ok(_) => {
                expected.profile_picture = Some(picture);
                expected.version += 1;
            }
            Err(RepoError::VersionConflict { .. }) => {}
            Err(err) => panic!("round {round}: {err}"),
        }

        // Every acknowledged write is visible and a rejected one left nothing behind.
        let reloaded = identity.require(&ada.id).await.expect("reload");
        assert_eq!(reloaded.bio, expected.bio, "round {round}");
        assert_eq!(reloaded.profile_picture, expected.profile_picture, "round {round}");
        assert_eq!(reloaded.version, expected.version, "round {round}");
    }

    ns.cleanup().await;
}

#[tokio::test]
async fn sessions_resolve_until_revoked() {
    let Some(ns) = TestNamespace::connect().await else { return };
    let sessions = ns.client.sessions(60);
    let ada = ns.user("ada").await;

    let session = sessions.issue(&ada.id).await.expect("issue");
    let resolved = sessions.resolve(&session.token).await.expect("resolve");
    assert_eq!(resolved, Some(session.clone()));

    assert!(sessions.revoke(&session.token).await.expect("revoke"));
    assert_eq!(sessions.resolve(&session.token).await.expect("resolve"), None);
    assert!(!sessions.revoke(&session.token).await.expect("revoke again"));
    assert_eq!(sessions.resolve("../../etc").await.expect("malformed"), None);

    ns.cleanup().await;
}
