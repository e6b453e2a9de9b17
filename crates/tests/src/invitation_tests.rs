use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn send_creates_pending_invitation_visible_to_both_parties() {
    let app = TestApp::spawn().await;
    let (alice, bob) = app.seed_pair().await;

    let invitation_id = app.invite(&alice, "Bob@X.com").await;

    let resp = app
        .auth_get("/api/invitation/sent", &alice.access_token)
        .send()
        .await
        .unwrap();
    let sent: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["id"], invitation_id.as_str());
    assert_eq!(sent[0]["status"], "pending");
    assert_eq!(sent[0]["invitee_email"], "bob@x.com");
    assert_eq!(sent[0]["origin"], "owner");

    let resp = app
        .auth_get("/api/invitation/received", &bob.access_token)
        .send()
        .await
        .unwrap();
    let received: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["inviter_email"], "alice@x.com");

    // Sending never grants access by itself
    assert!(!app.has_access(&bob, &alice.id).await);
}

#[tokio::test]
async fn duplicate_send_while_pending_conflicts() {
    let app = TestApp::spawn().await;
    let (alice, bob) = app.seed_pair().await;

    app.invite(&alice, &bob.email).await;

    let resp = app
        .auth_post("/api/invitation", &alice.access_token)
        .json(&serde_json::json!({ "invitee_email": bob.email }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "conflict");
}

#[tokio::test]
async fn duplicate_send_while_accepted_conflicts() {
    let app = TestApp::spawn().await;
    let (alice, bob) = app.seed_pair().await;

    app.grant_access(&alice, &bob).await;

    let resp = app
        .auth_post("/api/invitation", &alice.access_token)
        .json(&serde_json::json!({ "invitee_email": bob.email }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn concurrent_sends_for_same_pair_yield_one_invitation() {
    let app = TestApp::spawn().await;
    let (alice, bob) = app.seed_pair().await;

    let body = serde_json::json!({ "invitee_email": bob.email });
    let (first, second) = futures::join!(
        app.auth_post("/api/invitation", &alice.access_token)
            .json(&body)
            .send(),
        app.auth_post("/api/invitation", &alice.access_token)
            .json(&body)
            .send(),
    );

    let mut statuses = vec![
        first.unwrap().status().as_u16(),
        second.unwrap().status().as_u16(),
    ];
    statuses.sort();
    assert_eq!(statuses, vec![201, 409]);

    let resp = app
        .auth_get("/api/invitation/sent", &alice.access_token)
        .send()
        .await
        .unwrap();
    let sent: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(sent.len(), 1);
}

#[tokio::test]
async fn send_succeeds_again_after_decline() {
    let app = TestApp::spawn().await;
    let (alice, bob) = app.seed_pair().await;

    let invitation_id = app.invite(&alice, &bob.email).await;
    let resp = app.respond(&bob, &invitation_id, "declined").await;
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "declined");
    assert_eq!(json["live"], false);

    let second_id = app.invite(&alice, &bob.email).await;
    assert_ne!(invitation_id, second_id);
}

#[tokio::test]
async fn send_succeeds_again_after_revoke() {
    let app = TestApp::spawn().await;
    let (alice, bob) = app.seed_pair().await;

    let invitation_id = app.invite(&alice, &bob.email).await;
    let resp = app
        .auth_delete(
            &format!("/api/invitation/{}", invitation_id),
            &alice.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    app.invite(&alice, &bob.email).await;
}

#[tokio::test]
async fn self_invite_is_rejected() {
    let app = TestApp::spawn().await;
    let (alice, _bob) = app.seed_pair().await;

    for email in ["alice@x.com", " ALICE@x.com "] {
        let resp = app
            .auth_post("/api/invitation", &alice.access_token)
            .json(&serde_json::json!({ "invitee_email": email }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400, "self invite via {email:?}");
    }
}

#[tokio::test]
async fn malformed_email_is_rejected() {
    let app = TestApp::spawn().await;
    let (alice, _bob) = app.seed_pair().await;

    let resp = app
        .auth_post("/api/invitation", &alice.access_token)
        .json(&serde_json::json!({ "invitee_email": "not-an-email" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn accept_grants_directed_access() {
    let app = TestApp::spawn().await;
    let (alice, bob) = app.seed_pair().await;

    let invitation_id = app.invite(&alice, &bob.email).await;
    let resp = app.respond(&bob, &invitation_id, "accepted").await;
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "accepted");

    assert!(app.has_access(&bob, &alice.id).await);
    // The grant is one-directional
    assert!(!app.has_access(&alice, &bob.id).await);
}

#[tokio::test]
async fn decline_leaves_no_access() {
    let app = TestApp::spawn().await;
    let (alice, bob) = app.seed_pair().await;

    let invitation_id = app.invite(&alice, &bob.email).await;
    app.respond(&bob, &invitation_id, "declined").await;

    assert!(!app.has_access(&bob, &alice.id).await);
}

#[tokio::test]
async fn only_invitee_may_respond() {
    let app = TestApp::spawn().await;
    let (alice, bob) = app.seed_pair().await;
    let carol = app.sign_in("idp|carol", "carol@x.com", "Carol").await;

    let invitation_id = app.invite(&alice, &bob.email).await;

    for outsider in [&alice, &carol] {
        let resp = app.respond(outsider, &invitation_id, "accepted").await;
        assert_eq!(resp.status().as_u16(), 404);
    }
    assert!(!app.has_access(&carol, &alice.id).await);
}

#[tokio::test]
async fn responding_twice_fails() {
    let app = TestApp::spawn().await;
    let (alice, bob) = app.seed_pair().await;

    let invitation_id = app.grant_access(&alice, &bob).await;

    let resp = app.respond(&bob, &invitation_id, "declined").await;
    assert_eq!(resp.status().as_u16(), 404);
    // Access survives the rejected second response
    assert!(app.has_access(&bob, &alice.id).await);
}

#[tokio::test]
async fn invalid_decision_is_rejected() {
    let app = TestApp::spawn().await;
    let (alice, bob) = app.seed_pair().await;

    let invitation_id = app.invite(&alice, &bob.email).await;
    let resp = app.respond(&bob, &invitation_id, "expired").await;

    assert!(resp.status().is_client_error());
    assert!(!app.has_access(&bob, &alice.id).await);
}

#[tokio::test]
async fn revoke_requires_inviter_and_pending_status() {
    let app = TestApp::spawn().await;
    let (alice, bob) = app.seed_pair().await;

    let invitation_id = app.invite(&alice, &bob.email).await;

    // The invitee cannot revoke
    let resp = app
        .auth_delete(
            &format!("/api/invitation/{}", invitation_id),
            &bob.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    app.respond(&bob, &invitation_id, "accepted").await;

    // Accepted invitations go through remove-accepted, not revoke
    let resp = app
        .auth_delete(
            &format!("/api/invitation/{}", invitation_id),
            &alice.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    assert!(app.has_access(&bob, &alice.id).await);
}

#[tokio::test]
async fn revoked_invitation_cannot_be_accepted() {
    let app = TestApp::spawn().await;
    let (alice, bob) = app.seed_pair().await;

    let invitation_id = app.invite(&alice, &bob.email).await;
    app.auth_delete(
        &format!("/api/invitation/{}", invitation_id),
        &alice.access_token,
    )
    .send()
    .await
    .unwrap();

    let resp = app.respond(&bob, &invitation_id, "accepted").await;
    assert_eq!(resp.status().as_u16(), 404);
    assert!(!app.has_access(&bob, &alice.id).await);
}

#[tokio::test]
async fn concurrent_revoke_and_accept_have_one_winner() {
    let app = TestApp::spawn().await;
    let (alice, bob) = app.seed_pair().await;

    let invitation_id = app.invite(&alice, &bob.email).await;
    let revoke_path = format!("/api/invitation/{}", invitation_id);

    let (revoked, accepted) = futures::join!(
        app.auth_delete(&revoke_path, &alice.access_token).send(),
        app.respond(&bob, &invitation_id, "accepted"),
    );
    let revoked = revoked.unwrap().status().as_u16();
    let accepted = accepted.status().as_u16();

    match (revoked, accepted) {
        (200, 404) => assert!(!app.has_access(&bob, &alice.id).await),
        (404, 200) => assert!(app.has_access(&bob, &alice.id).await),
        other => panic!("expected exactly one winner, got {other:?}"),
    }
}

#[tokio::test]
async fn remove_accepted_revokes_access_and_deletes_invitation() {
    let app = TestApp::spawn().await;
    let (alice, bob) = app.seed_pair().await;

    let invitation_id = app.grant_access(&alice, &bob).await;
    assert!(app.has_access(&bob, &alice.id).await);

    let resp = app
        .auth_delete(
            &format!("/api/invitation/{}/accepted", invitation_id),
            &alice.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    assert!(!app.has_access(&bob, &alice.id).await);

    let resp = app
        .auth_get("/api/invitation/sent", &alice.access_token)
        .send()
        .await
        .unwrap();
    let sent: Vec<Value> = resp.json().await.unwrap();
    assert!(sent.is_empty());

    let grants = app
        .db
        .collection::<bson::Document>("access_grants")
        .count_documents(bson::doc! {})
        .await
        .unwrap();
    assert_eq!(grants, 0);

    // The deleted invitation is gone for every role
    let resp = app.respond(&bob, &invitation_id, "accepted").await;
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn remove_accepted_requires_inviter_and_accepted_status() {
    let app = TestApp::spawn().await;
    let (alice, bob) = app.seed_pair().await;

    let pending_id = app.invite(&alice, &bob.email).await;
    let resp = app
        .auth_delete(
            &format!("/api/invitation/{}/accepted", pending_id),
            &alice.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    app.respond(&bob, &pending_id, "accepted").await;

    // The delegate must use leave instead
    let resp = app
        .auth_delete(
            &format!("/api/invitation/{}/accepted", pending_id),
            &bob.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    assert!(app.has_access(&bob, &alice.id).await);
}

#[tokio::test]
async fn invitation_to_unregistered_email_is_accepted_after_first_sign_in() {
    let app = TestApp::spawn().await;
    let (alice, _bob) = app.seed_pair().await;

    let invitation_id = app.invite(&alice, "dave@x.com").await;

    let dave = app.sign_in("idp|dave", "dave@x.com", "Dave").await;
    let resp = app.respond(&dave, &invitation_id, "accepted").await;
    assert_eq!(resp.status().as_u16(), 200);

    assert!(app.has_access(&dave, &alice.id).await);
}

#[tokio::test]
async fn malformed_invitation_id_is_bad_request() {
    let app = TestApp::spawn().await;
    let (alice, _bob) = app.seed_pair().await;

    let resp = app
        .auth_delete("/api/invitation/not-an-id", &alice.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}
