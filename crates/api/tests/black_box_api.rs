use chrono::{Duration as ChronoDuration, Utc};
use eventhub_api::app::{build_router, AppServices};
use eventhub_auth::{JwtClaims, Role};
use eventhub_core::{EventId, UserId};
use eventhub_infra::InMemoryDatabase;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(InMemoryDatabase::new()).await
    }

    /// Same router as prod, backed by `db`, bound to an ephemeral port.
    async fn spawn_with(db: InMemoryDatabase) -> Self {
        let app = build_router(JWT_SECRET, AppServices::from_database(db));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn claims(user_id: i64, role: Role) -> JwtClaims {
    let now = Utc::now();
    JwtClaims {
        sub: UserId::new(user_id),
        role,
        banned: false,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    }
}

fn sign(claims: &JwtClaims, secret: &str) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn mint_jwt(user_id: i64, role: Role) -> String {
    sign(&claims(user_id, role), JWT_SECRET)
}

fn jazz_night() -> serde_json::Value {
    json!({
        "title": "Jazz Night",
        "description": "Live quartet",
        "category": "Concerts",
        "start_date": "2026-11-20",
        "end_date": "2026-11-21",
        "time": "19:30:00",
        "ticket_price": 15,
        "max_ticket": 200,
        "location": "Blue Room",
    })
}

fn blues_night(status: &str) -> serde_json::Value {
    json!({
        "title": "Blues Night",
        "description": "Solo set",
        "category": "Gigs",
        "start_date": "2027-02-01",
        "end_date": "2027-02-01",
        "time": "21:00:00",
        "ticket_price": 40,
        "max_ticket": 80,
        "location": "Cellar",
        "status": status,
    })
}

async fn create_event(client: &reqwest::Client, srv: &TestServer, token: &str) -> serde_json::Value {
    let res = client
        .post(srv.url("/events/"))
        .bearer_auth(token)
        .json(&jazz_night())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/whoami", "/events/"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let srv = TestServer::spawn().await;
    let forged = sign(&claims(7, Role::Organizer), "someone-else");

    let res = reqwest::Client::new()
        .get(srv.url("/whoami"))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_reflects_token_claims() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .get(srv.url("/whoami"))
        .bearer_auth(mint_jwt(7, Role::Organizer))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user_id"], 7);
    assert_eq!(body["role"], "organizer");
}

#[tokio::test]
async fn plain_users_cannot_reach_event_routes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(3, Role::User);

    let res = client
        .post(srv.url("/events/"))
        .bearer_auth(&token)
        .json(&jazz_night())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.get(srv.url("/events/")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn banned_organizers_cannot_manage_events() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let mut banned = claims(7, Role::Organizer);
    banned.banned = true;
    let token = sign(&banned, JWT_SECRET);

    let res = client
        .post(srv.url("/events/"))
        .bearer_auth(&token)
        .json(&jazz_night())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");

    let res = client.get(srv.url("/events/")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.get(srv.url("/whoami")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn event_lifecycle_create_read_update_delete() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(7, Role::Organizer);

    let created = create_event(&client, &srv, &token).await;
    assert_eq!(created["organizer_id"], 7);
    assert_eq!(created["status"], "not_started");
    assert_eq!(created["ticket_price"], 15);
    assert!(created["created_at"].is_string());
    let id = created["id"].as_i64().unwrap();

    let res = client
        .get(srv.url(&format!("/events/?event_id={id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: serde_json::Value = res.json().await.unwrap();
    assert_eq!(fetched, created);

    let res = client.get(srv.url("/events")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let listed: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(listed.len(), 1);

    let res = client
        .put(srv.url(&format!("/events/{id}")))
        .bearer_auth(&token)
        .json(&blues_night("continuing"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["title"], "Blues Night");
    assert_eq!(updated["status"], "continuing");
    assert_eq!(updated["created_at"], created["created_at"]);

    let res = client
        .delete(srv.url(&format!("/events/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(srv.url(&format!("/events/?event_id={id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn another_organizer_cannot_update_or_delete() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let owner = mint_jwt(7, Role::Organizer);
    let intruder = mint_jwt(8, Role::Organizer);

    let created = create_event(&client, &srv, &owner).await;
    let id = created["id"].as_i64().unwrap();

    let res = client
        .put(srv.url(&format!("/events/{id}")))
        .bearer_auth(&intruder)
        .json(&blues_night("canceled"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");

    let res = client
        .delete(srv.url(&format!("/events/{id}")))
        .bearer_auth(&intruder)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(srv.url(&format!("/events/?event_id={id}")))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    let current: serde_json::Value = res.json().await.unwrap();
    assert_eq!(current, created);
}

#[tokio::test]
async fn admins_pass_the_role_guard_but_not_ownership() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let created = create_event(&client, &srv, &mint_jwt(7, Role::Organizer)).await;
    let id = created["id"].as_i64().unwrap();

    let res = client
        .delete(srv.url(&format!("/events/{id}")))
        .bearer_auth(mint_jwt(1, Role::Admin))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_events_are_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(7, Role::Organizer);

    let res = client
        .put(srv.url("/events/999"))
        .bearer_auth(&token)
        .json(&blues_night("finished"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    let res = client
        .delete(srv.url("/events/999"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_payloads_are_bad_requests() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(7, Role::Organizer);

    let mut body = jazz_night();
    body["ticket_price"] = json!(-1);
    let res = client
        .post(srv.url("/events/"))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: serde_json::Value = res.json().await.unwrap();
    assert_eq!(err["error"], "validation_error");

    let res = client
        .put(srv.url("/events/not-a-number"))
        .bearer_auth(&token)
        .json(&blues_night("finished"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let created = create_event(&client, &srv, &token).await;
    let id = created["id"].as_i64().unwrap();
    let res = client
        .put(srv.url(&format!("/events/{id}")))
        .bearer_auth(&token)
        .json(&blues_night("postponed"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // An update replaces every field, so a partial body is refused.
    for omitted in ["location", "status"] {
        let mut partial = blues_night("finished");
        partial.as_object_mut().unwrap().remove(omitted);
        let res = client
            .put(srv.url(&format!("/events/{id}")))
            .bearer_auth(&token)
            .json(&partial)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "accepted body without {omitted}");
        let err: serde_json::Value = res.json().await.unwrap();
        assert_eq!(err["error"], "invalid_body");
    }

    let res = client
        .get(srv.url(&format!("/events/?event_id={id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let current: serde_json::Value = res.json().await.unwrap();
    assert_eq!(current, created);
}

#[tokio::test]
async fn zero_event_id_lists_everything() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(7, Role::Organizer);
    create_event(&client, &srv, &token).await;
    create_event(&client, &srv, &token).await;

    let res = client
        .get(srv.url("/events/?event_id=0"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let listed: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn delete_with_tickets_is_a_conflict() {
    let db = InMemoryDatabase::new();
    let srv = TestServer::spawn_with(db.clone()).await;
    let client = reqwest::Client::new();
    let token = mint_jwt(7, Role::Organizer);

    let created = create_event(&client, &srv, &token).await;
    let id = created["id"].as_i64().unwrap();
    db.seed_ticket(UserId::new(20), EventId::new(id)).unwrap();

    let res = client
        .delete(srv.url(&format!("/events/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .get(srv.url(&format!("/events/?event_id={id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
