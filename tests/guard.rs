use chrono::Duration;
use conduit::{
    api::v1::{catchers, health, users, MaybeAuthUser},
    auth::{
        Clock, Keys, MemoryRevocationStore, Principal, RevocationStore, StoreError, SystemClock,
        Tokens, Validator,
    },
    timestamp::Timestamp,
};
use rocket::{
    http::{Header, Status},
    local::blocking::{Client, LocalResponse},
    routes,
};
use serde_json::Value;
use std::sync::Arc;

struct FixedClock(Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

fn tokens(clock: Arc<dyn Clock>) -> Tokens {
    tokens_over(Arc::new(MemoryRevocationStore::new()), clock)
}

fn keys() -> Keys {
    let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/keys");
    Keys::from_pem_files(
        format!("{}/ed25519_private.pem", dir),
        format!("{}/ed25519_public.pem", dir),
    )
    .unwrap()
}

fn tokens_over(store: Arc<dyn RevocationStore>, clock: Arc<dyn Clock>) -> Tokens {
    Tokens::new(
        keys(),
        "api",
        "http://localhost:8080",
        store,
        clock,
    )
}

/// Revocation store whose backend is always unreachable.
struct FailingStore;

impl RevocationStore for FailingStore {
    fn get(&self, _: i64) -> Result<Option<Timestamp>, StoreError> {
        Err(StoreError::Backend("db down".into()))
    }

    fn set(&self, _: i64, _: Timestamp) -> Result<(), StoreError> {
        Err(StoreError::Backend("db down".into()))
    }
}

#[rocket::get("/whoami")]
fn whoami(auth: MaybeAuthUser) -> String {
    match auth.0 {
        Some(user) => user.principal.username,
        None => "anonymous".into(),
    }
}

fn client(tokens: Tokens) -> Client {
    let rocket = rocket::build()
        .manage(tokens)
        .mount("/api", routes![health::check, users::current, whoami])
        .register("/", catchers());
    Client::tracked(rocket).unwrap()
}

fn jane() -> Principal {
    Principal {
        id: 1,
        email: "jane@example.com".into(),
        username: "jane".into(),
        bio: "".into(),
        image: Some("https://example.com/jane.png".into()),
    }
}

fn body(response: LocalResponse<'_>) -> Value {
    serde_json::from_str(&response.into_string().unwrap()).unwrap()
}

#[test]
fn health_needs_no_token() {
    let client = client(tokens(Arc::new(SystemClock)));
    let response = client.get("/api/health").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let json = body(response);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["contents"]["message"], "ok");
}

#[test]
fn current_user_echoes_the_snapshot_and_token() {
    let tokens = tokens(Arc::new(SystemClock));
    let token = tokens.issue(&jane()).unwrap();
    let client = client(tokens);

    let response = client
        .get("/api/user")
        .header(Header::new("Authorization", format!("Token {}", token)))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let json = body(response);
    assert_eq!(json["contents"]["user"]["username"], "jane");
    assert_eq!(json["contents"]["user"]["email"], "jane@example.com");
    assert_eq!(json["contents"]["user"]["token"], token.as_str());
}

#[test]
fn bearer_scheme_is_accepted() {
    let tokens = tokens(Arc::new(SystemClock));
    let token = tokens.issue(&jane()).unwrap();
    let client = client(tokens);

    let response = client
        .get("/api/user")
        .header(Header::new("Authorization", format!("Bearer {}", token)))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
}

#[test]
fn missing_token_is_unauthorized() {
    let client = client(tokens(Arc::new(SystemClock)));
    let response = client.get("/api/user").dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
    let json = body(response);
    assert_eq!(json["status"], "error");
    assert_eq!(json["contents"], "Unauthorized");
}

#[test]
fn every_rejection_looks_the_same() {
    let store = Arc::new(MemoryRevocationStore::new());
    let t0 = Timestamp::now() - Duration::seconds(10);
    let stale = tokens_over(store.clone(), Arc::new(FixedClock(t0)))
        .issue(&jane())
        .unwrap();
    let current = tokens_over(store, Arc::new(FixedClock(t0 + Duration::seconds(1))));
    current.issue(&jane()).unwrap();

    let expired = tokens(Arc::new(FixedClock(Timestamp::now() - Duration::hours(1))))
        .issue(&jane())
        .unwrap();

    let client = client(current);
    for token in [stale.as_str(), expired.as_str(), "garbage"] {
        let response = client
            .get("/api/user")
            .header(Header::new("Authorization", format!("Token {}", token)))
            .dispatch();
        assert_eq!(response.status(), Status::Unauthorized);
        assert_eq!(body(response)["contents"], "Unauthorized");
    }
}

#[test]
fn unknown_route_is_json_404() {
    let client = client(tokens(Arc::new(SystemClock)));
    let response = client.get("/api/nope").dispatch();
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(body(response)["status"], "error");
}

#[test]
fn optional_auth_names_the_viewer() {
    let tokens = tokens(Arc::new(SystemClock));
    let token = tokens.issue(&jane()).unwrap();
    let client = client(tokens);

    let response = client
        .get("/api/whoami")
        .header(Header::new("Authorization", format!("Token {}", token)))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_string().unwrap(), "jane");
}

#[test]
fn optional_auth_falls_back_to_anonymous_on_rejection() {
    let client = client(tokens(Arc::new(SystemClock)));

    let response = client.get("/api/whoami").dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_string().unwrap(), "anonymous");

    let response = client
        .get("/api/whoami")
        .header(Header::new("Authorization", "Token garbage"))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_string().unwrap(), "anonymous");
}

#[test]
fn optional_auth_reports_an_unreachable_store() {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let working = tokens(clock.clone());
    let token = working.issue(&jane()).unwrap();
    let broken = Tokens {
        issuer: working.issuer.clone(),
        validator: Arc::new(Validator::new(
            keys().decoding,
            "api",
            "http://localhost:8080",
            Arc::new(FailingStore),
            clock,
        )),
    };
    let client = client(broken);

    let response = client
        .get("/api/whoami")
        .header(Header::new("Authorization", format!("Token {}", token)))
        .dispatch();
    assert_eq!(response.status(), Status::InternalServerError);
    let json = body(response);
    assert_eq!(json["status"], "error");
    assert_eq!(json["contents"], "Internal error");

    let response = client
        .get("/api/user")
        .header(Header::new("Authorization", format!("Token {}", token)))
        .dispatch();
    assert_eq!(response.status(), Status::InternalServerError);
}
