#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the SafeGuard application.
//!
//! Serves the REST API for emergency contacts, SOS triggers, crime
//! statistics, nearby safe places and AI safety insights. Every `/api`
//! route except `/api/health` requires an `x-session-id` header issued by
//! the CLI.

pub mod auth;
pub mod config;
pub mod error;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use safeguard_ai::{
    advisor::{Advisor, LlmAdvisor},
    insights::InsightAdapter,
};
use safeguard_analytics::SafetyAggregator;
use safeguard_database::DbStore;
use safeguard_database_models::{ContactStore, CrimeStore, EventStore, SessionStore, UserStore};
use safeguard_notify::{ContactNotifier, SmsChannel, twilio::TwilioChannel};
use safeguard_places::{
    PlacesProvider,
    google::GooglePlacesProvider,
    service::{PlacesService, google_service},
};
use safeguard_sos::SosEventService;

pub use config::ServerConfig;
pub use error::ApiError;

/// Optional external collaborators. `None` means unconfigured; each
/// consumer degrades on its own.
#[derive(Clone, Default)]
pub struct Collaborators {
    /// Outbound SMS channel for SOS alerts.
    pub sms: Option<Arc<dyn SmsChannel>>,
    /// Nearby safe places lookup.
    pub places: Option<Arc<dyn PlacesProvider>>,
    /// LLM advisor for safety insights.
    pub advisor: Option<Arc<dyn Advisor>>,
}

impl Collaborators {
    /// Builds every collaborator whose credentials are present in the
    /// environment and logs a warning for each one that is not.
    #[must_use]
    pub fn from_env() -> Self {
        let sms: Option<Arc<dyn SmsChannel>> = match TwilioChannel::from_env() {
            Ok(channel) => Some(Arc::new(channel)),
            Err(e) => {
                log::warn!("SMS alerts disabled: {e}");
                None
            }
        };

        let places: Option<Arc<dyn PlacesProvider>> =
            match GooglePlacesProvider::from_env() {
                Ok(provider) => Some(Arc::new(provider)),
                Err(e) => {
                    log::warn!("Safe places disabled: {e}");
                    None
                }
            };

        let advisor: Option<Arc<dyn Advisor>> = match LlmAdvisor::from_env() {
            Ok(advisor) => Some(Arc::new(advisor)),
            Err(e) => {
                log::warn!("AI insights will use the built-in fallback: {e}");
                None
            }
        };

        Self {
            sms,
            places,
            advisor,
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Resolves `x-session-id` headers to users.
    pub sessions: Arc<dyn SessionStore>,
    /// Emergency contacts.
    pub contacts: Arc<dyn ContactStore>,
    /// Recorded SOS events.
    pub events: Arc<dyn EventStore>,
    /// SOS trigger and alert fan-out.
    pub sos: SosEventService,
    /// Crime statistics and safe places.
    pub aggregator: SafetyAggregator,
    /// Advisor-backed insights with a deterministic fallback.
    pub insights: InsightAdapter,
    /// Safe places categories, radius and limits.
    pub places: PlacesService,
    /// Whether an SMS channel was configured.
    pub sms_configured: bool,
    /// Whether a places provider was configured.
    pub places_configured: bool,
}

impl AppState {
    /// Wires the services over a single store that implements every
    /// persistence trait.
    #[must_use]
    pub fn new<S>(store: &Arc<S>, collaborators: Collaborators, config: &ServerConfig) -> Self
    where
        S: UserStore + SessionStore + ContactStore + EventStore + CrimeStore + 'static,
    {
        let places = google_service();
        let timeout = config.external_call_timeout;

        let sms_configured = collaborators.sms.is_some();
        let places_configured = collaborators.places.is_some();

        let notifier = ContactNotifier::new(collaborators.sms, timeout);
        let sos = SosEventService::new(store.clone(), store.clone(), store.clone(), notifier)
            .with_maps_link_base(config.maps_link_base.clone());

        let aggregator = SafetyAggregator::new(store.clone(), collaborators.places, timeout)
            .with_max_places(places.max_results);

        Self {
            sessions: store.clone(),
            contacts: store.clone(),
            events: store.clone(),
            sos,
            aggregator,
            insights: InsightAdapter::new(collaborators.advisor, timeout),
            places,
            sms_configured,
            places_configured,
        }
    }
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

/// Registers the `/api` routes and extractor configuration.
///
/// The caller provides `web::Data<AppState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).app_data(query_config()).service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/auth/logout", web::post().to(handlers::logout))
            .route("/contacts", web::get().to(handlers::list_contacts))
            .route("/contacts", web::post().to(handlers::create_contact))
            .route("/contacts/{id}", web::delete().to(handlers::delete_contact))
            .route("/sos/trigger", web::post().to(handlers::trigger_sos))
            .route("/sos/recent", web::get().to(handlers::recent_sos))
            .route("/crime/stats", web::get().to(handlers::crime_stats))
            .route("/safe-places", web::get().to(handlers::safe_places))
            .route("/ai/insights", web::get().to(handlers::ai_insights)),
    );
}

/// Starts the SafeGuard API server.
///
/// Opens the `SQLite` database, builds the external collaborators from
/// the environment, and starts the Actix-Web HTTP server. The caller is
/// responsible for the async runtime (e.g. via `#[actix_web::main]`) and
/// for initialising logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the database cannot be opened,
/// or if the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    log::info!("Opening database at {}...", config.database_path.display());
    let store = DbStore::open(&config.database_path)
        .await
        .map_err(std::io::Error::other)?;

    let crime_count = store.count_crimes().await.map_err(std::io::Error::other)?;
    if crime_count == 0 {
        log::warn!("Crime dataset is empty; run `safeguard seed` to populate it");
    } else {
        log::info!("Loaded database with {crime_count} crime records");
    }

    let state = web::Data::new(AppState::new(
        &Arc::new(store),
        Collaborators::from_env(),
        &config,
    ));

    let ServerConfig {
        bind_addr, port, ..
    } = config;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::{http::StatusCode, test};
    use async_trait::async_trait;
    use safeguard_crime_models::{CrimeSeverity, NewCrimeRecord};
    use safeguard_database::MemoryStore;
    use safeguard_geography_models::Coordinate;
    use safeguard_notify::SendError;
    use serde_json::Value;

    use super::*;
    use crate::auth::SESSION_HEADER;

    const FAILING_PHONE: &str = "+15550000002";

    /// Accepts every number except [`FAILING_PHONE`].
    struct FlakySms;

    #[async_trait]
    impl SmsChannel for FlakySms {
        async fn send(&self, phone_number: &str, _body: &str) -> Result<(), SendError> {
            if phone_number == FAILING_PHONE {
                Err(SendError::Rejected {
                    status: 400,
                    message: "unreachable number".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        state: web::Data<AppState>,
        session: String,
    }

    async fn fixture(collaborators: Collaborators) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let user = store
            .create_user("ann@example.com", Some("Ann"))
            .await
            .unwrap();
        let session = store.issue(&user.id).await.unwrap();

        let config = ServerConfig {
            external_call_timeout: Duration::from_millis(200),
            ..ServerConfig::default()
        };
        let state = web::Data::new(AppState::new(&store, collaborators, &config));

        Fixture {
            store,
            state,
            session,
        }
    }

    fn with_sms() -> Collaborators {
        Collaborators {
            sms: Some(Arc::new(FlakySms)),
            ..Collaborators::default()
        }
    }

    macro_rules! app {
        ($fixture:expr) => {
            test::init_service(
                App::new()
                    .app_data($fixture.state.clone())
                    .configure(configure),
            )
            .await
        };
    }

    fn authed(req: test::TestRequest, fixture: &Fixture) -> test::TestRequest {
        req.insert_header((SESSION_HEADER, fixture.session.as_str()))
    }

    #[actix_web::test]
    async fn health_needs_no_session() {
        let fixture = fixture(Collaborators::default()).await;
        let app = app!(fixture);

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/health").to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["smsConfigured"], false);
        assert_eq!(body["advisorConfigured"], false);
    }

    #[actix_web::test]
    async fn missing_or_unknown_session_is_unauthorized() {
        let fixture = fixture(Collaborators::default()).await;
        let app = app!(fixture);

        for req in [
            test::TestRequest::get().uri("/api/contacts"),
            test::TestRequest::get()
                .uri("/api/contacts")
                .insert_header((SESSION_HEADER, "not-a-session")),
        ] {
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, serde_json::json!({"error": "Unauthorized"}));
        }
    }

    #[actix_web::test]
    async fn contacts_lifecycle() {
        let fixture = fixture(Collaborators::default()).await;
        let app = app!(fixture);

        let req = authed(test::TestRequest::post().uri("/api/contacts"), &fixture)
            .set_json(serde_json::json!({"name": " Bob ", "phoneNumber": "+15551234567"}))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["name"], "Bob");
        assert_eq!(created["phoneNumber"], "+15551234567");
        let contact_id = created["id"].as_str().unwrap().to_string();

        let req = authed(test::TestRequest::get().uri("/api/contacts"), &fixture).to_request();
        let listed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let req = authed(
            test::TestRequest::delete().uri(&format!("/api/contacts/{contact_id}")),
            &fixture,
        )
        .to_request();
        let deleted: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            deleted,
            serde_json::json!({"success": true, "message": "Contact deleted successfully"})
        );

        let req = authed(
            test::TestRequest::delete().uri(&format!("/api/contacts/{contact_id}")),
            &fixture,
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn invalid_contact_is_rejected() {
        let fixture = fixture(Collaborators::default()).await;
        let app = app!(fixture);

        let req = authed(test::TestRequest::post().uri("/api/contacts"), &fixture)
            .set_json(serde_json::json!({"name": "Bob", "phoneNumber": "555-CALL-NOW"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid phone number format");
    }

    #[actix_web::test]
    async fn sos_counts_only_successful_alerts() {
        let fixture = fixture(with_sms()).await;
        let user_id = fixture
            .state
            .sessions
            .resolve(&fixture.session)
            .await
            .unwrap()
            .unwrap();
        for (name, phone) in [("Bob", "+15550000001"), ("Cat", FAILING_PHONE)] {
            fixture
                .store
                .add(
                    &user_id,
                    safeguard_database_models::NewEmergencyContact::new(name, phone).unwrap(),
                )
                .await
                .unwrap();
        }
        let app = app!(fixture);

        let req = authed(test::TestRequest::post().uri("/api/sos/trigger"), &fixture)
            .set_json(serde_json::json!({
                "latitude": 40.7128,
                "longitude": -74.006,
                "address": "City Hall Park"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["contactsNotified"], 1);
        assert_eq!(body["message"], "SOS alerts sent to 1 of 2 contacts");
        assert_eq!(body["event"]["address"], "City Hall Park");
        assert_eq!(body["event"]["userId"], user_id.as_str());

        let req = authed(test::TestRequest::get().uri("/api/sos/recent"), &fixture).to_request();
        let recent: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(recent.as_array().unwrap().len(), 1);
        assert_eq!(recent[0]["id"], body["event"]["id"]);
    }

    #[actix_web::test]
    async fn sos_without_contacts_records_nothing() {
        let fixture = fixture(with_sms()).await;
        let app = app!(fixture);

        let req = authed(test::TestRequest::post().uri("/api/sos/trigger"), &fixture)
            .set_json(serde_json::json!({"latitude": 40.7, "longitude": -74.0}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["error"],
            "No emergency contacts configured. Please add emergency contacts first."
        );
        assert_eq!(fixture.store.event_count().await, 0);
    }

    #[actix_web::test]
    async fn sos_without_location_is_bad_request() {
        let fixture = fixture(with_sms()).await;
        let app = app!(fixture);

        let req = authed(test::TestRequest::post().uri("/api/sos/trigger"), &fixture)
            .set_json(serde_json::json!({"longitude": -74.0}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(fixture.store.event_count().await, 0);
    }

    #[actix_web::test]
    async fn location_endpoints_require_coordinates() {
        let fixture = fixture(Collaborators::default()).await;
        let app = app!(fixture);

        for uri in [
            "/api/crime/stats",
            "/api/safe-places?latitude=40.7",
            "/api/ai/insights?longitude=-74.0",
        ] {
            let req = authed(test::TestRequest::get().uri(uri), &fixture).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], "Latitude and longitude are required");
        }
    }

    async fn seed_crimes(store: &MemoryStore, center: Coordinate, severities: &[u8]) {
        let records: Vec<NewCrimeRecord> = severities
            .iter()
            .map(|&severity| NewCrimeRecord {
                location: center,
                crime_type: "theft".to_string(),
                severity: CrimeSeverity::from_value(severity).unwrap(),
                description: None,
                reported_at: chrono::Utc::now(),
            })
            .collect();
        store.insert_many(&records).await.unwrap();

        let far = NewCrimeRecord {
            location: Coordinate::new(34.0522, -118.2437).unwrap(),
            crime_type: "robbery".to_string(),
            severity: CrimeSeverity::Critical,
            description: None,
            reported_at: chrono::Utc::now(),
        };
        store.insert_many(&[far]).await.unwrap();
    }

    #[actix_web::test]
    async fn crime_stats_cover_five_km() {
        let fixture = fixture(Collaborators::default()).await;
        let center = Coordinate::new(40.7128, -74.006).unwrap();
        seed_crimes(&fixture.store, center, &[2, 3, 3]).await;
        let app = app!(fixture);

        let req = authed(
            test::TestRequest::get().uri("/api/crime/stats?latitude=40.7128&longitude=-74.006"),
            &fixture,
        )
        .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["totalCrimes"], 3);
        assert_eq!(body["safetyLevel"], "Safe");
        assert_eq!(body["trend"], "Stable");
        assert_eq!(
            body["crimesByType"],
            serde_json::json!([{"type": "theft", "count": 3}])
        );
    }

    #[actix_web::test]
    async fn insights_fall_back_without_advisor() {
        let fixture = fixture(Collaborators::default()).await;
        let center = Coordinate::new(40.7128, -74.006).unwrap();
        seed_crimes(&fixture.store, center, &[3; 10]).await;
        let app = app!(fixture);

        let req = authed(
            test::TestRequest::get().uri("/api/ai/insights?latitude=40.7128&longitude=-74.006"),
            &fixture,
        )
        .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["riskScore"], 5);
        assert_eq!(body["safetyLevel"], "Moderate");
        assert_eq!(body["suggestions"].as_array().unwrap().len(), 5);
    }

    #[actix_web::test]
    async fn safe_places_without_provider_are_empty() {
        let fixture = fixture(Collaborators::default()).await;
        let app = app!(fixture);

        let req = authed(
            test::TestRequest::get().uri("/api/safe-places?latitude=40.7128&longitude=-74.006"),
            &fixture,
        )
        .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body, serde_json::json!({"places": []}));
    }

    #[actix_web::test]
    async fn logout_revokes_session() {
        let fixture = fixture(Collaborators::default()).await;
        let app = app!(fixture);

        let req = authed(test::TestRequest::post().uri("/api/auth/logout"), &fixture).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = authed(test::TestRequest::get().uri("/api/sos/recent"), &fixture).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
