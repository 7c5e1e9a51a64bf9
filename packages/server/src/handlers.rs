//! HTTP handler functions for the SafeGuard API.

use actix_web::{HttpRequest, HttpResponse, web};
use safeguard_analytics::CRIME_RADIUS_KM;
use safeguard_database_models::NewEmergencyContact;
use safeguard_server_models::{
    ApiHealth, ApiMessage, ApiSosTriggerResponse, CreateContactRequest, LocationQueryParams,
    SafePlacesResponse, TriggerRequest,
};

use crate::{
    AppState,
    auth::{AuthenticatedUser, SESSION_HEADER},
    error::ApiError,
};

/// Number of events returned by `GET /api/sos/recent`.
pub const RECENT_SOS_LIMIT: u32 = 10;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        sms_configured: state.sms_configured,
        places_configured: state.places_configured,
        advisor_configured: state.insights.has_advisor(),
    })
}

/// `POST /api/auth/logout`
///
/// Revokes the caller's session.
pub async fn logout(
    _user: AuthenticatedUser,
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let session_id = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();

    state
        .sessions
        .revoke(session_id)
        .await
        .map_err(|e| ApiError::internal("Failed to log out", &e))?;

    Ok(HttpResponse::Ok().json(ApiMessage::ok("Logged out successfully")))
}

/// `GET /api/contacts`
pub async fn list_contacts(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let contacts = state
        .contacts
        .list_by_user(user.user_id())
        .await
        .map_err(|e| ApiError::internal("Failed to fetch contacts", &e))?;

    Ok(HttpResponse::Ok().json(contacts))
}

/// `POST /api/contacts`
pub async fn create_contact(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    body: web::Json<CreateContactRequest>,
) -> Result<HttpResponse, ApiError> {
    let contact = NewEmergencyContact::new(&body.name, &body.phone_number)?;

    let contact = state
        .contacts
        .add(user.user_id(), contact)
        .await
        .map_err(|e| ApiError::internal("Failed to create contact", &e))?;

    log::info!("User {} added contact {}", user.user_id(), contact.id);
    Ok(HttpResponse::Ok().json(contact))
}

/// `DELETE /api/contacts/{id}`
pub async fn delete_contact(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let contact_id = path.into_inner();

    let deleted = state
        .contacts
        .delete(user.user_id(), &contact_id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete contact", &e))?;

    if !deleted {
        return Err(ApiError::NotFound("Contact not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(ApiMessage::ok("Contact deleted successfully")))
}

/// `POST /api/sos/trigger`
///
/// Records an SOS event and alerts the caller's emergency contacts.
pub async fn trigger_sos(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    body: web::Json<TriggerRequest>,
) -> Result<HttpResponse, ApiError> {
    let TriggerRequest {
        latitude,
        longitude,
        address,
    } = body.into_inner();

    let result = state
        .sos
        .trigger(user.user_id(), latitude, longitude, address)
        .await?;

    Ok(HttpResponse::Ok().json(ApiSosTriggerResponse {
        success: true,
        message: result.message,
        event: result.event,
        contacts_notified: result.contacts_notified,
    }))
}

/// `GET /api/sos/recent`
pub async fn recent_sos(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let events = state
        .events
        .recent(user.user_id(), RECENT_SOS_LIMIT)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch SOS events", &e))?;

    Ok(HttpResponse::Ok().json(events))
}

/// `GET /api/crime/stats?latitude=..&longitude=..`
pub async fn crime_stats(
    _user: AuthenticatedUser,
    state: web::Data<AppState>,
    params: web::Query<LocationQueryParams>,
) -> Result<HttpResponse, ApiError> {
    let center = params.coordinate()?;

    let stats = state
        .aggregator
        .stats(center, CRIME_RADIUS_KM)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch crime statistics", &e))?;

    Ok(HttpResponse::Ok().json(stats))
}

/// `GET /api/safe-places?latitude=..&longitude=..`
///
/// Categories, radius and limits come from the embedded places service
/// configuration.
pub async fn safe_places(
    _user: AuthenticatedUser,
    state: web::Data<AppState>,
    params: web::Query<LocationQueryParams>,
) -> Result<HttpResponse, ApiError> {
    let center = params.coordinate()?;
    let service = &state.places;

    let places = state
        .aggregator
        .nearby_places(
            center,
            &service.categories,
            service.search_radius_km,
            service.per_category_limit,
        )
        .await;

    Ok(HttpResponse::Ok().json(SafePlacesResponse { places }))
}

/// `GET /api/ai/insights?latitude=..&longitude=..`
pub async fn ai_insights(
    _user: AuthenticatedUser,
    state: web::Data<AppState>,
    params: web::Query<LocationQueryParams>,
) -> Result<HttpResponse, ApiError> {
    let center = params.coordinate()?;

    let summary = state
        .aggregator
        .severity_summary(center, CRIME_RADIUS_KM)
        .await
        .map_err(|e| ApiError::internal("Failed to generate AI insights", &e))?;

    let insight = state
        .insights
        .analyze(center, summary.crime_count, summary.average_severity)
        .await;

    Ok(HttpResponse::Ok().json(insight))
}
