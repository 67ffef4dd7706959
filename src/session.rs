//! Staff session state and the moderation gate.
//!
//! Sessions live in the signed cookie managed by `actix-session`. The gate
//! makes its decision table explicit: only `Staff` is admitted, everything
//! else is redirected to the admin login page.

use actix_session::Session;
use actix_web::http::header;
use actix_web::{error, HttpResponse};

const NAME_KEY: &str = "staff_name";
const STAFF_KEY: &str = "is_staff";

pub const LOGIN_PATH: &str = "/admin/login";

/// What the cookie session says about the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    /// Authenticated account without the staff capability. Treated the
    /// same as unauthenticated by the moderation gate.
    NonStaff(String),
    Staff(String),
}

impl SessionState {
    pub fn from_session(session: &Session) -> Self {
        let name = match session.get::<String>(NAME_KEY) {
            Ok(Some(name)) => name,
            Ok(None) => return Self::Unauthenticated,
            Err(e) => {
                log::error!("session: unreadable {} entry: {}", NAME_KEY, e);
                return Self::Unauthenticated;
            }
        };

        match session.get::<bool>(STAFF_KEY) {
            Ok(Some(true)) => Self::Staff(name),
            _ => Self::NonStaff(name),
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Staff(_))
    }
}

/// Record a successful login on the session.
pub fn sign_in(session: &Session, name: &str, is_staff: bool) -> Result<(), actix_web::Error> {
    session
        .insert(NAME_KEY, name)
        .map_err(error::ErrorInternalServerError)?;
    session
        .insert(STAFF_KEY, is_staff)
        .map_err(error::ErrorInternalServerError)?;
    Ok(())
}

/// Clear the session. Safe to call when nobody is signed in.
pub fn sign_out(session: &Session) {
    session.purge();
}

/// Admit only staff. Anything else becomes a redirect to the admin login
/// page rather than an error page.
pub fn require_staff(session: &Session) -> Result<String, actix_web::Error> {
    match SessionState::from_session(session) {
        SessionState::Staff(name) => Ok(name),
        SessionState::NonStaff(name) => {
            log::warn!("moderation request from non-staff account: {}", name);
            Err(login_redirect())
        }
        SessionState::Unauthenticated => Err(login_redirect()),
    }
}

fn login_redirect() -> actix_web::Error {
    let response = HttpResponse::Found()
        .insert_header((header::LOCATION, LOGIN_PATH))
        .finish();
    error::InternalError::from_response("staff login required", response).into()
}
