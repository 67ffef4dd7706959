use crate::session::{self, SessionState, LOGIN_PATH};
use actix_web::http::header;
use actix_web::{get, Error, HttpResponse, Responder};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_logout);
}

/// Idempotent: always lands on the login page, signed in or not.
#[get("/admin/logout")]
async fn view_logout(cookies: actix_session::Session) -> Result<impl Responder, Error> {
    match SessionState::from_session(&cookies) {
        SessionState::Staff(name) | SessionState::NonStaff(name) => {
            log::info!("Account {} logged out", name);
        }
        SessionState::Unauthenticated => {
            log::debug!("view_logout: no session (already logged out?)");
        }
    }

    session::sign_out(&cookies);

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, LOGIN_PATH))
        .finish())
}
