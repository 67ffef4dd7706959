//! Staff login for the moderation panel.

use crate::app_config;
use crate::session::{self, SessionState};
use actix_web::http::header;
use actix_web::{get, post, web, Error, HttpResponse, Responder};
use argon2::password_hash::{PasswordHash, PasswordVerifier};
use argon2::Argon2;
use askama::Template;
use askama_actix::TemplateToResponse;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_login).service(view_login);
}

/// One generic message for every failure mode, so a response never reveals
/// whether the account exists, the password was wrong, or the account
/// lacks the staff flag.
const BAD_CREDENTIALS_MSG: &str = "Invalid credentials or insufficient permissions.";

const DASHBOARD_PATH: &str = "/admin/dashboard";

#[derive(Template)]
#[template(path = "admin_login.html")]
struct LoginTemplate {
    error_message: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credentials valid and the account carries the staff flag.
    Granted(String),
    /// Unknown account, bad password, or a valid non-staff login. The
    /// distinction is logged, never surfaced.
    Denied,
}

/// Check a username/password pair against the configured staff accounts.
pub fn authenticate(username: &str, password: &str) -> LoginOutcome {
    let account = app_config::staff()
        .into_iter()
        .find(|account| account.name == username);

    let account = match account {
        Some(account) => account,
        None => {
            log::warn!("Failed login attempt for unknown account: {}", username);
            return LoginOutcome::Denied;
        }
    };

    let parsed_hash = match PasswordHash::new(&account.password_hash) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("Unparseable password hash for account {}: {}", username, e);
            return LoginOutcome::Denied;
        }
    };

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        log::warn!("Failed login attempt for account: {}", username);
        return LoginOutcome::Denied;
    }

    if !account.is_staff {
        log::warn!("Login rejected for non-staff account: {}", username);
        return LoginOutcome::Denied;
    }

    LoginOutcome::Granted(account.name)
}

#[get("/admin/login")]
async fn view_login(cookies: actix_session::Session) -> Result<impl Responder, Error> {
    if SessionState::from_session(&cookies).is_staff() {
        return Ok(HttpResponse::Found()
            .insert_header((header::LOCATION, DASHBOARD_PATH))
            .finish());
    }

    Ok(LoginTemplate {
        error_message: String::new(),
    }
    .to_response())
}

#[post("/admin/login")]
async fn post_login(
    cookies: actix_session::Session,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, Error> {
    match authenticate(&form.username, &form.password) {
        LoginOutcome::Granted(name) => {
            session::sign_in(&cookies, &name, true)?;
            log::info!("Staff account {} logged in", name);
            Ok(HttpResponse::Found()
                .insert_header((header::LOCATION, DASHBOARD_PATH))
                .finish())
        }
        LoginOutcome::Denied => Ok(LoginTemplate {
            error_message: BAD_CREDENTIALS_MSG.to_string(),
        }
        .to_response()),
    }
}
