pub mod export;
pub mod login;
pub mod logout;
pub mod moderation;
pub mod submit;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Route resolution stops at the first match.
    submit::configure(conf);
    login::configure(conf);
    logout::configure(conf);
    moderation::configure(conf);
    export::configure(conf);
}
