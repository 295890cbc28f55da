use actix_web::web;

pub mod health;
pub mod sessions;

/// Register every route. `main.rs` adds the middleware stack around these.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/health").configure(health::configure_routes));
    cfg.service(web::scope("/api/sessions").configure(sessions::configure_routes));
}
