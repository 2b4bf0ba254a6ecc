use actix_web::dev::Server;
use actix_web::error::JsonPayloadError;
use actix_web::{middleware::Logger, web, App, HttpRequest, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::SessionGuardMiddleware;
use crate::routes::{
    change_password, current_user, health_check, login, logout, refresh_token, register,
    update_avatar,
};
use crate::upload::UploadLimit;

/// Unreadable JSON bodies render through the regular error envelope
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!("Rejected JSON body: {}", err);
    let field = match err {
        JsonPayloadError::ContentType => "content type",
        _ => "request body",
    };
    AppError::Validation(ValidationError::InvalidFormat(field.to_string())).into()
}

pub fn run(
    listener: TcpListener,
    auth_service: AuthService,
    max_upload_bytes: usize,
) -> Result<Server, std::io::Error> {
    let guard = auth_service.session_guard();
    let auth_service = web::Data::new(auth_service);
    let upload_limit = web::Data::new(UploadLimit(max_upload_bytes));

    let server = HttpServer::new(move || {
        // Protected routes each carry their own guard
        let guarded = || SessionGuardMiddleware::new(guard.clone());

        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(auth_service.clone())
            .app_data(upload_limit.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error))

            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/v1/users")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh-token", web::post().to(refresh_token))
                    .service(
                        web::resource("/logout")
                            .wrap(guarded())
                            .route(web::post().to(logout)),
                    )
                    .service(
                        web::resource("/change-password")
                            .wrap(guarded())
                            .route(web::post().to(change_password)),
                    )
                    .service(
                        web::resource("/current-user")
                            .wrap(guarded())
                            .route(web::get().to(current_user)),
                    )
                    .service(
                        web::resource("/avatar")
                            .wrap(guarded())
                            .route(web::patch().to(update_avatar)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
