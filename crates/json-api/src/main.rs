//! Spareline JSON API Server

use std::{process, sync::Arc};

use salvo::{
    affix_state::inject,
    oapi::{
        OpenApi,
        security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme},
        swagger_ui::SwaggerUi,
    },
    prelude::*,
    trailing_slash::remove_slash,
};
use tracing::{error, info};

use spareline_app::{
    context::AppContext,
    database::{self, Db},
    domain::identity::otp::LogOtpDelivery,
};

use crate::{config::ServerConfig, state::State};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod cart;
mod catalog;
mod config;
mod errors;
mod extensions;
mod favorites;
mod healthcheck;
mod identity;
mod observability;
mod offers;
mod orders;
mod promo_codes;
mod router;
mod shutdown;
mod state;
#[cfg(test)]
mod test_helpers;

/// Spareline JSON API Server entry point
#[tokio::main]
pub async fn main() {
    let config = ServerConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    if let Err(init_error) = observability::init(&config) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, must use eprintln"
        )]
        {
            eprintln!("Observability error: {init_error}");
        }

        process::exit(1);
    }

    let addr = config.socket_addr();

    info!("Starting server on {addr}");

    let listener = TcpListener::new(addr).bind().await;

    let pool = match database::connect(&config.database.database_url).await {
        Ok(pool) => pool,
        Err(connect_error) => {
            error!("failed to connect to database: {connect_error}");

            process::exit(1);
        }
    };

    if config.database.migrate_on_start {
        if let Err(migrate_error) = database::migrate(&pool).await {
            error!("failed to apply migrations: {migrate_error}");

            process::exit(1);
        }

        info!("migrations applied");
    }

    let app = AppContext::new(
        Db::new(pool),
        config.identity.settings(),
        Arc::new(LogOtpDelivery),
    );

    let router = Router::new()
        .hoop(CatchPanic::new())
        .hoop(remove_slash())
        .hoop(observability::request_logging)
        .hoop(inject(State::from_app_context(app)))
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(observability::metrics_handler))
        .push(router::app_router());

    let doc = OpenApi::new("Spareline API", env!("CARGO_PKG_VERSION"))
        .add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
        .add_security_scheme(
            "anonymous_token",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Anonymous-Token"))),
        )
        .merge_router(&router);

    let router = router
        .push(doc.into_router("/api-doc/openapi.json"))
        .push(SwaggerUi::new("/api-doc/openapi.json").into_router("docs"));

    let server = Server::new(listener);

    let handle = server.handle();
    let grace = config.server.shutdown_grace();

    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle, grace).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    server.serve(router).await;
}
