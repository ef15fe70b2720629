//! Lyceum server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use lyceum_api::{middleware::AppState, router as api_router};
use lyceum_common::Config;
use lyceum_core::{
    CommentService, EmailConfig, EmailProvider, EmailService, EngagementService, EssayService,
    MailgunConfig, PostService, SendGridConfig, SmtpConfig, UserService,
};
use lyceum_db::repositories::{
    CommentRepository, EssayRepository, PostRepository, ReactionRepository, UserRepository,
    UserProfileRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Build the mailer from configuration, if email delivery is enabled.
fn email_service(config: &Config) -> Option<EmailService> {
    let email = config.email.as_ref()?;

    let provider = match email.provider.as_str() {
        "sendgrid" => EmailProvider::SendGrid(SendGridConfig {
            api_key: email.api_key.clone().unwrap_or_default(),
        }),
        "mailgun" => EmailProvider::Mailgun(MailgunConfig {
            api_key: email.api_key.clone().unwrap_or_default(),
            domain: email.domain.clone().unwrap_or_default(),
        }),
        "smtp" => EmailProvider::Smtp(SmtpConfig {
            host: email.smtp_host.clone().unwrap_or_else(|| "localhost".to_string()),
            port: email.smtp_port.unwrap_or(25),
        }),
        other => {
            tracing::warn!(provider = other, "Unknown email provider, mail disabled");
            return None;
        }
    };

    Some(EmailService::new(Some(EmailConfig {
        provider,
        from_address: email.from_address.clone(),
        from_name: email.from_name.clone(),
        instance_url: config.server.url.clone(),
    })))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lyceum=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting lyceum server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = lyceum_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    lyceum_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let profile_repo = UserProfileRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let essay_repo = EssayRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let reaction_repo = ReactionRepository::new(Arc::clone(&db));

    // Initialize services
    let email = email_service(&config);

    let mut user_service = UserService::new(
        user_repo.clone(),
        profile_repo,
        post_repo.clone(),
        essay_repo.clone(),
        comment_repo.clone(),
        reaction_repo,
    );

    let post_service = PostService::new(post_repo.clone());
    let essay_service = EssayService::new(essay_repo.clone());

    let mut comment_service = CommentService::new(
        comment_repo.clone(),
        post_repo.clone(),
        essay_repo.clone(),
        user_repo,
        config.thread.strategy,
    );

    if let Some(email) = email {
        user_service.set_email(email.clone());
        comment_service.set_email(email, config.server.url.clone());
        info!("Email delivery enabled");
    }

    let engagement_service = EngagementService::new(
        Arc::clone(&db),
        post_repo,
        essay_repo,
        comment_repo,
    );

    // Create app state
    let state = AppState {
        user_service,
        post_service,
        essay_service,
        comment_service,
        engagement_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            lyceum_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
