use database::{db::create_connection, services::user::UserService};
use log::{info, warn};
use migration::{Migrator, MigratorTrait};
use server::{
    app,
    auth::{JwtKeys, hash_password},
    config::Config,
    jobs::sweeper::spawn_overdue_sweeper,
    state::AppState,
    utils::shutdown::shutdown_signal,
};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = Config::from_env()?;

    let db = create_connection(&config.database_url, config.max_connections).await?;
    Migrator::up(&db, None).await?;
    info!("Database migrations applied");

    let state = AppState::new(
        db,
        JwtKeys::new(config.jwt_secret.as_bytes(), config.token_ttl),
        config.penalty_policy,
    )
    .with_utc_offset(config.utc_offset);
    info!("Lab clock runs at UTC{}", config.utc_offset);

    if let Some(admin) = &config.bootstrap_admin {
        let password_hash = hash_password(&admin.password)?;
        UserService::ensure_admin(
            &state.db,
            "Lab Administrator",
            &admin.email,
            password_hash,
            state.now(),
        )
        .await?;
    }

    match config.sweep_interval {
        Some(interval) => {
            spawn_overdue_sweeper(state.clone(), interval);
            info!("Overdue sweep scheduled every {}s", interval.as_secs());
        }
        None => warn!("Overdue sweep disabled, bookings only go overdue on request"),
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Running axum on http://{}", config.bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
