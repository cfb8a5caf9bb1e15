//! Server runtime.
//!
//! [`ServerHandle`] owns the whole lifecycle: metrics recorder, storage
//! (SQLite via SeaORM or in-memory), parking service, REST API, the
//! notification log transport and graceful shutdown.

use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::{create_event_bus, ParkingService, SharedEventBus};
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::{
    init_database, run_migrations, DatabaseConfig, EventBusNotifier, InMemoryRepositoryProvider,
    SeaOrmRepositoryProvider,
};
use crate::interfaces::{create_api_router, ApiState};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Options for starting the server.
pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub run_migrations: bool,
    /// Keep everything in memory instead of opening the database.
    pub in_memory: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            run_migrations: true,
            in_memory: false,
        }
    }
}

/// The global metrics recorder can only be installed once per process;
/// later starts reuse the first handle.
fn prometheus_handle() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            match metrics::set_global_recorder(recorder) {
                Ok(()) => info!("📊 Prometheus metrics recorder installed"),
                Err(e) => warn!("Metrics recorder already installed elsewhere: {}", e),
            }
            handle
        })
        .clone()
}

/// Delivery transport of last resort: writes every notification to the log.
fn spawn_notification_logger(bus: &SharedEventBus, shutdown: ShutdownSignal) {
    let mut subscriber = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                msg = subscriber.recv() => match msg {
                    Some(msg) => info!(
                        id = %msg.id,
                        alert = msg.notification.alert.as_str(),
                        recipient = ?msg.notification.recipient,
                        title = msg.notification.title.as_str(),
                        "Notification"
                    ),
                    None => break,
                },
                _ = shutdown.wait() => break,
            }
        }
    });
}

/// Handle to a running server.
pub struct ServerHandle {
    pub event_bus: SharedEventBus,
    pub repos: Arc<dyn RepositoryProvider>,
    pub service: Arc<ParkingService>,
    pub config: AppConfig,
    /// API port the server is listening on.
    pub api_port: u16,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting parking LPR server...");
        let prometheus = prometheus_handle();

        // ── Storage ────────────────────────────────────────────
        let (repos, db): (Arc<dyn RepositoryProvider>, Option<DatabaseConnection>) =
            if opts.in_memory {
                warn!("Running with in-memory storage; data is lost on exit");
                (Arc::new(InMemoryRepositoryProvider::new()), None)
            } else {
                let db_config = DatabaseConfig {
                    url: app_cfg.database.connection_url(),
                };
                let db = init_database(&db_config).await?;
                if opts.run_migrations {
                    run_migrations(&db).await?;
                }
                (Arc::new(SeaOrmRepositoryProvider::new(db.clone())), Some(db))
            };

        // ── Services ───────────────────────────────────────────
        let event_bus = create_event_bus();
        let notifier = Arc::new(EventBusNotifier::new(event_bus.clone()));
        let service = Arc::new(
            ParkingService::new(repos.clone(), notifier)
                .with_scan_scope(app_cfg.matching.scan_scope())
                .with_expiry_hours(app_cfg.parking.expiry_hours),
        );
        for seed in &app_cfg.registry.plates {
            service
                .register_plate(&seed.license_plate, seed.owner_id, seed.name.clone())
                .await?;
        }
        if !app_cfg.registry.plates.is_empty() {
            info!(
                "Registry loaded from config: {} plate(s)",
                app_cfg.registry.plates.len()
            );
        }
        info!(
            strategy = ?app_cfg.matching.default_strategy,
            threshold = app_cfg.matching.similarity_threshold,
            max_distance = app_cfg.matching.max_distance,
            prefix_filter = app_cfg.matching.prefix_filter,
            "Plate matching configured"
        );

        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();
        spawn_notification_logger(&event_bus, shutdown_signal.clone());

        // ── REST API ───────────────────────────────────────────
        let router = create_api_router(ApiState::new(
            service.clone(),
            app_cfg.matching.clone(),
            db.clone(),
            prometheus,
        ));

        let api_addr = app_cfg.api_address();
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let api_port = listener.local_addr()?.port();
        info!("REST API server listening on http://{}", api_addr);
        info!("Swagger UI available at http://{}/docs/", api_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        info!("🚀 Server started.");

        Ok(Self {
            event_bus,
            repos,
            service,
            config: app_cfg,
            api_port,
            db,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for shutdown to be triggered, then for the server to stop,
    /// bounded by `server.shutdown_timeout`.
    pub async fn wait(self) {
        let Self {
            db,
            shutdown,
            api_task,
            ..
        } = self;

        let finished = shutdown
            .shutdown_with_cleanup(|| async move {
                match api_task.await {
                    Ok(()) => info!("REST API server stopped"),
                    Err(e) => error!("REST API server task panicked: {}", e),
                }
                if let Some(db) = db {
                    match db.close().await {
                        Ok(()) => info!("✅ Database connection closed"),
                        Err(e) => warn!("Error closing database connection: {}", e),
                    }
                }
            })
            .await;

        if finished {
            info!("👋 Shutdown complete");
        }
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing from the application config.
///
/// `RUST_LOG` wins over `logging.level`. Call once at process startup.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_registry_is_seeded_from_config() {
        let mut config = AppConfig::default();
        config.server.api_host = "127.0.0.1".to_string();
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        config.server.api_port = listener.local_addr().unwrap().port();
        drop(listener);
        config.registry.plates.push(crate::config::PlateSeed {
            license_plate: "B 1234 XYZ".to_string(),
            owner_id: 10,
            name: None,
        });

        let handle = ServerHandle::start(ServerOptions {
            config,
            run_migrations: false,
            in_memory: true,
        })
        .await
        .unwrap();

        let plates = handle.repos.plates().list_plates().await.unwrap();
        assert_eq!(plates.len(), 1);
        let outcome = handle
            .service
            .record_event(crate::application::ParkingEvent::new(
                "B1234XY2",
                crate::matching::MatchStrategy::BoundedDistance(1),
            ))
            .await
            .unwrap();
        assert_eq!(outcome.as_str(), "check_in");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn in_memory_server_starts_and_stops() {
        let mut config = AppConfig::default();
        config.server.api_host = "127.0.0.1".to_string();
        config.server.shutdown_timeout = 5;

        // Port 0 is rejected by validation, so pick a free port first.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        config.server.api_port = listener.local_addr().unwrap().port();
        drop(listener);

        let handle = ServerHandle::start(ServerOptions {
            config,
            run_migrations: false,
            in_memory: true,
        })
        .await
        .unwrap();
        assert!(handle.is_running());
        assert!(handle.db.is_none());

        handle.shutdown().await;
    }
}
