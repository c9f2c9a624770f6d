//! Minimal server wiring the container, the factory registry and the exception layer.
//!
//! ```text
//! cargo run --example basic_server
//! curl -i localhost:3000/users/1      # 200
//! curl -i localhost:3000/users/404    # 404 from the registered factory
//! curl -i localhost:3000/reports      # 500 default response (missing dependency)
//! ```

use catchall::prelude::*;
use catchall::{
    ConfigService, ContainerDependencyResolver, ErrorBody, HasResolver, Inject,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
#[error("user {0} not found")]
struct UserNotFound(u64);

struct UserRepository;

impl UserRepository {
    fn find(&self, id: u64) -> Result<String, UserNotFound> {
        match id {
            1 => Ok("alice".to_string()),
            _ => Err(UserNotFound(id)),
        }
    }
}

struct UserService {
    repository: Arc<UserRepository>,
}

impl Injectable for UserService {
    fn inject(container: &Container) -> catchall::Result<Self> {
        Ok(Self {
            repository: container.resolve::<UserRepository>()?,
        })
    }
}

/// Deliberately never registered
struct ReportService;

#[derive(Clone)]
struct AppState {
    resolver: ContainerDependencyResolver,
}

impl HasResolver for AppState {
    fn resolver(&self) -> &ContainerDependencyResolver {
        &self.resolver
    }
}

async fn get_user(
    Inject(users): Inject<UserService>,
    Path(id): Path<u64>,
) -> Result<Json<String>, Thrown> {
    Ok(Json(users.repository.find(id)?))
}

async fn get_reports(Inject(_reports): Inject<ReportService>) -> &'static str {
    "unreachable"
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let container = ContainerBuilder::new()
        .register(UserRepository)
        .injectable::<UserService>()
        .build();

    let mut factories = ExceptionResponseFactoryRegistry::new();
    factories.register_factory(|e: &UserNotFound, _ctx| {
        Ok(ErrorBody::new(StatusCode::NOT_FOUND, e.to_string()).into_response())
    });

    let config = ExceptionHandlerConfig::from_config(&ConfigService::new())?;

    // Catch panics outside of requests too, e.g. during startup
    let startup_handler = Arc::new(ExceptionHandler::new(
        Arc::new(TracingLogger),
        None,
        Arc::new(|_: Response| {}),
        config.clone().log_from(Severity::Fatal),
    ));
    let _registration = startup_handler.register();

    let app = Router::new()
        .route("/users/{id}", axum::routing::get(get_user))
        .route("/reports", axum::routing::get(get_reports))
        .layer(ExceptionHandlerLayer::new(
            Arc::new(TracingLogger),
            Some(Arc::new(factories)),
            config,
        ))
        .with_state(AppState {
            resolver: ContainerDependencyResolver::new(Arc::new(container)),
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
