use axum::{
    routing::{get, post, put},
    Router,
};
use drillbuilder_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let app = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/users", post(routes::users::create_user))
        .route("/api/users/:user_id/progress", get(routes::users::progress))
        .route("/api/users/:user_id/srs", get(routes::users::srs_overview))
        .route(
            "/api/users/:user_id/reviews/due",
            get(routes::users::due_reviews),
        )
        .route(
            "/api/quizzes/:quiz_id/questions",
            get(routes::questions::list_questions).post(routes::questions::add_question),
        )
        .route(
            "/api/questions/:question_id",
            put(routes::questions::update_question).delete(routes::questions::delete_question),
        )
        .route("/api/attempts/start", post(routes::attempts::start_attempt))
        .route(
            "/api/attempts/:attempt_id/answers",
            post(routes::attempts::submit_answer),
        )
        .route(
            "/api/attempts/:attempt_id/finish",
            post(routes::attempts::finish_attempt),
        )
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
