use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{guard, http, web, App, HttpResponse, HttpServer, Result};
use async_graphql::http::GraphiQLSource;
use async_graphql_actix_web::GraphQL;
use ecotrack::{
    config::Config, graphql::build_schema, service::UserAggregateService, store::SeaOrmStore,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use tracing::info;
use tracing_subscriber::EnvFilter;

async fn index_graphiql() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(GraphiQLSource::build().endpoint("/").finish()))
}

fn to_io(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(err.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().map_err(to_io)?;

    let db: DatabaseConnection = Database::connect(config.database_url.as_str())
        .await
        .map_err(to_io)?;

    Migrator::up(&db, None).await.map_err(to_io)?;

    let store = Arc::new(SeaOrmStore::new(db));
    let service = Arc::new(UserAggregateService::new(store, config.score_baseline));
    let schema = build_schema(service);

    info!("GraphiQL IDE: http://{}", config.bind_address);

    let origins = config.cors_allowed_origins.clone();
    HttpServer::new(move || {
        let cors = origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![http::header::AUTHORIZATION, http::header::ACCEPT])
            .allowed_header(http::header::CONTENT_TYPE)
            .max_age(3600);

        App::new()
            .wrap(cors)
            .service(
                web::resource("/")
                    .guard(guard::Post())
                    .to(GraphQL::new(schema.clone())),
            )
            .service(web::resource("/").guard(guard::Get()).to(index_graphiql))
    })
    .bind(config.bind_address.as_str())?
    .run()
    .await
}
