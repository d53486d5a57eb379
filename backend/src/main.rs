mod inference;
mod pipeline;
mod routes;

use std::env;
use std::path::Path;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};

use inference::classifier::Classifier;
use inference::model::ModelHandle;
use routes::configure_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| {
        if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
            format!("{}/static", manifest_dir)
        } else {
            "/usr/src/app/static".to_string()
        }
    });

    let model_path = env::var("MODEL_PATH").unwrap_or_else(|_| "models/detector.pt".to_string());
    let model = ModelHandle::load(Path::new(&model_path));
    if !model.is_available() {
        log::warn!(
            "Serving without a model; every analysis request will fail until {} is deployed",
            model_path
        );
    }
    let classifier = Classifier::new(model);

    let port = env::var("PORT").unwrap_or_else(|_| "8081".to_string());
    let bind_address = format!("0.0.0.0:{}", port);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(classifier.clone()))
            .configure(|cfg| configure_routes(cfg, static_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
