// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use actix_cors::Cors;
use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpServer, middleware, web};
use clap::Parser;
use mbtiles_viewer::{StyleResolver, ViewerConfig, routes};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let viewer_config = ViewerConfig::parse();

    tracing_subscriber::fmt()
        .with_max_level(viewer_config.log_level)
        .init();

    if !viewer_config.mbtiles_dir.is_dir() {
        tracing::warn!(
            "MBTiles directory {} does not exist, /api/datasets will be empty",
            viewer_config.mbtiles_dir.display()
        );
    }

    if !viewer_config.styles_dir.is_dir() {
        tracing::warn!(
            "styles directory {} does not exist, every style request will 404",
            viewer_config.styles_dir.display()
        );
    }

    let resolver = Arc::new(StyleResolver::new(
        &viewer_config.styles_dir,
        &viewer_config.tile_server_url,
    ));
    let viewer_config = Arc::new(viewer_config);

    let bind_address = (viewer_config.address.clone(), viewer_config.port);
    let workers = viewer_config.workers;

    tracing::info!(
        "Starting MBTiles viewer API on {}:{} (tile server {})",
        bind_address.0,
        bind_address.1,
        viewer_config.tile_server_url
    );

    let server_config = Arc::clone(&viewer_config);

    let mut builder = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(DefaultHeaders::new().add(("Server", "MBTilesViewer")))
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(Arc::clone(&server_config)))
            .app_data(web::Data::new(Arc::clone(&resolver)))
            .configure(routes::config)
    });

    if let Some(workers) = workers {
        builder = builder.workers(workers);
    }

    builder.bind(bind_address)?.run().await?;

    Ok(())
}
