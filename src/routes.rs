use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde_json::json;

use crate::config::ViewerConfig;
use crate::dataset_id::DatasetId;
use crate::datasets::{DatasetsResponse, find_dataset, list_datasets};
use crate::style_resolver::{StyleError, StyleQuery, StyleResolver};

pub const API_NAME: &str = "MBTiles Viewer API";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(health)
        .service(get_datasets)
        .service(get_dataset_tilejson)
        .service(get_style);
}

fn detail(message: impl Into<String>) -> serde_json::Value {
    json!({ "detail": message.into() })
}

#[actix_web::get("/")]
pub async fn index(viewer_config: web::Data<Arc<ViewerConfig>>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": API_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Backend API for MBTiles Viewer",
        "endpoints": {
            "datasets": "/api/datasets",
            "tilejson": "/api/datasets/{dataset_id}/tilejson",
            "styles": "/api/styles/{dataset_id}",
            "health": "/health"
        },
        "frontend": viewer_config.frontend_url,
        "tileserver": viewer_config.tile_server_url
    }))
}

#[actix_web::get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok()
        .insert_header(("Cache-Control", "no-cache"))
        .json(json!({ "status": "healthy" }))
}

#[actix_web::get("/api/datasets")]
pub async fn get_datasets(viewer_config: web::Data<Arc<ViewerConfig>>) -> impl Responder {
    let mbtiles_dir = viewer_config.mbtiles_dir.clone();

    match web::block(move || list_datasets(&mbtiles_dir)).await {
        Ok(datasets) => HttpResponse::Ok().json(DatasetsResponse { datasets }),
        Err(err) => {
            tracing::error!("dataset listing task failed: {}", err);
            HttpResponse::InternalServerError().json(detail("Could not list datasets"))
        }
    }
}

#[actix_web::get("/api/datasets/{dataset_id}/tilejson")]
pub async fn get_dataset_tilejson(
    viewer_config: web::Data<Arc<ViewerConfig>>,
    path: web::Path<String>,
) -> impl Responder {
    let dataset_id = match DatasetId::parse(&path.into_inner()) {
        Ok(dataset_id) => dataset_id,
        Err(err) => return HttpResponse::BadRequest().json(detail(err.to_string())),
    };

    let mbtiles_dir = viewer_config.mbtiles_dir.clone();
    let lookup_id = dataset_id.clone();

    match web::block(move || find_dataset(&mbtiles_dir, &lookup_id)).await {
        Ok(Some(dataset)) => {
            HttpResponse::Ok().json(dataset.tilejson(&viewer_config.tile_server_url))
        }
        Ok(None) => HttpResponse::NotFound().json(detail("Dataset not found")),
        Err(err) => {
            tracing::error!("tilejson task for {} failed: {}", dataset_id, err);
            HttpResponse::InternalServerError().json(detail("Could not read dataset"))
        }
    }
}

#[actix_web::get("/api/styles/{dataset_id}")]
pub async fn get_style(
    resolver: web::Data<Arc<StyleResolver>>,
    path: web::Path<String>,
    req: HttpRequest,
) -> impl Responder {
    let dataset_id = match DatasetId::parse(&path.into_inner()) {
        Ok(dataset_id) => dataset_id,
        Err(err) => {
            tracing::warn!("rejected style request: {}", err);
            return HttpResponse::BadRequest().json(detail(err.to_string()));
        }
    };

    let query = match web::Query::<StyleQuery>::from_query(req.query_string()) {
        Ok(query) => query.into_inner(),
        Err(err) => return HttpResponse::BadRequest().json(detail(err.to_string())),
    };

    let resolver = Arc::clone(resolver.get_ref());
    let lookup_id = dataset_id.clone();

    match web::block(move || resolver.resolve(&lookup_id, &query)).await {
        Ok(Ok(style)) => HttpResponse::Ok().json(style),
        Ok(Err(StyleError::NotFound { .. })) => {
            HttpResponse::NotFound().json(detail("Style not found"))
        }
        Ok(Err(err)) => {
            tracing::error!("{}", err);
            HttpResponse::InternalServerError().json(detail("Could not load style"))
        }
        Err(err) => {
            tracing::error!("style task for {} failed: {}", dataset_id, err);
            HttpResponse::InternalServerError().json(detail("Could not load style"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_package;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::Value;
    use std::path::Path;

    const ROADS_STYLE: &str = r#"{
        "version": 8,
        "sources": {
            "s1": {"type": "vector", "url": "mbtiles://co_roads"},
            "labels": {"type": "geojson", "data": {"type": "FeatureCollection", "features": []}}
        },
        "layers": [{"id": "roads", "type": "line", "source": "s1", "source-layer": "roads"}]
    }"#;

    fn state(
        mbtiles_dir: &Path,
        styles_dir: &Path,
    ) -> (web::Data<Arc<ViewerConfig>>, web::Data<Arc<StyleResolver>>) {
        let viewer_config = ViewerConfig {
            mbtiles_dir: mbtiles_dir.to_path_buf(),
            styles_dir: styles_dir.to_path_buf(),
            ..ViewerConfig::default()
        };
        let resolver =
            StyleResolver::new(&viewer_config.styles_dir, &viewer_config.tile_server_url);

        (
            web::Data::new(Arc::new(viewer_config)),
            web::Data::new(Arc::new(resolver)),
        )
    }

    macro_rules! test_app {
        ($mbtiles_dir:expr, $styles_dir:expr) => {{
            let (viewer_config, resolver) = state($mbtiles_dir, $styles_dir);
            test::init_service(
                App::new()
                    .app_data(viewer_config)
                    .app_data(resolver)
                    .configure(config),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn health_is_always_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(dir.path(), dir.path());

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request())
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"status": "healthy"}));
    }

    #[actix_web::test]
    async fn index_describes_the_api() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(dir.path(), dir.path());

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["name"], json!(API_NAME));
        assert_eq!(body["version"], json!("1.0.0"));
        assert_eq!(body["endpoints"]["styles"], json!("/api/styles/{dataset_id}"));
        assert_eq!(
            body["endpoints"]["tilejson"],
            json!("/api/datasets/{dataset_id}/tilejson")
        );
        assert_eq!(body["frontend"], json!("http://localhost:3000"));
        assert_eq!(body["tileserver"], json!("http://localhost:8080"));
    }

    #[actix_web::test]
    async fn datasets_lists_only_present_packages() {
        let mbtiles = tempfile::tempdir().unwrap();
        let styles = tempfile::tempdir().unwrap();
        let app = test_app!(mbtiles.path(), styles.path());

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/datasets").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"datasets": []}));

        write_package(
            mbtiles.path(),
            "co_power_lines.mbtiles",
            &[("bounds", "-109.05,36.99,-102.04,41.00"), ("maxzoom", "12")],
        );

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/datasets").to_request(),
        )
        .await;
        let body: Value = test::read_body_json(resp).await;
        let datasets = body["datasets"].as_array().unwrap();

        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0]["id"], json!("co_power_lines"));
        assert_eq!(datasets[0]["type"], json!("vector"));
        assert_eq!(datasets[0]["format"], json!("mbtiles"));
        assert_eq!(datasets[0]["maxzoom"], json!(12));
        assert_eq!(
            datasets[0]["styling_options"]["available_templates"],
            json!(["power_by_voltage"])
        );
    }

    #[actix_web::test]
    async fn style_is_rewritten_for_tile_server() {
        let mbtiles = tempfile::tempdir().unwrap();
        let styles = tempfile::tempdir().unwrap();
        std::fs::write(styles.path().join("co_roads_style.json"), ROADS_STYLE).unwrap();
        let app = test_app!(mbtiles.path(), styles.path());

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/styles/co_roads?template=roads_by_type&field=highway")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["version"], json!(8));
        assert_eq!(
            body["sources"]["s1"],
            json!({
                "type": "vector",
                "tiles": ["http://localhost:8080/data/co_roads/{z}/{x}/{y}.pbf"],
                "minzoom": 0,
                "maxzoom": 14
            })
        );
        assert_eq!(
            body["sources"]["labels"],
            json!({"type": "geojson", "data": {"type": "FeatureCollection", "features": []}})
        );
    }

    #[actix_web::test]
    async fn missing_style_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app!(dir.path(), dir.path());

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/styles/co_roads").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"detail": "Style not found"}));
    }

    #[actix_web::test]
    async fn traversal_never_reads_outside_styles_dir() {
        let root = tempfile::tempdir().unwrap();
        let styles = root.path().join("styles");
        std::fs::create_dir(&styles).unwrap();
        std::fs::write(root.path().join("secret_style.json"), ROADS_STYLE).unwrap();
        let app = test_app!(root.path(), &styles);

        for uri in [
            "/api/styles/../secret",
            "/api/styles/..%2Fsecret",
            "/api/styles/%2E%2E%2Fsecret",
            "/api/styles/..",
        ] {
            let resp =
                test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert!(
                resp.status() == StatusCode::BAD_REQUEST
                    || resp.status() == StatusCode::NOT_FOUND,
                "{} returned {}",
                uri,
                resp.status()
            );
        }

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/styles/co-roads").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unreadable_style_is_a_server_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("co_roads_style.json")).unwrap();
        let app = test_app!(dir.path(), dir.path());

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/styles/co_roads").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"detail": "Could not load style"}));
    }

    #[actix_web::test]
    async fn malformed_style_is_a_server_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("co_roads_style.json"), "{\"version\": ").unwrap();
        let app = test_app!(dir.path(), dir.path());

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/styles/co_roads").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn tilejson_for_listed_dataset_only() {
        let mbtiles = tempfile::tempdir().unwrap();
        write_package(
            mbtiles.path(),
            "co_roads.mbtiles",
            &[("minzoom", "5"), ("maxzoom", "11")],
        );
        let app = test_app!(mbtiles.path(), mbtiles.path());

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/datasets/co_roads/tilejson")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["minzoom"], json!(5));
        assert_eq!(body["maxzoom"], json!(11));

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/datasets/co_railways/tilejson")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/datasets/co.roads/tilejson")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
