use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ViewerConfig {
    #[arg(long, env = "VIEWER_ADDRESS", default_value = "0.0.0.0")]
    pub address: String,

    #[arg(short, long, env = "VIEWER_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Worker threads for the HTTP server. Defaults to the number of CPUs.
    #[arg(long, env = "VIEWER_WORKERS")]
    pub workers: Option<usize>,

    /// Directory holding `{dataset_id}.mbtiles` packages
    #[arg(long, env = "MBTILES_PATH", default_value = "../data/mbtiles")]
    pub mbtiles_dir: PathBuf,

    /// Directory holding `{dataset_id}_style.json` documents
    #[arg(long, env = "STYLES_PATH", default_value = "../data/styles")]
    pub styles_dir: PathBuf,

    /// Base URL of the external tile server that serves the `.pbf` tiles
    #[arg(long, env = "TILESERVER_URL", default_value = "http://localhost:8080", value_parser = parse_base_url)]
    pub tile_server_url: String,

    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:3000", value_parser = parse_base_url)]
    pub frontend_url: String,

    #[arg(long, env = "RUST_LOG_LEVEL", default_value = "info")]
    pub log_level: tracing::Level,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            address: String::from("0.0.0.0"),
            port: 8000,
            workers: None,
            mbtiles_dir: PathBuf::from("../data/mbtiles"),
            styles_dir: PathBuf::from("../data/styles"),
            tile_server_url: String::from("http://localhost:8080"),
            frontend_url: String::from("http://localhost:3000"),
            log_level: tracing::Level::INFO,
        }
    }
}

fn parse_base_url(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim().trim_end_matches('/');

    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(format!("{raw:?} must start with http:// or https://"));
    }

    Ok(trimmed.to_string())
}
