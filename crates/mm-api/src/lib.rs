use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    http::Method,
    http::header::{CONTENT_TYPE, HeaderValue},
    routing::{get, post},
};
use clap::Parser;
use dotenvy::dotenv;
use mm_core::geojson::{ExtractorConfig, FileDatasetSource, HttpDatasetSource};
use mm_core::index::{MunicipalityIndex, build_index};
use mm_core::store::{JsonFileStore, MemoryStore, VisitedPersistence, VisitedStore};
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub mod error;
pub mod handlers;

use error::ApiError;
use handlers::{health, progress, visits};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "mm-api",
    about = "HTTP API serving municipality visit progress to the map frontend"
)]
struct Cli {
    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3200)]
    port: u16,

    /// URL template for per-prefecture municipality GeoJSON; `{code}` is
    /// replaced by the two-digit prefecture code
    #[arg(long, env = "MM_GEOJSON_URL")]
    geojson_url: Option<String>,

    /// Local directory holding `<code>.json` municipality GeoJSON files
    #[arg(long, env = "MM_GEOJSON_DIR")]
    geojson_dir: Option<PathBuf>,

    /// Path of the persisted visited-code list
    #[arg(long, env = "MM_STORE_PATH", default_value = "data/visited.json")]
    store_path: PathBuf,

    /// Keep the visited set in memory only (no file persistence)
    #[arg(long, env = "MM_EPHEMERAL", default_value = "false")]
    ephemeral: bool,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "MM_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub geojson_url: Option<String>,
    pub geojson_dir: Option<PathBuf>,
    pub store_path: PathBuf,
    pub ephemeral: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        match (&cli.geojson_url, &cli.geojson_dir) {
            (None, None) => {
                return Err(ApiError::BadRequest(
                    "one of MM_GEOJSON_URL or MM_GEOJSON_DIR is required".into(),
                ));
            }
            (Some(_), Some(_)) => {
                return Err(ApiError::BadRequest(
                    "MM_GEOJSON_URL and MM_GEOJSON_DIR are mutually exclusive".into(),
                ));
            }
            _ => {}
        }

        Ok(Self {
            port: cli.port,
            geojson_url: cli.geojson_url,
            geojson_dir: cli.geojson_dir,
            store_path: cli.store_path,
            ephemeral: cli.ephemeral,
            cors_origins,
        })
    }

    pub fn for_tests() -> Self {
        Self {
            port: 3200,
            geojson_url: None,
            geojson_dir: None,
            store_path: PathBuf::from("data/visited.json"),
            ephemeral: true,
            cors_origins: vec!["http://localhost:3000".into()],
        }
    }

    fn geo_source(&self) -> GeoSource {
        if let Some(url) = &self.geojson_url {
            GeoSource::Http(Arc::new(HttpDatasetSource::new(url.clone())))
        } else if let Some(dir) = &self.geojson_dir {
            GeoSource::Dir(Arc::new(FileDatasetSource::new(dir)))
        } else {
            // from_cli が弾くので通常は来ない
            GeoSource::Fixed(MunicipalityIndex::default())
        }
    }
}

/// インデックス構築用のデータ取得元。Fixed はテストと劣化運転用。
pub enum GeoSource {
    Http(Arc<HttpDatasetSource>),
    Dir(Arc<FileDatasetSource>),
    Fixed(MunicipalityIndex),
}

impl GeoSource {
    pub async fn build(&self, extractor: &ExtractorConfig) -> MunicipalityIndex {
        match self {
            GeoSource::Http(source) => {
                let source = Arc::clone(source);
                build_index(
                    move |code| {
                        let source = Arc::clone(&source);
                        async move { source.fetch(code).await }
                    },
                    extractor,
                )
                .await
            }
            GeoSource::Dir(source) => {
                let source = Arc::clone(source);
                build_index(
                    move |code| {
                        let source = Arc::clone(&source);
                        async move { source.fetch(code).await }
                    },
                    extractor,
                )
                .await
            }
            GeoSource::Fixed(index) => index.clone(),
        }
    }
}

pub type ApiVisitedStore = VisitedStore<Box<dyn VisitedPersistence + Send + Sync>>;

pub struct AppState {
    pub config: AppConfig,
    pub source: GeoSource,
    pub extractor: ExtractorConfig,
    /// セッション中キャッシュされる市区町村インデックス。
    /// rebuild 時のみ write ロックで丸ごと差し替える。
    pub index: RwLock<MunicipalityIndex>,
    pub store: RwLock<ApiVisitedStore>,
}

pub type SharedState = Arc<AppState>;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let api_routes = Router::new()
        .route("/progress/national", get(progress::national))
        .route("/progress/prefectures", get(progress::all_prefectures))
        .route("/progress/prefectures/:name", get(progress::by_name))
        .route("/index/rebuild", post(progress::rebuild_index))
        .route("/visits/:code", get(visits::get_visit))
        .route("/visits/:code/toggle", post(visits::toggle_visit));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    mm_core::logging::init("mm-api");

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli)?;
    let source = config.geo_source();
    let extractor = ExtractorConfig::default();

    info!("building municipality index");
    let index = source.build(&extractor).await;
    info!(
        prefectures = index.len(),
        municipalities = index.total_codes(),
        "municipality index ready"
    );

    let persistence: Box<dyn VisitedPersistence + Send + Sync> = if config.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        Box::new(JsonFileStore::new(&config.store_path))
    };
    let store = VisitedStore::load(persistence);
    info!(visited = store.len(), "visited store loaded");

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let state = Arc::new(AppState {
        config,
        source,
        extractor,
        index: RwLock::new(index),
        store: RwLock::new(store),
    });
    let app = create_router(state);

    info!(%addr, "mm-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    axum::serve(listener, app)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(())
}

/// 統合テスト用の状態。インデックスは固定、永続化はインメモリ。
pub fn test_state(index: MunicipalityIndex, visited: &[&str]) -> SharedState {
    let persistence: Box<dyn VisitedPersistence + Send + Sync> = Box::new(MemoryStore::seeded(
        visited.iter().map(|code| serde_json::Value::from(*code)).collect(),
    ));
    let store = VisitedStore::load(persistence);

    Arc::new(AppState {
        config: AppConfig::for_tests(),
        source: GeoSource::Fixed(index.clone()),
        extractor: ExtractorConfig::default(),
        index: RwLock::new(index),
        store: RwLock::new(store),
    })
}
