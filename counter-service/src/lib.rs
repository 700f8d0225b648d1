use std::{fs::File, io, io::BufReader, sync::Arc};

use actix_web::{
    dev::Server,
    get,
    http::StatusCode,
    middleware::Compress,
    post,
    web::{self, Bytes},
    App, HttpResponse, HttpServer, Responder,
};
use counter_handler::{
    config::{env_bool, env_string},
    Handler, HandlerConfig, Request,
};
use rustls::{Certificate, PrivateKey, ServerConfig};
use rustls_pemfile::{certs, pkcs8_private_keys};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// PEM files used to serve HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: String,
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub bind: String,
    /// Serve plain HTTP when unset.
    pub tls: Option<TlsPaths>,
    pub handler: HandlerConfig,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.into(),
            tls: None,
            handler: HandlerConfig::default(),
        }
    }
}

impl ServiceSettings {
    pub fn from_env() -> Self {
        let cert = env_string("COUNTER_TLS_CERT", String::new());
        let key = env_string("COUNTER_TLS_KEY", String::new());
        Self {
            bind: env_string("COUNTER_BIND", DEFAULT_BIND.into()),
            tls: (!cert.is_empty() && !key.is_empty()).then_some(TlsPaths { cert, key }),
            handler: HandlerConfig::from_env(),
        }
    }
}

/// Install the global tracing subscriber. `RUST_LOG` picks the filter and
/// `COUNTER_LOG_JSON` switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("COUNTER_LOG_JSON", false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[post("/counters/{counterId}")]
async fn increment(
    handler: web::Data<dyn Handler>,
    counter_id: web::Path<String>,
    body: Bytes,
) -> HttpResponse {
    let request = Request::default()
        .with_raw_body(&body)
        .with_path_parameter("counterId", &counter_id);

    let response = handler.handle(&request).await;
    debug!(
        "POST /counters/{} -> {}",
        counter_id.as_str(),
        response.status_code
    );

    let status = StatusCode::from_u16(response.status_code)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status)
        .content_type("application/json")
        .body(response.body)
}

/// Register the service's routes. Expects a `web::Data<dyn Handler>` in
/// the app data.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(increment);
}

pub fn handler_data(handler: Arc<dyn Handler>) -> web::Data<dyn Handler> {
    web::Data::from(handler)
}

/// Bind the service and return the running server. The caller drives it.
pub fn serve(settings: &ServiceSettings, handler: Arc<dyn Handler>) -> io::Result<Server> {
    let data = handler_data(handler);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(Compress::default())
            .configure(routes)
    });

    let server = match &settings.tls {
        Some(tls) => {
            let config = load_rustls_config(tls)?;
            let server = server.bind_rustls(settings.bind.as_str(), config)?;
            info!("Listening on {} with TLS", settings.bind);
            server
        }
        None => {
            let server = server.bind(settings.bind.as_str())?;
            info!("Listening on {}", settings.bind);
            server
        }
    };

    Ok(server.run())
}

fn load_rustls_config(tls: &TlsPaths) -> io::Result<ServerConfig> {
    // init server config builder with safe defaults
    let config = ServerConfig::builder()
        .with_safe_defaults()
        .with_no_client_auth();

    // load TLS key/cert files
    let cert_file = &mut BufReader::new(File::open(&tls.cert)?);
    let key_file = &mut BufReader::new(File::open(&tls.key)?);

    // convert files to key/cert objects
    let cert_chain = certs(cert_file)?.into_iter().map(Certificate).collect();
    let mut keys: Vec<PrivateKey> = pkcs8_private_keys(key_file)?
        .into_iter()
        .map(PrivateKey)
        .collect();

    if keys.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("could not locate PKCS 8 private keys in {}", tls.key),
        ));
    }

    config
        .with_single_cert(cert_chain, keys.remove(0))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}
