use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{middleware, web, App, HttpServer};
use log::{info, warn};
use mentat::app::AppState;
use mentat::config::Config;
use mentat::handlers::{configure_routes, static_handler};
use mentat::monitor::spawn_refresh_loop;
use rustls::ServerConfig;
use rustls_pemfile::{certs, pkcs8_private_keys};
use std::env;
use std::fs::File as FsFile;
use std::io::{self, BufReader};
use std::path::Path;

fn load_tls_config(cert_path: &str, key_path: &str) -> io::Result<ServerConfig> {
    let cert_file = &mut BufReader::new(FsFile::open(cert_path)?);
    let key_file = &mut BufReader::new(FsFile::open(key_path)?);
    let cert_chain = certs(cert_file).collect::<Result<Vec<_>, _>>()?;
    let mut keys = pkcs8_private_keys(key_file).collect::<Result<Vec<_>, _>>()?;

    if keys.is_empty() {
        return Err(io::Error::new(io::ErrorKind::Other, "No private keys found in key file"));
    }

    ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(cert_chain, keys.remove(0).into())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    // Override the log level with RUST_LOG, e.g. `RUST_LOG=debug`.
    env::set_var("RUST_LOG", env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()));
    env_logger::init();

    let config = Config::from_env();
    let addr = config.bind_addr();
    let state = web::Data::new(AppState::new(&config));
    spawn_refresh_loop(state.monitor.clone(), config.monitor_interval);
    info!("MENTAT shell running at http://{}", addr);

    let app_state = state.clone();
    let mut http_server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin_fn(|origin, _| {
                origin.as_bytes().starts_with(b"http://localhost") || origin.as_bytes().starts_with(b"http://127.0.0.1")
            })
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
            .default_service(web::to(static_handler))
    });

    match (&config.cert_path, &config.key_path) {
        (Some(cert_path), Some(key_path)) if Path::new(cert_path).exists() && Path::new(key_path).exists() => {
            info!("Attempting to start HTTPS server...");
            let tls = load_tls_config(cert_path, key_path)?;
            info!("Successfully configured TLS. Binding to https://{}", addr);
            http_server = http_server.bind_rustls_0_23(addr, tls)?;
        }
        (Some(_), Some(_)) => {
            warn!("CERT_PATH or KEY_PATH points to a non-existent file. Starting without HTTPS.");
            http_server = http_server.bind(addr)?;
        }
        _ => {
            info!("No CERT_PATH or KEY_PATH found in env. Starting plain HTTP server.");
            http_server = http_server.bind(addr)?;
        }
    }

    http_server.run().await
}
