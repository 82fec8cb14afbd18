use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing_subscriber::EnvFilter;

mod api;
mod camera;
mod classify;
mod config;
mod scanner;

use api::AppState;
use config::Config;
use scanner::ScanState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("stillscan=debug".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("classify") {
        let Some(path) = args.get(2) else {
            eprintln!("usage: stillscan classify <image-path>");
            std::process::exit(2);
        };
        return classify_image(path);
    }

    let config = Config::load()?;
    config.require_cameras()?;
    tracing::info!("loaded {} camera(s)", config.cameras.len());

    let shutdown = Arc::new(AtomicBool::new(false));
    let mut scans = HashMap::new();
    let mut handles = Vec::new();

    for cam_config in config.cameras {
        let state = Arc::new(RwLock::new(ScanState::default()));
        scans.insert(cam_config.id.clone(), Arc::clone(&state));

        let handle = scanner::spawn_session(
            cam_config,
            config.classifier.clone(),
            state,
            Arc::clone(&shutdown),
        );
        handles.push(handle);
    }

    let server_state = AppState::new(scans);
    let port = config.http.port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = api::start_server(server_state, port).await {
            tracing::error!(error = %e, "HTTP server failed");
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    shutdown.store(true, Ordering::Relaxed);
    for handle in handles {
        let _ = handle.await;
    }
    server_handle.abort();

    tracing::info!("shutdown complete");
    Ok(())
}

/// One-shot mode: classify a single image from disk and print the
/// result.
fn classify_image(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    use opencv::imgcodecs;
    use opencv::prelude::*;

    let config = Config::load()?;
    let mut classifier = classify::ImageClassifier::new(&config.classifier)
        .map_err(|e| e as Box<dyn std::error::Error>)?;

    let image = imgcodecs::imread(path, imgcodecs::IMREAD_COLOR)?;
    if image.empty() {
        return Err(format!("failed to decode image {path}").into());
    }

    let results = classifier
        .classify(&image)
        .map_err(|e| e as Box<dyn std::error::Error>)?;
    println!("{}", classify::format_classifications(&results));

    Ok(())
}
