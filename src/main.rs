use eframe::CreationContext;
use product_import_admin::app::routes::Route;
use product_import_admin::app::{AdminApp, Bootstrap};
use product_import_admin::config::{self, Config};
use reqwest::Url;
use std::error::Error;
use tokio::runtime::Runtime;

/// Points the import endpoints at an in-process mock. Debug builds only.
#[cfg(debug_assertions)]
fn install_mock_backend(
    runtime: &Runtime,
    config: &mut Config,
) -> Result<Option<product_import_admin::mock::MockBackend>, Box<dyn Error>> {
    use product_import_admin::mock::MockBackend;

    if !config.dev.mock_backend {
        return Ok(None);
    }
    let backend = runtime.block_on(MockBackend::start(&config.import.resource_path))?;
    log::warn!(
        "Development build: {} is served by the mock backend at {}",
        config.import.resource_path,
        backend.base_url()
    );
    config.api.base_url = backend.base_url().to_string();
    Ok(Some(backend))
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .with_colors(true)
        .with_threads(true)
        .with_local_timestamps()
        .init()?;

    let runtime = Runtime::new()?;

    #[allow(unused_mut)]
    let mut config = runtime.block_on(config::load_config()).unwrap_or_else(|e| {
        log::error!("{e}, falling back to default configuration");
        Config::default()
    });

    #[cfg(debug_assertions)]
    let _mock_backend = install_mock_backend(&runtime, &mut config)?;

    let api_base_url = Url::parse(&config.api.base_url)?;
    let http = reqwest::Client::builder().build()?;
    let start_route = std::env::args()
        .nth(1)
        .and_then(|path| Route::from_path(&path))
        .unwrap_or_default();

    let bootstrap = Bootstrap {
        config,
        api_base_url,
        http,
        runtime: runtime.handle().clone(),
        start_route,
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([720.0, 520.0])
            .with_min_inner_size([420.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Product Import Admin",
        options,
        Box::new(move |cc: &CreationContext| Box::new(AdminApp::new(cc, bootstrap))),
    )?;

    Ok(())
}
