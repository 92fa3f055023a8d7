use actix_web::middleware::Logger;
use actix_web::{App, HttpServer};
use dotenv::dotenv;
use log::info;
use std::io;

use department_management::config::AppConfig;
use department_management::{add_department_services, DepartmentsTableBuilder};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().map_err(io::Error::other)?;

    DepartmentsTableBuilder::run(&config.database_url, config.dialect, true).await;
    if config.build_tenant_databases {
        DepartmentsTableBuilder::run(&config.database_url, config.dialect, false).await;
    }

    let services = add_department_services(
        &config.database_url,
        config.repository_mode,
        config.dialect,
        config.context_lifetime,
    )
    .map_err(io::Error::other)?;

    info!("Starting server at {}", config.bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(|cfg| services.configure(cfg))
    })
    .bind(&config.bind_address)?
    .run()
    .await
}
