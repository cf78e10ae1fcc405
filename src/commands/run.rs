use anyhow::Result;
use console::style;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::docker::Container;
use crate::{mongo, nats, postgres};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// JSON object for scripts
    Json,
}

/// What a started container exposes to its clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub backend: String,
    pub container_id: String,
    pub container_name: String,
    pub image: String,
    pub connection_string: String,
    pub ports: BTreeMap<String, u16>,
}

impl ConnectionInfo {
    fn new(backend: &str, container: &Container, connection_string: &str) -> Self {
        Self {
            backend: backend.to_string(),
            container_id: container.id().to_string(),
            container_name: container.name().to_string(),
            image: container.image().to_string(),
            connection_string: connection_string.to_string(),
            ports: container
                .ports()
                .iter()
                .map(|(port, host_port)| (port.clone(), *host_port))
                .collect(),
        }
    }
}

// Each command hands back the container, which stays up while it is held

pub async fn cmd_mongo(config: &Config, format: OutputFormat) -> Result<Container> {
    let mongo = mongo::run_with_timeout(config.connect_timeout.0, vec![]).await?;
    let info = ConnectionInfo::new("mongo", mongo.container(), &mongo.connection_string);
    print_connection_info(&info, format)?;
    Ok(mongo.container().clone())
}

pub async fn cmd_nats(config: &Config, format: OutputFormat) -> Result<Container> {
    let nats = nats::run_with_timeout(config.connect_timeout.0, vec![]).await?;
    let info = ConnectionInfo::new("nats", nats.container(), &nats.connection_string);
    print_connection_info(&info, format)?;
    Ok(nats.container().clone())
}

pub async fn cmd_postgres(config: &Config, format: OutputFormat) -> Result<Container> {
    let postgres = postgres::run_with_timeout(config.connect_timeout.0, vec![]).await?;
    let info = ConnectionInfo::new("postgres", postgres.container(), &postgres.connection_string);
    print_connection_info(&info, format)?;
    Ok(postgres.container().clone())
}

fn print_connection_info(info: &ConnectionInfo, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(info)?),
        OutputFormat::Text => println!("{}", render_text(info)),
    }
    Ok(())
}

fn render_text(info: &ConnectionInfo) -> String {
    let mut lines = vec![
        format!(
            "🚀 {} {}",
            style(&info.backend).bold(),
            style("container is ready").green()
        ),
        format!("   {:<10} {}", style("image").dim(), info.image),
        format!(
            "   {:<10} {} ({})",
            style("container").dim(),
            info.container_name,
            short_id(&info.container_id)
        ),
    ];
    for (port, host_port) in &info.ports {
        lines.push(format!("   {:<10} {} -> {}", style("port").dim(), port, host_port));
    }
    lines.push(format!(
        "   {:<10} {}",
        style("connect").dim(),
        style(&info.connection_string).cyan()
    ));
    lines.push(format!(
        "{}",
        style("Press Ctrl-C to stop and remove the container").dim()
    ));
    lines.join("\n")
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}
