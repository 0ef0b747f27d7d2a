use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use inquire::error::InquireResult;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod config;
mod ddg;
mod entries;
mod search;
mod search_query;
mod storage;
mod tags;
#[cfg(test)]
mod tests;
mod web;

use app::{AppBackend, AppLocal, Payload};
use config::Config;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tagmark=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    init_logging();

    let config = Config::load()?;
    let listen_default = config.listen.clone();
    let app_mgr = AppLocal::new(config)?;

    match args.command {
        cli::Command::Daemon { listen } => {
            let listen = listen.unwrap_or(listen_default);
            web::start_daemon(Arc::new(app_mgr), listen)
        }

        cli::Command::Search { query, path, count } => {
            let entries = app_mgr.search(&query, &path)?;

            if count {
                println!("{} entries found", entries.len());
                return Ok(());
            }

            print_json(&entries)
        }

        cli::Command::Tags {} => print_json(&app_mgr.tag_tree()?),

        cli::Command::Add {
            url,
            title,
            description,
            tags,
        } => {
            let mut payload = Payload::new();
            payload.insert("url".to_string(), Value::String(url));
            if let Some(title) = title {
                payload.insert("title".to_string(), Value::String(title));
            }
            if let Some(description) = description {
                payload.insert("description".to_string(), Value::String(description));
            }
            if let Some(tags) = tags {
                payload.insert("tags".to_string(), json!(entries::parse_tags(&tags)));
            }

            let entry = app_mgr.create(payload)?;
            print_json(&entry)
        }

        cli::Command::Delete { id, yes } => {
            let entry = app_mgr.get(&id)?;

            if !yes {
                match inquire::prompt_confirmation(format!(
                    "Are you sure you want to delete \"{}\" ({})?",
                    entry.title, entry.url
                )) {
                    InquireResult::Ok(true) => {}
                    InquireResult::Ok(false) => return Ok(()),
                    InquireResult::Err(err) => bail!("An error occurred: {}", err),
                }
            }

            app_mgr.delete(&id)?;
            println!("entry {id} removed");
            Ok(())
        }

        cli::Command::Import { file } => {
            let bytes = std::fs::read(&file).with_context(|| format!("couldnt read {file}"))?;
            let payload = match serde_json::from_slice::<Value>(&bytes)? {
                // a bare list is accepted as well as an export document
                list @ Value::Array(_) => {
                    let mut payload = Payload::new();
                    payload.insert("entries".to_string(), list);
                    payload
                }
                Value::Object(map) => map,
                _ => bail!("{file} is neither a list nor an export document"),
            };

            let imported = app_mgr.import(payload)?;
            println!("{imported} entries imported");
            Ok(())
        }

        cli::Command::Export {} => print_json(&app_mgr.export()?),
    }
}
