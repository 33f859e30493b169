//! Command dispatch.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rollcall_attendance::{Collaborators, Outcome, Service};
use rollcall_kv::RedbStore;
use rollcall_ledger::Ledger;
use rollcall_source::{DirFileSource, JsonEmbeddingSource, StaticTokens};
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::{Cli, Commands};

/// Runs the selected command and prints its outcome. Returns whether the
/// outcome was a success.
pub fn run(cli: &Cli) -> Result<bool> {
    let service = open_service(cli)?;
    let token = cli.token.as_str();

    match &cli.command {
        Commands::Register { id, name, image } => {
            let image = read(image)?;
            emit(&service.register(token, id, name, &image))
        }
        Commands::Attend { context, frames } => {
            let frames = frames
                .iter()
                .map(|p| read(p))
                .collect::<Result<Vec<_>>>()?;
            let frames: Vec<&[u8]> = frames.iter().map(Vec::as_slice).collect();
            emit(&service.take_attendance_frames(token, context, &frames))
        }
        Commands::Complete { context } => emit(&service.complete_session(token, context)),
        Commands::Compare { id } => emit(&service.compare_handwriting(token, id)),
        Commands::Report { context, date } => {
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            emit(&service.report(token, date, context))
        }
        Commands::Identities => emit(&service.identities(token)),
    }
}

fn open_service(cli: &Cli) -> Result<Service> {
    let cfg = Config::load(cli.config.as_deref())?;

    let db = cfg.database_path(cli.db.as_deref())?;
    if let Some(parent) = db.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    debug!(db = %db.display(), "opening database");
    let store = RedbStore::open(&db).with_context(|| format!("open {}", db.display()))?;
    let ledger = Ledger::open(Box::new(store), cfg.ledger.clone())?;

    let collab = Collaborators {
        faces: Box::new(JsonEmbeddingSource::new(cfg.faces.dim)),
        handwriting: Box::new(JsonEmbeddingSource::new(cfg.handwriting.dim)),
        files: Box::new(DirFileSource::new(cfg.files_dir())),
        auth: Box::new(StaticTokens::new(cfg.tokens.iter().cloned())),
    };
    Ok(Service::new(cfg.service(), Arc::new(ledger), collab)?)
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read {}", path.display()))
}

fn emit<T: Serialize>(outcome: &Outcome<T>) -> Result<bool> {
    println!("{}", serde_json::to_string(outcome)?);
    Ok(outcome.is_success())
}
