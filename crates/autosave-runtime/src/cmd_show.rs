//! `autosave show` and `autosave signature`: read and manage stored records.

use std::path::Path;

use autosave_core::{KeyValueStore, SignatureStore};
use autosave_runtime::JsonFileStore;
use chrono::Utc;

use crate::cli::SignatureCommand;

pub fn cmd_show(store_path: &Path, key: &str) -> anyhow::Result<()> {
    let store = JsonFileStore::new(store_path);
    let Some(raw) = store.get(key)? else {
        anyhow::bail!("no draft stored under '{key}'");
    };
    let draft: serde_json::Value = serde_json::from_str(&raw)?;
    println!("{}", serde_json::to_string_pretty(&draft)?);
    Ok(())
}

pub fn cmd_signature(store_path: &Path, command: SignatureCommand) -> anyhow::Result<()> {
    let signatures = SignatureStore::new(JsonFileStore::new(store_path));
    match command {
        SignatureCommand::Save { image, name } => {
            let record = signatures.save(image, name, Utc::now())?;
            println!("signature saved for {} at {}", record.name, record.timestamp);
        }
        SignatureCommand::Show => match signatures.get()? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("no signature stored"),
        },
        SignatureCommand::Clear => {
            signatures.remove()?;
            println!("signature removed");
        }
    }
    Ok(())
}
