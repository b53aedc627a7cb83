use anyhow::{bail, Context, Result};
use clap::Subcommand;
use larder_core::{Config, KdfParams, LocalStores, Vault, VaultEntry, VaultStatus};

#[derive(Subcommand)]
pub enum VaultCommand {
    /// Show whether a vault exists
    Status,
    /// Create a new vault
    Init {
        /// Repeat the password (defaults to --password)
        #[arg(long)]
        confirm: Option<String>,
    },
    /// List vault entries
    List,
    /// Add a link
    Add {
        title: String,
        url: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Remove a link by id
    Remove {
        id: String,
    },
    /// Delete the vault, its password and every entry
    Wipe {
        #[arg(long)]
        yes: bool,
    },
}

pub async fn run(
    config: &Config,
    stores: &LocalStores,
    password: Option<String>,
    command: VaultCommand,
) -> Result<()> {
    let mut vault = Vault::from_stores(stores, KdfParams::from_config(config));

    match command {
        VaultCommand::Status => {
            let status = match vault.status().await? {
                VaultStatus::Uninitialized => "not created",
                VaultStatus::Locked => "locked",
                VaultStatus::Unlocked => "unlocked",
            };
            println!("Vault is {}", status);
        }
        VaultCommand::Init { confirm } => {
            let password = require_password(password)?;
            let confirm = confirm.unwrap_or_else(|| password.clone());
            vault.create_credential(&password, &confirm).await?;
            println!("Vault created.");
        }
        VaultCommand::List => {
            unlock(&mut vault, password).await?;
            let entries = vault.entries()?;
            if entries.is_empty() {
                println!("Vault is empty.");
            }
            for entry in entries {
                println!("{}  {}  {}", entry.id, entry.title, entry.url);
                if !entry.notes.is_empty() {
                    println!("    {}", entry.notes);
                }
            }
        }
        VaultCommand::Add { title, url, notes } => {
            unlock(&mut vault, password).await?;
            let entry = VaultEntry::new(&title, &url, &notes);
            let id = entry.id.clone();
            vault.add_entry(entry).await?;
            println!("Added {}", id);
        }
        VaultCommand::Remove { id } => {
            unlock(&mut vault, password).await?;
            if !vault.remove_entry(&id).await? {
                bail!("No vault entry with id {}", id);
            }
            println!("Removed {}", id);
        }
        VaultCommand::Wipe { yes } => {
            if !yes {
                bail!("Refusing to wipe the vault without --yes");
            }
            vault.wipe().await?;
            println!("Vault wiped.");
        }
    }

    vault.lock();
    Ok(())
}

fn require_password(password: Option<String>) -> Result<String> {
    password.context("A vault password is required (--password or LARDER_VAULT_PASSWORD)")
}

async fn unlock(vault: &mut Vault, password: Option<String>) -> Result<()> {
    let password = require_password(password)?;
    vault.unlock(&password).await?;
    Ok(())
}
