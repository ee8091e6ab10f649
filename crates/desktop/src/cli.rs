//! Command-line front end over [`WardrobeApp`].

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use wardrobe_closet::{Category, Fit, Item};
use wardrobe_core::{DomainError, FitId, ItemId};

use crate::app::WardrobeApp;
use crate::decode::UploadFile;

#[derive(Debug, Parser)]
#[command(name = "wardrobe", version, about = "Catalogue clothing images and compose fits")]
pub struct Cli {
    /// Directory holding the closet database (overrides WARDROBE_DATA_DIR).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Catalogue image files under one category.
    Add {
        #[arg(long)]
        category: Category,
        /// Product link applied to every uploaded image.
        #[arg(long)]
        url: Option<String>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List items, newest first.
    Items {
        #[arg(long)]
        category: Option<Category>,
    },
    DeleteItem {
        id: ItemId,
    },
    /// Set or clear (when omitted) an item's product link.
    SetUrl {
        id: ItemId,
        url: Option<String>,
    },
    /// List saved fits.
    Fits,
    ShowFit {
        id: FitId,
    },
    /// Save a new fit from `--slot category=item-id` selections.
    SaveFit {
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "slot", value_parser = parse_slot)]
        slots: Vec<(Category, ItemId)>,
    },
    /// Edit a saved fit: its slots are loaded, overrides applied, then committed.
    UpdateFit {
        id: FitId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "slot", value_parser = parse_slot)]
        slots: Vec<(Category, ItemId)>,
        /// Categories to empty.
        #[arg(long)]
        clear: Vec<Category>,
    },
    DeleteFit {
        id: FitId,
    },
}

fn parse_slot(raw: &str) -> Result<(Category, ItemId), String> {
    let (category, id) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <category>=<item-id>, got {raw:?}"))?;
    let category = category.parse::<Category>().map_err(|e| e.to_string())?;
    let id = id.parse::<ItemId>().map_err(|e| e.to_string())?;
    Ok((category, id))
}

/// Execute one command, writing human-readable output to `out`.
pub async fn run(command: Command, app: &WardrobeApp, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Command::Add {
            category,
            url,
            files,
        } => {
            let mut uploads = Vec::with_capacity(files.len());
            let mut unreadable = 0usize;
            for path in &files {
                match UploadFile::from_path(path).await {
                    Ok(upload) => uploads.push(upload),
                    Err(err) => {
                        writeln!(out, "skipped: {err}")?;
                        unreadable += 1;
                    }
                }
            }

            let report = app.add_items(&uploads, category, url.as_deref()).await;
            for id in &report.added {
                writeln!(out, "added {id} ({category})")?;
            }
            for err in &report.failures {
                writeln!(out, "skipped: {err}")?;
            }

            let failed = unreadable + report.failures.len();
            if failed > 0 {
                bail!("{failed} of {} file(s) could not be added", files.len());
            }
        }
        Command::Items { category } => {
            let items = match category {
                Some(category) => app
                    .group_by_category()
                    .await
                    .remove(&category)
                    .unwrap_or_default(),
                None => app.items().await,
            };
            for item in &items {
                writeln!(out, "{}", item_line(item))?;
            }
        }
        Command::DeleteItem { id } => {
            if !app.delete_item(id).await {
                return Err(DomainError::not_found()).with_context(|| format!("item {id}"));
            }
            writeln!(out, "deleted item {id}")?;
        }
        Command::SetUrl { id, url } => {
            if !app.set_item_url(id, url.as_deref().unwrap_or_default()).await {
                return Err(DomainError::not_found()).with_context(|| format!("item {id}"));
            }
            let item = app.item(id).await;
            let link = item.and_then(|i| i.url).unwrap_or_else(|| "-".to_string());
            writeln!(out, "item {id} link: {link}")?;
        }
        Command::Fits => {
            for fit in app.fits().await {
                write_fit(out, &fit)?;
            }
        }
        Command::ShowFit { id } => {
            let fit = app
                .fit(id)
                .await
                .ok_or_else(DomainError::not_found)
                .with_context(|| format!("fit {id}"))?;
            writeln!(out, "{}  {}", fit.id, fit.name)?;
            let resolved = app.resolve_fit(id).await.unwrap_or_default();
            for (category, item) in resolved {
                match item {
                    Some(item) => writeln!(out, "  {:<8} {}", category.label(), item_line(&item))?,
                    None => writeln!(out, "  {:<8} -", category.label())?,
                }
            }
        }
        Command::SaveFit { name, slots } => {
            app.clear_all().await;
            select_all(app, &slots).await?;
            let id = app.save_current_fit(name.as_deref()).await;
            writeln!(out, "saved fit {id}")?;
        }
        Command::UpdateFit {
            id,
            name,
            slots,
            clear,
        } => {
            if !app.load_fit_for_edit(id).await {
                return Err(DomainError::not_found()).with_context(|| format!("fit {id}"));
            }
            for category in clear {
                app.clear_slot(category).await;
            }
            select_all(app, &slots).await?;
            let committed = app.commit_current_fit(name.as_deref()).await;
            writeln!(out, "updated fit {}", committed.fit_id())?;
        }
        Command::DeleteFit { id } => {
            if !app.delete_fit(id).await {
                return Err(DomainError::not_found()).with_context(|| format!("fit {id}"));
            }
            writeln!(out, "deleted fit {id}")?;
        }
    }

    let health = app.persistence_health();
    if let Some(err) = health.last_error {
        tracing::warn!(error = %err, failed_writes = health.failed_writes, "changes may not have been saved");
    }
    Ok(())
}

async fn select_all(app: &WardrobeApp, slots: &[(Category, ItemId)]) -> anyhow::Result<()> {
    for (category, item) in slots {
        if !app.select_for_slot(*category, *item).await {
            return Err(DomainError::not_found()).with_context(|| format!("item {item}"));
        }
    }
    Ok(())
}

fn item_line(item: &Item) -> String {
    format!(
        "{}  {:<8} {:<14} {}  {}",
        item.id,
        item.category.key(),
        item.image.mime(),
        item.created_at.to_rfc3339(),
        item.url.as_deref().unwrap_or("-"),
    )
}

fn write_fit(out: &mut impl Write, fit: &Fit) -> std::io::Result<()> {
    writeln!(out, "{}  {}", fit.id, fit.name)?;
    for (category, item) in fit.slots.iter() {
        if let Some(item) = item {
            writeln!(out, "  {:<8} {item}", category.key())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DataUrlDecoder;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 9];

    async fn memory_app() -> WardrobeApp {
        WardrobeApp::bootstrap(Arc::new(MemoryStore::new()), Arc::new(DataUrlDecoder)).await
    }

    async fn exec(app: &WardrobeApp, args: &[&str]) -> anyhow::Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("wardrobe").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        run(cli.command, app, &mut out).await?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn slot_argument_parses() {
        let id = ItemId::new();
        let (category, parsed) = parse_slot(&format!("shoes={id}")).unwrap();
        assert_eq!(category, Category::Shoes);
        assert_eq!(parsed, id);
        assert!(parse_slot("shoes").is_err());
        assert!(parse_slot("hats=1").is_err());
    }

    #[tokio::test]
    async fn add_save_and_show_fit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tee.png");
        std::fs::write(&path, PNG).unwrap();
        let app = memory_app().await;

        let output = exec(&app, &["add", "--category", "top", path.to_str().unwrap()])
            .await
            .unwrap();
        assert!(output.starts_with("added "));
        let item = app.items().await[0].id;

        let slot = format!("top={item}");
        let output = exec(&app, &["save-fit", "--name", "Casual", "--slot", &slot])
            .await
            .unwrap();
        let fit_id = output.trim().trim_start_matches("saved fit ").to_string();

        let shown = exec(&app, &["show-fit", &fit_id]).await.unwrap();
        assert!(shown.contains("Casual"));
        assert!(shown.contains(&item.to_string()));

        let listed = exec(&app, &["items", "--category", "top"]).await.unwrap();
        assert_eq!(listed.lines().count(), 1);
        let none = exec(&app, &["items", "--category", "socks"]).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn add_reports_undecodable_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("ok.png");
        let bad = dir.path().join("notes.txt");
        std::fs::write(&good, PNG).unwrap();
        std::fs::write(&bad, b"hello").unwrap();
        let app = memory_app().await;

        let err = exec(
            &app,
            &["add", "--category", "bags", good.to_str().unwrap(), bad.to_str().unwrap()],
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("1 of 2"));
        assert_eq!(app.items().await.len(), 1);
    }

    #[tokio::test]
    async fn update_fit_applies_overrides() {
        let app = memory_app().await;
        let files = [
            UploadFile::new("a.png", PNG.to_vec()),
            UploadFile::new("b.png", PNG.to_vec()),
        ];
        let added = app.add_items(&files, Category::Shoes, None).await.added;
        app.select_for_slot(Category::Shoes, added[0]).await;
        app.select_for_slot(Category::Socks, added[1]).await;
        let fit_id = app.save_current_fit(Some("Run")).await;
        app.clear_all().await;

        let slot = format!("shoes={}", added[1]);
        exec(
            &app,
            &["update-fit", &fit_id.to_string(), "--slot", &slot, "--clear", "socks"],
        )
        .await
        .unwrap();

        let fit = app.fit(fit_id).await.unwrap();
        assert_eq!(fit.name, "Run");
        assert_eq!(fit.slots.get(Category::Shoes), Some(added[1]));
        assert_eq!(fit.slots.get(Category::Socks), None);
        assert_eq!(app.editing().await, None);
    }

    #[tokio::test]
    async fn unknown_ids_fail_with_not_found() {
        let app = memory_app().await;
        let err = exec(&app, &["delete-item", &ItemId::new().to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::NotFound)));
    }

    #[tokio::test]
    async fn set_url_without_value_clears() {
        let app = memory_app().await;
        let added = app
            .add_items(&[UploadFile::new("a.png", PNG.to_vec())], Category::Belts, Some("https://x"))
            .await
            .added;

        let output = exec(&app, &["set-url", &added[0].to_string()]).await.unwrap();
        assert!(output.ends_with("link: -\n"));
        assert_eq!(app.item(added[0]).await.unwrap().url, None);
    }
}
