use chrono::{DateTime, Local, Utc};

use crate::app::{AppContext, NovelRankError, Result};
use crate::domain::{DisplayFlags, Item, Settings, Snapshot, ALL_CATEGORIES};

/// Fields changed by `settings set`; `None` keeps the stored value.
#[derive(Debug, Default, Clone)]
pub struct SettingsUpdate {
    pub sources: Option<Vec<String>>,
    pub interval_hours: Option<u64>,
    pub default_category: Option<String>,
    pub show_rating: Option<bool>,
    pub show_author: Option<bool>,
    pub show_category: Option<bool>,
}

pub async fn refresh(ctx: &AppContext, force: bool) -> Result<()> {
    println!("Updating rankings...");

    let response = ctx.request_refresh(force).await;
    if !response.success {
        return Err(NovelRankError::Other(
            response.error.unwrap_or_else(|| "update failed".into()),
        ));
    }

    match ctx.snapshot().await? {
        Some(snapshot) => println!(
            "Rankings up to date: {} novels (updated {})",
            snapshot.items.len(),
            format_last_update(Some(snapshot.last_update))
        ),
        None => println!("Rankings up to date"),
    }
    Ok(())
}

pub async fn list(ctx: &AppContext, category: Option<String>, cached: bool, json: bool) -> Result<()> {
    if !cached {
        let response = ctx.request_refresh(false).await;
        if let Some(error) = response.error {
            eprintln!("Could not update rankings: {}", error);
        }
    }

    let settings = ctx.settings.resolve().await;
    let category = category.unwrap_or_else(|| selected_category(&settings).to_string());
    if let Err(e) = ctx.settings.remember_category(&category).await {
        tracing::warn!("Failed to remember category: {}", e);
    }

    let Some(snapshot) = ctx.snapshot().await? else {
        if json {
            println!("[]");
        } else {
            println!("No rankings yet. Run `novelrank refresh`.");
        }
        return Ok(());
    };

    let items: Vec<&Item> = snapshot.filter_by_category(&category).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No novels in category {}", category);
    }
    for (i, item) in items.iter().enumerate() {
        println!("{}", format_item_line(i + 1, item, &settings.display));
    }
    println!();
    println!("Last update: {}", format_last_update(Some(snapshot.last_update)));

    Ok(())
}

pub async fn status(ctx: &AppContext) -> Result<()> {
    let settings = ctx.settings.resolve().await;
    let snapshot = ctx.snapshot().await?;
    let state = ctx.coordinator.state().await?;

    println!("Items:            {}", snapshot.as_ref().map_or(0, |s| s.items.len()));
    println!(
        "Last update:      {}",
        format_last_update(snapshot.as_ref().map(|s| s.last_update))
    );
    println!("State:            {}", state.label());
    println!("Enabled sources:  {}", settings.enabled_sources.join(", "));
    println!("Refresh interval: {}h", settings.refresh_interval_hours);

    if let Some(snapshot) = snapshot {
        for source in ctx.registry().source_ids() {
            let count = snapshot.items.iter().filter(|i| i.source == source).count();
            let marker = if settings.is_enabled(&source) { "" } else { " (disabled)" };
            println!("  {}: {} novels{}", source, count, marker);
        }
    }

    Ok(())
}

pub async fn open(ctx: &AppContext, rank: usize, category: Option<String>) -> Result<()> {
    let settings = ctx.settings.resolve().await;
    let category = category.unwrap_or_else(|| selected_category(&settings).to_string());

    let snapshot = ctx
        .snapshot()
        .await?
        .ok_or_else(|| NovelRankError::Other("No rankings yet. Run `novelrank refresh`.".into()))?;

    let url = ranked_url(&snapshot, &category, rank)?;
    println!("Opening {}", url);
    open::that(url)?;
    Ok(())
}

pub async fn clear(ctx: &AppContext) -> Result<()> {
    ctx.coordinator.clear().await?;
    println!("Cleared cached rankings");
    Ok(())
}

pub async fn settings_show(ctx: &AppContext) -> Result<()> {
    let settings = ctx.settings.resolve().await;

    println!("sources:          {}", settings.enabled_sources.join(","));
    println!("interval:         {}h", settings.refresh_interval_hours);
    println!("default category: {}", settings.default_category);
    println!("last category:    {}", settings.last_category);
    println!("show rating:      {}", settings.display.show_rating);
    println!("show author:      {}", settings.display.show_author);
    println!("show category:    {}", settings.display.show_category);
    Ok(())
}

pub async fn settings_set(ctx: &AppContext, update: SettingsUpdate) -> Result<()> {
    let current = ctx.settings.resolve().await;
    let known = ctx.registry().source_ids();
    let settings = apply_update(current, update, &known)?;

    ctx.settings.save(&settings).await?;
    println!("Settings saved");
    Ok(())
}

pub fn sources(ctx: &AppContext) -> Result<()> {
    for entry in ctx.registry().sources() {
        println!("{}", entry.id());
        for (category, key) in &entry.categories {
            println!("  {:<12} {}", category, key);
        }
    }
    Ok(())
}

/// Category used when none is given: the last one listed, else the
/// configured default.
fn selected_category(settings: &Settings) -> &str {
    if settings.last_category != ALL_CATEGORIES {
        &settings.last_category
    } else {
        &settings.default_category
    }
}

fn apply_update(mut settings: Settings, update: SettingsUpdate, known: &[String]) -> Result<Settings> {
    if let Some(sources) = update.sources {
        let mut enabled: Vec<String> = Vec::new();
        for source in sources.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            if !known.iter().any(|k| k == source) {
                return Err(NovelRankError::InvalidSettings(format!(
                    "unknown data source: {} (available: {})",
                    source,
                    known.join(", ")
                )));
            }
            if !enabled.iter().any(|e| e == source) {
                enabled.push(source.to_string());
            }
        }
        settings.enabled_sources = enabled;
    }
    if let Some(hours) = update.interval_hours {
        settings.refresh_interval_hours = hours;
    }
    if let Some(category) = update.default_category {
        settings.last_category = category.clone();
        settings.default_category = category;
    }
    if let Some(v) = update.show_rating {
        settings.display.show_rating = v;
    }
    if let Some(v) = update.show_author {
        settings.display.show_author = v;
    }
    if let Some(v) = update.show_category {
        settings.display.show_category = v;
    }
    Ok(settings)
}

fn ranked_url<'a>(snapshot: &'a Snapshot, category: &'a str, rank: usize) -> Result<&'a str> {
    let item = rank
        .checked_sub(1)
        .and_then(|i| snapshot.filter_by_category(category).nth(i))
        .ok_or_else(|| NovelRankError::Other(format!("No novel at rank {} in {}", rank, category)))?;

    item.url
        .as_deref()
        .ok_or_else(|| NovelRankError::Other(format!("No link for {}", item.title)))
}

fn format_item_line(rank: usize, item: &Item, display: &DisplayFlags) -> String {
    let mut line = format!("{:>3}. {}", rank, item.title);
    if display.show_author {
        line.push_str(&format!(" - {}", item.author));
    }
    if display.show_rating {
        line.push_str(&format!("  ★ {:.1}", item.rating));
    }
    if display.show_category {
        line.push_str(&format!("  [{}]", item.category));
    }
    line
}

fn format_last_update(last_update: Option<DateTime<Utc>>) -> String {
    last_update
        .map(|d| d.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "--".to_string())
}
