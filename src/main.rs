use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use langue_facets::config::{find_config_file, load_config, to_toml, Config};
use langue_facets::controller::{
    mark_plain, ListingController, MemoryView, PageHooks, SearchSummary, UiEvent,
};
use langue_facets::engine::group_by_year;
use langue_facets::models::{load_catalog, Item, ItemId};
use langue_facets::utils::DownloadNotifier;
use std::collections::HashMap;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Langue Facets - Search, filter and sort a catalog of publications
#[derive(Parser, Debug)]
#[command(name = "langue-facets")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search, filter and sort a catalog of publications", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Filter and sort a JSON catalog of records
    #[command(alias = "ls")]
    List {
        /// Catalog file (JSON array of records)
        catalog: PathBuf,

        /// Free-text search over title, authors and category
        #[arg(long, short)]
        search: Option<String>,

        /// Exact category filter
        #[arg(long, short)]
        category: Option<String>,

        /// Exact year filter
        #[arg(long, short)]
        year: Option<String>,

        /// Sort token, e.g. "-ano_publicacao", "titulo" or "downloads"
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<String>,

        /// Group the result into per-year sections
        #[arg(long, short)]
        group: bool,
    },

    /// Send the download-increment notification for an item
    Notify {
        /// Item id
        id: String,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("langue_facets={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration from file if specified or found in default locations
    let config = if let Some(config_path) = &cli.config {
        load_config(Some(config_path.as_path()))?
    } else if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        load_config(Some(config_path.as_path()))?
    } else {
        load_config(None)?
    };

    match cli.command {
        Commands::List {
            catalog,
            search,
            category,
            year,
            sort,
            group,
        } => {
            let items = load_catalog(&catalog, &config.fields)
                .with_context(|| format!("Failed to load catalog {}", catalog.display()))?;

            let mut events = Vec::new();
            if let Some(category) = category {
                events.push(UiEvent::CategoryChanged(category));
            }
            if let Some(year) = year {
                events.push(UiEvent::YearChanged(year));
            }
            if let Some(sort) = sort {
                events.push(UiEvent::SortChanged(sort));
            }
            if let Some(search) = search {
                events.push(UiEvent::SearchInput(search));
            }
            // always recompute at least once so the listing reflects the config's sort
            events.push(UiEvent::SearchSubmit);

            let listing = run_listing(items, &config, events)?;
            output_listing(&listing, group, cli.output, cli.quiet)?;
        }
        Commands::Notify { id } => {
            let notifier = DownloadNotifier::from_config(&config.notify)?;
            let id = ItemId::from(id);
            notifier.send(&id).await?;
            if !cli.quiet {
                println!("Download increment sent for {}", id);
            }
        }
        Commands::Config => {
            print!("{}", to_toml(&config)?);
        }
    }

    Ok(())
}

/// Outcome of one headless listing run
struct Listing {
    items: Vec<Item>,
    term: String,
    summary: Option<SearchSummary>,
}

fn run_listing(items: Vec<Item>, config: &Config, events: Vec<UiEvent>) -> Result<Listing> {
    let view = MemoryView::from_items(&items);
    let mut controller =
        ListingController::mount(items, Some(view), PageHooks::all(), &config.listing)
            .context("Listing container missing")?;

    for event in events {
        controller.handle(event, Instant::now());
    }
    controller.run_until_idle();

    let by_id: HashMap<&ItemId, &Item> = controller
        .items()
        .iter()
        .map(|item| (item.id(), item))
        .collect();
    let visible = controller
        .view()
        .visible_in_order()
        .iter()
        .filter_map(|id| by_id.get(id).map(|item| (*item).clone()))
        .collect();

    Ok(Listing {
        items: visible,
        term: controller.criteria().search_term.clone(),
        summary: controller.view().search_summary().cloned(),
    })
}

fn output_listing(listing: &Listing, group: bool, format: OutputFormat, quiet: bool) -> Result<()> {
    let actual_format = if format == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    };

    let visible: Vec<&Item> = listing.items.iter().collect();

    if actual_format == OutputFormat::Json {
        let json = if group {
            serde_json::to_string_pretty(&group_by_year(&visible))?
        } else {
            serde_json::to_string_pretty(&visible)?
        };
        println!("{}", json);
        return Ok(());
    }

    if !quiet {
        if let Some(summary) = &listing.summary {
            if summary.has_results() {
                println!("Resultados para \"{}\": {}", summary.term, summary.matches);
            } else {
                println!("Nenhum resultado para \"{}\"", summary.term);
            }
        }
    }

    if visible.is_empty() {
        println!("Nenhuma publicação encontrada");
        return Ok(());
    }

    let sections = if group {
        group_by_year(&visible)
            .into_iter()
            .map(|g| (Some(g.year), g.items))
            .collect()
    } else {
        vec![(None, visible)]
    };

    for (year, items) in sections {
        if let Some(year) = year {
            println!("\n== {} ==", year);
        }
        match actual_format {
            OutputFormat::Plain => print_plain(&items, &listing.term),
            _ => print_table(&items, &listing.term),
        }
    }
    Ok(())
}

fn print_plain(items: &[&Item], term: &str) {
    print!("{}", format_plain(items, term));
}

fn format_plain(items: &[&Item], term: &str) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(&format!(
            "{} - {} [{}] ({})\n",
            mark_plain(item.title(), term, "*", "*"),
            item.authors(),
            item.category(),
            item.year_text()
        ));
        out.push_str(&format!("  Downloads: {}\n", item.download_count()));
    }
    out
}

fn print_table(items: &[&Item], term: &str) {
    use comfy_table::{Attribute, Cell, Table};
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Title", "Authors", "Category", "Year", "Downloads"]);

    for item in items {
        table.add_row(vec![
            Cell::new(truncate(&mark_plain(item.title(), term, "[", "]"), 50))
                .add_attribute(Attribute::Bold),
            Cell::new(truncate(item.authors(), 30)),
            Cell::new(item.category()),
            Cell::new(item.year_text()),
            Cell::new(item.download_count()),
        ]);
    }
    println!("{table}");
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use langue_facets::models::ItemBuilder;

    #[test]
    fn test_format_plain_marks_search_term() {
        let item = ItemBuilder::new("1", "Estudos do Discurso")
            .authors("Maria Silva")
            .category("LIVRO")
            .year(2021)
            .download_count(12)
            .build();
        let text = format_plain(&[&item], "discurso");
        assert_eq!(
            text,
            "Estudos do *Discurso* - Maria Silva [LIVRO] (2021)\n  Downloads: 12\n"
        );

        let unmarked = format_plain(&[&item], "");
        assert!(unmarked.starts_with("Estudos do Discurso - "));
    }

    #[test]
    fn test_cli_list_command() {
        let cli = Cli::parse_from([
            "langue-facets",
            "-v",
            "list",
            "catalog.json",
            "--search",
            "discurso",
            "--sort",
            "-downloads",
            "--group",
        ]);
        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.output, OutputFormat::Auto);
        match cli.command {
            Commands::List {
                catalog,
                search,
                sort,
                group,
                category,
                ..
            } => {
                assert_eq!(catalog, PathBuf::from("catalog.json"));
                assert_eq!(search.as_deref(), Some("discurso"));
                assert_eq!(sort.as_deref(), Some("-downloads"));
                assert!(group);
                assert!(category.is_none());
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_cli_notify_and_config() {
        let cli = Cli::parse_from(["langue-facets", "-o", "json", "notify", "42"]);
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Notify { ref id } if id == "42"));

        let cli = Cli::parse_from(["langue-facets", "--config", "/tmp/c.toml", "config"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Commands::Config));
    }

    #[test]
    fn test_run_listing_filters_and_sorts() {
        let items = vec![
            ItemBuilder::new("1", "Estudos do Discurso").category("LIVRO").year(2021).download_count(12).build(),
            ItemBuilder::new("2", "Análise Crítica").category("REVISTA").year(2023).download_count(5).build(),
            ItemBuilder::new("3", "Discurso e Mídia").category("LIVRO").year(2022).download_count(7).build(),
        ];
        let events = vec![
            UiEvent::CategoryChanged("LIVRO".to_string()),
            UiEvent::SearchInput("discurso".to_string()),
            UiEvent::SearchSubmit,
        ];
        let listing = run_listing(items, &Config::default(), events).unwrap();

        let ids: Vec<&str> = listing.items.iter().map(|i| i.id().as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
        assert_eq!(listing.term, "discurso");
        assert_eq!(listing.summary.unwrap().matches, 2);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("curto", 10), "curto");
        assert_eq!(truncate("Análise Crítica do Discurso", 10), "Análise...");
    }
}
