use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use code_registry::{HtmlTableSource, refresh::refresh_static_table};
use country_join::{
    ArticleRecord, CountryCode, WideTable, articles,
    config::{self, Settings},
    enrich, iso3166, join, logging, reshape, views,
};
use serde::Serialize;
use tracing::info;

#[derive(Parser)]
#[command(version, about = "Country-code reconciliation and indicator join")]
struct Cli {
    /// Pipeline config file (country_join.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Code registry maintenance and lookups
    Registry(RegistryCmd),
    /// Melt and join wide immigrant / population tables
    Join {
        /// Wide immigrant stock table (column-oriented JSON)
        #[arg(long, value_name = "FILE")]
        immigrants: PathBuf,
        /// Wide population table (column-oriented JSON)
        #[arg(long, value_name = "FILE")]
        population: PathBuf,
        /// Only emit rows for this year
        #[arg(long)]
        year: Option<i32>,
        /// Print the rate rank table instead of joined rows
        #[arg(long)]
        rank: bool,
        /// Restrict to these alpha-3 codes, ordered as a trend per country
        #[arg(long, value_delimiter = ',')]
        countries: Vec<String>,
        /// First year of the trend window
        #[arg(long, requires = "countries")]
        from: Option<i32>,
        /// Last year of the trend window
        #[arg(long, requires = "countries")]
        to: Option<i32>,
    },
    /// Filter, aggregate and enrich news articles
    Articles {
        /// JSON array of article records
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// Only keep articles published on this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Print the tone rank table instead of enriched rows
        #[arg(long)]
        rank: bool,
        /// Wide immigrant table; with --population, prints tone/rate
        /// scatter points for the indicator year
        #[arg(long, value_name = "FILE", requires = "population", conflicts_with = "rank")]
        immigrants: Option<PathBuf>,
        /// Wide population table
        #[arg(long, value_name = "FILE", requires = "immigrants")]
        population: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RegistryCmd {
    #[command(subcommand)]
    sub: RegistrySub,
}

#[derive(Subcommand)]
enum RegistrySub {
    /// Scrape the reference page and rewrite a static table file
    Refresh {
        #[arg(long)]
        url: Option<String>,
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Print a code in every scheme
    Lookup {
        code: String,
        /// Scheme of CODE; guessed when omitted
        #[arg(long, value_enum)]
        scheme: Option<Scheme>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Scheme {
    Legacy,
    Alpha2,
    Alpha3,
}

#[derive(Serialize)]
struct Lookup {
    input: CountryCode,
    legacy: Option<String>,
    alpha2: Option<String>,
    alpha3: Option<String>,
    name: Option<&'static str>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.cmd {
        Cmd::Registry(RegistryCmd {
            sub: RegistrySub::Refresh { url, out, timeout_secs },
        }) => {
            let url = url.unwrap_or_else(|| settings.registry_url.clone());
            let timeout = timeout_secs.map_or(settings.fetch_timeout, Duration::from_secs);
            let source = HtmlTableSource::new(timeout)?;
            let table = refresh_static_table(&source, &url, &out)
                .await
                .with_context(|| format!("refreshing code table from {url}"))?;
            println!(
                "wrote {} entries (version {}) to {}",
                table.entries.len(),
                table.version,
                out.display()
            );
        }
        Cmd::Registry(RegistryCmd {
            sub: RegistrySub::Lookup { code, scheme },
        }) => {
            let registry = settings.build_registry()?;
            let mapping = registry.fetch_mapping(&settings.registry_url).await?;
            let code = code.trim().to_ascii_uppercase();
            let input = match scheme {
                Some(Scheme::Legacy) => CountryCode::Legacy(code),
                Some(Scheme::Alpha2) => CountryCode::Alpha2(code),
                Some(Scheme::Alpha3) => CountryCode::Alpha3(code),
                None if code.len() == 3 => CountryCode::Alpha3(code),
                None if mapping.alpha2_for(&code).is_some() => CountryCode::Legacy(code),
                None => CountryCode::Alpha2(code),
            };
            let alpha2 = input.to_alpha2(&mapping);
            let lookup = Lookup {
                legacy: input.to_legacy(&mapping),
                alpha3: input.to_alpha3(&mapping),
                name: alpha2.as_deref().and_then(iso3166::country_name),
                alpha2,
                input,
            };
            print_json(&lookup)?;
        }
        Cmd::Join {
            immigrants,
            population,
            year,
            rank,
            countries,
            from,
            to,
        } => {
            let mut joined = join_tables(&immigrants, &population, &settings)?;
            if !countries.is_empty() {
                joined = views::trend(
                    &joined,
                    &countries,
                    from.unwrap_or(i32::MIN),
                    to.unwrap_or(i32::MAX),
                )
                .into_iter()
                .cloned()
                .collect();
            }
            let rows: Vec<_> = match year {
                Some(y) => views::rows_for_year(&joined, y).into_iter().cloned().collect(),
                None => joined,
            };
            if rank {
                print_json(&views::rank_rates(&rows))?;
            } else {
                print_json(&rows)?;
            }
        }
        Cmd::Articles {
            input,
            date,
            rank,
            immigrants,
            population,
        } => {
            let raw = read_file(&input)?;
            let records: Vec<ArticleRecord> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing articles from {}", input.display()))?;
            let mut records = articles::filter_by_keyword(records, &settings.keyword);
            let year = match date {
                Some(date) => {
                    records = articles::filter_by_date(records, date);
                    views::indicator_year(date, settings.latest_indicator_year)
                }
                None => settings.latest_indicator_year,
            };
            let aggregates = articles::aggregate_by_country(&records);
            let registry = settings.build_registry()?;
            let (tones, _) =
                enrich::enrich_country_codes(aggregates, &registry, &settings.registry_url).await?;

            match (immigrants, population) {
                (Some(immigrants), Some(population)) => {
                    let joined = join_tables(&immigrants, &population, &settings)?;
                    let points = views::scatter_points(&tones, &views::rows_for_year(&joined, year));
                    info!(year, points = points.len(), "tone against immigration rate");
                    print_json(&points)?;
                }
                _ if rank => print_json(&views::rank_tones(&tones))?,
                _ => print_json(&tones)?,
            }
        }
    }

    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => config::load_settings_path(path),
        None => {
            let mut settings = Settings::default();
            settings.apply_env();
            Ok(settings)
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn join_tables(immigrants: &Path, population: &Path, settings: &Settings) -> Result<Vec<join::JoinedRecord>> {
    let immigrants = read_long(immigrants, "Immigrants")?;
    let population = read_long(population, "Populations")?;
    let (joined, report) = join::join_series_with(&immigrants, &population, settings.join_policy);
    info!(
        rows = joined.len(),
        unmatched_immigrants = report.unmatched_immigrants,
        unmatched_population = report.unmatched_population,
        "joined series"
    );
    Ok(joined)
}

fn read_long(path: &Path, value_name: &str) -> Result<reshape::LongTable> {
    let wide = WideTable::from_columns_json(&read_file(path)?)
        .with_context(|| format!("reading wide table {}", path.display()))?;
    Ok(reshape::melt(&wide, value_name)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
