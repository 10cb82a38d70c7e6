//! University catalog CLI
//!
//! Browses the catalog backend through the cached query layer.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use unicatalog::{
    config::load_config,
    error::Result,
    filter::{FilterSelection, MemoizedFilter},
    mappers::{extract_countries, extract_specialty_names},
    models::{
        ComparisonRequest, RecommendationRequest, SessionId, SortBy, SortOrder,
        SpecialtyListParams, University, UniversityListParams,
    },
    query::CatalogQueries,
};

/// catalog - University catalog client
#[derive(Parser, Debug)]
#[command(name = "catalog", version, about = "University catalog client")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "catalog.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List one page of universities, optionally narrowed locally
    Browse {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 20)]
        page_size: u32,

        /// Minimum admission score (server-side)
        #[arg(long)]
        min_score: Option<f64>,

        /// name, ranking, tuition_fee or acceptance_rate
        #[arg(long, value_parser = parse_sort)]
        sort: Option<SortBy>,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Keep only this country (client-side, exact)
        #[arg(long)]
        country: Option<String>,

        /// Keep only universities offering this specialty (client-side)
        #[arg(long)]
        specialty: Option<String>,
    },

    /// Show one university
    Show { id: String },

    /// Search universities by name, description or city
    Search { query: String },

    /// List specialties
    Specialties {
        /// Search term instead of listing
        #[arg(long)]
        search: Option<String>,
    },

    /// Ask the assistant for recommendations
    Recommend {
        query: String,

        #[arg(long)]
        score: Option<f64>,

        #[arg(long)]
        country: Option<String>,

        #[arg(long)]
        specialty: Option<String>,
    },

    /// Ask the assistant to compare universities by name
    Compare {
        #[arg(num_args = 2.., required = true)]
        names: Vec<String>,

        /// Comparison criteria
        #[arg(long)]
        criteria: Vec<String>,
    },

    /// Check assistant availability
    Health,

    /// Validate configuration
    Validate,
}

fn parse_sort(value: &str) -> std::result::Result<SortBy, String> {
    match value {
        "name" => Ok(SortBy::Name),
        "ranking" => Ok(SortBy::Ranking),
        "tuition_fee" => Ok(SortBy::TuitionFee),
        "acceptance_rate" => Ok(SortBy::AcceptanceRate),
        other => Err(format!("unknown sort field '{other}'")),
    }
}

/// Initialize logging from the verbosity flag or the configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_university(u: &University) {
    let ranking = u.ranking.map_or_else(|| "-".to_string(), |r| format!("#{r}"));
    println!("{:<26} {:<40} {}, {} {}", u.id, u.name, u.city, u.country, ranking);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_logging(cli.verbose, &config.logging.level);

    let queries = CatalogQueries::from_config(&config)?;

    match cli.command {
        Command::Browse {
            page,
            page_size,
            min_score,
            sort,
            desc,
            country,
            specialty,
        } => {
            let mut params = UniversityListParams::default().page(page).page_size(page_size);
            if let Some(min_score) = min_score {
                params = params.min_score(min_score);
            }
            if let Some(by) = sort {
                let order = if desc { SortOrder::Desc } else { SortOrder::Asc };
                params = params.sort(by, order);
            }

            let result = queries.universities(&params).await?;
            let page = &result.data;
            let selection = FilterSelection { country, specialty };
            let mut filter = MemoizedFilter::new();
            let shown = filter.apply(page, &selection);

            for u in shown.iter() {
                print_university(u);
            }
            println!(
                "\n{} of {} on page {}/{} ({} total)",
                shown.len(),
                page.items.len(),
                page.page,
                page.total_pages,
                page.total
            );
            println!("Countries: {}", extract_countries(&page.items).join(", "));
            println!(
                "Specialties: {}",
                extract_specialty_names(&page.items).join(", ")
            );
        }

        Command::Show { id } => match queries.university(&id).await? {
            Some(result) => {
                let u = &result.data;
                print_university(u);
                if !u.description_text().is_empty() {
                    println!("\n{}", u.description_text());
                }
                if let Some(website) = &u.website {
                    println!("Website: {website}");
                }
                for (specialty_id, name) in u.specialty_pairs() {
                    match u.requirement_for(specialty_id) {
                        Some(req) => println!("  {name}: min score {}", req.minimum_score),
                        None => println!("  {name}"),
                    }
                }
            }
            None => log::warn!("No university id given"),
        },

        Command::Search { query } => {
            let result = queries.search_universities(&query).await?;
            if result.data.is_empty() {
                log::info!("No universities match '{query}'");
            }
            for u in result.data.iter() {
                print_university(u);
            }
        }

        Command::Specialties { search } => {
            let result = match search {
                Some(query) => queries.search_specialties(&query).await?,
                None => queries.specialties(&SpecialtyListParams::default()).await?,
            };
            for s in result.data.iter() {
                match &s.category {
                    Some(category) => println!("{:<26} {} ({category})", s.id, s.name),
                    None => println!("{:<26} {}", s.id, s.name),
                }
            }
        }

        Command::Recommend {
            query,
            score,
            country,
            specialty,
        } => {
            let mut request = RecommendationRequest::new(SessionId::generate(), query);
            request.user_score = score;
            request.preferred_country = country;
            request.preferred_specialty = specialty;

            let response = queries.recommend(&request).await?;
            match response.recommendations {
                Some(text) if response.success => println!("{text}"),
                _ => log::error!(
                    "Assistant failed: {}",
                    response.error.as_deref().unwrap_or("no recommendations")
                ),
            }
        }

        Command::Compare { names, criteria } => {
            let request = ComparisonRequest {
                session_id: SessionId::generate(),
                university_names: names,
                comparison_criteria: (!criteria.is_empty()).then_some(criteria),
            };
            let response = queries.compare(&request).await?;
            match response.comparison {
                Some(text) if response.success => println!("{text}"),
                _ => log::error!(
                    "Assistant failed: {}",
                    response.error.as_deref().unwrap_or("no comparison")
                ),
            }
        }

        Command::Health => {
            let health = queries.ai_health().await?;
            let health = &health.data;
            log::info!(
                "Assistant {} (model: {}, capabilities: {})",
                health.status,
                health.model.as_deref().unwrap_or("unknown"),
                health.capabilities.join(", ")
            );
            if !health.is_operational() {
                log::warn!("Assistant is not operational");
            }
        }

        Command::Validate => {
            log::info!("✓ Config OK ({})", cli.config.display());
        }
    }

    Ok(())
}
