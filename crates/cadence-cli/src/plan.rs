//! `plan` command handlers.

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use rand::{rngs::StdRng, SeedableRng};

use cadence_core::{AppConfig, CtaType, MonthlyPlan};
use cadence_strategy::{generate_plan, PlanRequest};

use crate::context::{load_brands, open_store, resolve_brand, resolve_brand_name};

/// Sub-commands available under `plan`.
#[derive(Debug, Subcommand)]
pub enum PlanCommands {
    /// Generate a monthly plan for a brand and make it the active plan
    Generate {
        /// Brand name from brands.yaml (defaults to the scheduled brand)
        #[arg(long)]
        brand: Option<String>,
        /// First day of the plan (defaults to today, UTC)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Number of days to plan (defaults to the brand's duration_days)
        #[arg(long)]
        days: Option<u32>,
        /// Seed for reproducible variation picks
        #[arg(long)]
        seed: Option<u64>,
        /// Print the plan summary without saving it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the brand's active plan
    Show {
        #[arg(long)]
        brand: Option<String>,
    },
    /// List the active plan's posts for one date
    Posts {
        #[arg(long)]
        brand: Option<String>,
        /// Date as YYYY-MM-DD (defaults to today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub(crate) async fn run_plan_command(
    config: &AppConfig,
    command: PlanCommands,
) -> anyhow::Result<()> {
    match command {
        PlanCommands::Generate {
            brand,
            start,
            days,
            seed,
            dry_run,
        } => run_plan_generate(config, brand.as_deref(), start, days, seed, dry_run).await,
        PlanCommands::Show { brand } => run_plan_show(config, brand.as_deref()).await,
        PlanCommands::Posts { brand, date } => {
            run_plan_posts(config, brand.as_deref(), date).await
        }
    }
}

/// Generate a plan from the brand profile and save it as the active plan.
///
/// # Errors
///
/// Returns an error if the brand is unknown, the request is invalid, or the
/// store rejects the plan.
async fn run_plan_generate(
    config: &AppConfig,
    brand: Option<&str>,
    start: Option<NaiveDate>,
    days: Option<u32>,
    seed: Option<u64>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let brands = load_brands(config)?;
    let profile = resolve_brand(&brands, brand)?;

    let start = start.unwrap_or_else(|| Utc::now().date_naive());
    let mut request = PlanRequest::from_brand(profile, start);
    if let Some(days) = days {
        request.duration_days = days;
    }

    let mut rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    let plan = generate_plan(&request, &mut rng)?;
    print_plan_summary(&plan);

    if dry_run {
        println!("dry-run: plan not saved");
        return Ok(());
    }

    let store = open_store(config).await?;
    let plan_id = store.save_plan(&plan).await?;
    tracing::info!(brand = %plan.brand_name, plan_id = %plan_id, "plan saved");
    println!("saved as active plan {plan_id}");
    Ok(())
}

async fn run_plan_show(config: &AppConfig, brand: Option<&str>) -> anyhow::Result<()> {
    let brand = resolve_brand_name(config, brand)?;
    let store = open_store(config).await?;
    let stored = store
        .get_active_plan(&brand)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no active plan for '{brand}'; run `plan generate` first"))?;

    println!("Plan: {}", stored.id);
    println!("Saved: {}", stored.saved_at.format("%Y-%m-%d %H:%M UTC"));
    print_plan_summary(&stored.plan);
    Ok(())
}

async fn run_plan_posts(
    config: &AppConfig,
    brand: Option<&str>,
    date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let brand = resolve_brand_name(config, brand)?;
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let store = open_store(config).await?;
    let stored = store
        .get_active_plan(&brand)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no active plan for '{brand}'; run `plan generate` first"))?;

    let posts = stored.plan.posts_for(date);
    if posts.is_empty() {
        println!("no posts scheduled for {date}");
        return Ok(());
    }

    println!("{:<10}{:<20}{:<12}{:<7}TOPIC", "PLATFORM", "PILLAR", "FORMAT", "IMAGE");
    for post in posts {
        println!(
            "{:<10}{:<20}{:<12}{:<7}{}",
            post.platform.as_str(),
            post.pillar.as_str(),
            post.variation.format.as_str(),
            if post.image_required { "yes" } else { "no" },
            post.topic
        );
    }
    Ok(())
}

fn print_plan_summary(plan: &MonthlyPlan) {
    let calendar = &plan.calendar;
    println!("Campaign: {}", plan.campaign_name);
    println!("Brand: {}", plan.brand_name);
    println!(
        "Dates: {} to {} ({} posts)",
        calendar.start_date, calendar.end_date, calendar.total_posts
    );
    for (platform, count) in &calendar.posts_per_platform {
        println!("  {:<10}{count}", platform.as_str());
    }
    let ctas: Vec<&str> = plan.cta_targets.iter().copied().map(CtaType::as_str).collect();
    println!("CTAs: {}", ctas.join(", "));
}
