//! Catalog seeding command
//!
//! Inserts the default category tree. The category upsert is keyed on
//! slug, so re-running the command refreshes wording without creating
//! duplicates.

use anyhow::{Context, Result};
use clap::Parser;

use lacquer_core::models::Slug;
use lacquer_server::db::{create_pool, migrations, CategoryRepo};

/// Name, slug, description for each stock category.
const CATEGORIES: &[(&str, &str, &str)] = &[
    (
        "Esmaltes y Lacas",
        "esmaltes-lacas",
        "Esmaltes tradicionales, semipermanentes y en gel",
    ),
    (
        "Sistemas de Uñas",
        "sistemas-unas",
        "Acrílico, polygel y sistemas de construcción",
    ),
    (
        "Herramientas Básicas",
        "herramientas-basicas",
        "Limas, cortaúñas, empujadores y pinzas",
    ),
    (
        "Equipamiento Profesional",
        "equipamiento-profesional",
        "Lámparas UV/LED, tornos y cabinas",
    ),
    (
        "Cuidado de Uñas",
        "cuidado-unas",
        "Aceites, fortalecedores y tratamientos",
    ),
    (
        "Arte y Decoración",
        "arte-decoracion",
        "Stickers, foils, glitter y pedrería",
    ),
    (
        "Preparación y Acabado",
        "preparacion-acabado",
        "Primers, bases, top coats y limpiadores",
    ),
    (
        "Pinceles y Aplicadores",
        "pinceles-aplicadores",
        "Pinceles para arte, gel y acrílico",
    ),
    (
        "Organización y Mobiliario",
        "organizacion-mobiliario",
        "Mesas, organizadores y exhibidores",
    ),
    (
        "Insumos Sanitarios",
        "insumos-sanitarios",
        "Desinfectantes, guantes y material descartable",
    ),
];

/// Arguments for the seed command
#[derive(Parser, Debug)]
pub struct SeedArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

/// Seed the default categories
pub async fn run_seed(args: SeedArgs) -> Result<()> {
    let database_url = super::resolve_database_url(args.database_url)?;

    let pool = create_pool(&database_url)
        .await
        .context("Failed to create database pool")?;

    migrations::run(&pool)
        .await
        .context("Failed to apply schema migrations")?;

    let repo = CategoryRepo::new(&pool);
    for (name, slug, description) in CATEGORIES {
        let slug = Slug::new(slug).context("invalid category slug in seed data")?;
        repo.create(name, &slug, Some(description), None)
            .await
            .context(format!("Failed to seed category {name}"))?;
        println!("  ✓ {name}");
    }

    println!("✅ Seeded {} categories", CATEGORIES.len());

    Ok(())
}
