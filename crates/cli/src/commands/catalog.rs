//! Catalog browsing commands.

use clap::Subcommand;

use clementine_client::Context;
use clementine_core::ListProductsParams;

use super::print_json;

#[derive(Subcommand)]
pub enum CatalogAction {
    /// List all categories
    Categories,
    /// List products, optionally filtered
    Products {
        #[arg(long)]
        search: Option<String>,
        /// Category slug to filter by
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Show one product by slug
    Product { slug: String },
}

pub async fn run(ctx: &Context, action: CatalogAction) -> Result<(), Box<dyn std::error::Error>> {
    let storefront = ctx.storefront();
    match action {
        CatalogAction::Categories => {
            let categories = storefront.categories().await?;
            print_json(&categories)?;
        }
        CatalogAction::Products {
            search,
            category,
            page,
        } => {
            let params = ListProductsParams {
                search,
                category_slug: category,
                page,
                ..ListProductsParams::default()
            };
            let products = storefront.products(&params).await?;
            print_json(&products)?;
        }
        CatalogAction::Product { slug } => {
            let product = storefront.product(&slug).await?;
            print_json(&product)?;
        }
    }
    Ok(())
}
