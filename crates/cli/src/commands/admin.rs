//! Back-office commands. All of these need an `ADMIN` login (see the
//! `CLEMENTINE_EMAIL` / `CLEMENTINE_PASSWORD` environment variables).

use clap::Subcommand;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use clementine_client::Context;
use clementine_core::{
    AdminCreateCategoryRequest, AdminCreateProductRequest, AdminListCustomersParams,
    AdminListOrdersParams, AdminListProductsParams, AdminUpdateProductRequest, CategoryId,
    CustomerId, OrderId, OrderStatus, ProductId,
};

use super::print_json;

#[derive(Subcommand)]
pub enum AdminAction {
    /// List categories
    CategoryList,
    /// Create a category
    CategoryCreate {
        #[arg(long)]
        name: String,
        #[arg(long)]
        slug: String,
    },
    /// Delete a category (fails while products are assigned to it)
    CategoryDelete { id: String },
    /// List products
    ProductList {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Create a product
    ProductCreate {
        #[arg(long)]
        name: String,
        #[arg(long)]
        slug: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        stock: u32,
        #[arg(long)]
        category_id: String,
    },
    /// Adjust a product's stock level
    ProductStock { id: String, stock: u32 },
    /// Delete a product
    ProductDelete { id: String },
    /// List orders
    OrderList {
        #[arg(long)]
        page: Option<u32>,
    },
    /// Show one order
    OrderShow { external_id: String },
    /// Change an order's lifecycle status
    OrderStatus {
        external_id: String,
        /// One of PENDING, CONFIRMED, SHIPPED, DELIVERED, CANCELLED, REFUNDED
        status: String,
    },
    /// List customers
    CustomerList {
        #[arg(long)]
        search: Option<String>,
    },
    /// Enable a customer account
    CustomerEnable { id: String },
    /// Disable a customer account
    CustomerDisable { id: String },
    /// Upload a file (product imagery)
    Upload { path: std::path::PathBuf },
}

pub async fn run(ctx: &Context, action: AdminAction) -> Result<(), Box<dyn std::error::Error>> {
    let admin = ctx.admin();
    match action {
        AdminAction::CategoryList => print_json(&admin.categories().await?)?,
        AdminAction::CategoryCreate { name, slug } => {
            let category = admin
                .create_category(&AdminCreateCategoryRequest { name, slug })
                .await?;
            print_json(&category)?;
        }
        AdminAction::CategoryDelete { id } => {
            admin.delete_category(&CategoryId::new(id)).await?;
        }
        AdminAction::ProductList { search, page } => {
            let params = AdminListProductsParams {
                search,
                page,
                page_size: None,
            };
            print_json(&admin.products(&params).await?)?;
        }
        AdminAction::ProductCreate {
            name,
            slug,
            description,
            price,
            stock,
            category_id,
        } => {
            let price = Decimal::from_f64(price).ok_or("price is not a valid decimal")?;
            let product = admin
                .create_product(&AdminCreateProductRequest {
                    name,
                    slug,
                    description,
                    price,
                    stock,
                    image_url: None,
                    category_id: CategoryId::new(category_id),
                })
                .await?;
            print_json(&product)?;
        }
        AdminAction::ProductStock { id, stock } => {
            let product = admin
                .update_product(
                    &ProductId::new(id),
                    &AdminUpdateProductRequest {
                        stock: Some(stock),
                        ..AdminUpdateProductRequest::default()
                    },
                )
                .await?;
            print_json(&product)?;
        }
        AdminAction::ProductDelete { id } => {
            admin.delete_product(&ProductId::new(id)).await?;
        }
        AdminAction::OrderList { page } => {
            let params = AdminListOrdersParams {
                page,
                ..AdminListOrdersParams::default()
            };
            print_json(&admin.orders(&params).await?)?;
        }
        AdminAction::OrderShow { external_id } => {
            print_json(&admin.order(&OrderId::new(external_id)).await?)?;
        }
        AdminAction::OrderStatus {
            external_id,
            status,
        } => {
            let status = parse_status(&status)?;
            let order = admin
                .update_order_status(&OrderId::new(external_id), status)
                .await?;
            print_json(&order)?;
        }
        AdminAction::CustomerList { search } => {
            let params = AdminListCustomersParams {
                search,
                ..AdminListCustomersParams::default()
            };
            print_json(&admin.customers(&params).await?)?;
        }
        AdminAction::CustomerEnable { id } => {
            print_json(&admin.enable_customer(&CustomerId::new(id)).await?)?;
        }
        AdminAction::CustomerDisable { id } => {
            print_json(&admin.disable_customer(&CustomerId::new(id)).await?)?;
        }
        AdminAction::Upload { path } => {
            let bytes = std::fs::read(&path)?;
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or("path has no usable file name")?;
            print_json(&admin.upload(file_name, bytes).await?)?;
        }
    }
    Ok(())
}

fn parse_status(raw: &str) -> Result<OrderStatus, Box<dyn std::error::Error>> {
    match raw.to_uppercase().as_str() {
        "PENDING" => Ok(OrderStatus::Pending),
        "CONFIRMED" => Ok(OrderStatus::Confirmed),
        "SHIPPED" => Ok(OrderStatus::Shipped),
        "DELIVERED" => Ok(OrderStatus::Delivered),
        "CANCELLED" => Ok(OrderStatus::Cancelled),
        "REFUNDED" => Ok(OrderStatus::Refunded),
        other => Err(format!("unknown order status: {other}").into()),
    }
}
