//! Storefront CLI - Browse the catalog, edit the cart, sign in and check out.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! sf-cli catalog categories
//! sf-cli catalog products --category 2
//!
//! # Edit the cart (persisted in STOREFRONT_STATE_DIR)
//! sf-cli cart add 7 -q 2
//! sf-cli cart update 7 1
//! sf-cli cart show
//!
//! # Sign in and check out
//! sf-cli auth login -e user@example.com
//! sf-cli checkout --method paypal
//! sf-cli orders list
//!
//! # Reach the store
//! sf-cli contact -n Ada -e ada@example.com -s "Late order" -m "Where is 1001?"
//! sf-cli subscribe
//! ```
//!
//! # Commands
//!
//! - `catalog` - List categories and products
//! - `cart` - Show and edit the cart
//! - `auth` - Login, register, logout, show the current account
//! - `checkout` - Place and pay for an order for the cart
//! - `orders` - Order history and payment status
//! - `contact` - Send a message to the store
//! - `subscribe` - Subscribe to the newsletter
//!
//! Configuration comes from the environment (see
//! [`storefront_client::ClientConfig`]).

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_client::{AppError, ClientConfig, Storefront};
use storefront_core::{CategoryId, OrderId, PaymentMethod, ProductId};

mod commands;

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(author, version, about = "Storefront command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Show and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the signed-in account
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Place and pay for an order for the whole cart
    Checkout {
        /// Payment method (`credit` or `paypal`)
        #[arg(short, long, default_value = "credit")]
        method: PaymentMethod,
    },
    /// Order history
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Send a message to the store
    Contact {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        subject: String,
        #[arg(short, long)]
        message: String,
    },
    /// Subscribe to the newsletter
    Subscribe {
        /// Address to subscribe; defaults to the signed-in account's
        #[arg(short, long)]
        email: Option<String>,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List product categories
    Categories,
    /// List products
    Products {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<CategoryId>,
    },
    /// Show one product
    Product { id: ProductId },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show line items and totals
    Show,
    /// Add a product to the cart
    Add {
        id: ProductId,
        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove { id: ProductId },
    /// Set the quantity of a product already in the cart (0 removes it)
    Update { id: ProductId, quantity: u32 },
    /// Remove everything from the cart
    Clear,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        address: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in account
    Whoami,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List your orders
    List,
    /// Show one order
    Show { id: OrderId },
    /// Show the payment recorded for an order
    Payment { id: OrderId },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront_client=info,storefront_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = ClientConfig::from_env()?;
    let storefront = Storefront::from_config(&config)?;
    let mut notifications = storefront.notifier().subscribe();

    let result = match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::Categories => commands::catalog::categories(&storefront).await,
            CatalogAction::Products { category } => {
                commands::catalog::products(&storefront, category).await
            }
            CatalogAction::Product { id } => commands::catalog::product(&storefront, id).await,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => {
                commands::cart::show(&storefront);
                Ok(())
            }
            CartAction::Add { id, quantity } => {
                commands::cart::add(&storefront, id, quantity).await
            }
            CartAction::Remove { id } => {
                commands::cart::remove(&storefront, id);
                Ok(())
            }
            CartAction::Update { id, quantity } => {
                commands::cart::update(&storefront, id, quantity);
                Ok(())
            }
            CartAction::Clear => {
                storefront.cart().clear();
                Ok(())
            }
        },
        Commands::Auth { action } => match action {
            AuthAction::Login { email, password } => {
                commands::auth::login(&storefront, &email, password).await
            }
            AuthAction::Register {
                name,
                email,
                password,
                phone,
                address,
            } => {
                let form = commands::auth::RegisterForm {
                    name,
                    email,
                    password,
                    phone,
                    address,
                };
                commands::auth::register(&storefront, form).await
            }
            AuthAction::Logout => {
                storefront.session().logout();
                Ok(())
            }
            AuthAction::Whoami => commands::auth::whoami(&storefront).await,
        },
        Commands::Checkout { method } => commands::orders::checkout(&storefront, method).await,
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&storefront).await,
            OrdersAction::Show { id } => commands::orders::show(&storefront, id).await,
            OrdersAction::Payment { id } => commands::orders::payment(&storefront, id).await,
        },
        Commands::Contact {
            name,
            email,
            subject,
            message,
        } => commands::contact::send(&storefront, name, &email, subject, message).await,
        Commands::Subscribe { email } => {
            commands::contact::subscribe(&storefront, email.as_deref()).await
        }
    };

    commands::print_notifications(&mut notifications);
    result
}
