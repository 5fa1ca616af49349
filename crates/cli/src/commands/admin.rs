//! Admin commands.
//!
//! Every successful change prints the reloaded product list; a rejected or
//! cancelled change prints nothing and leaves the catalog untouched.
//!
//! # Environment Variables
//!
//! - `POOJABDI_ADMIN_URL` - Admin API origin (default: the shop origin)

use clap::{Args, Subcommand};

use poojabdi_admin::{AdminClient, AdminOutcome, AdminPanel};
use poojabdi_core::{InlineEdit, ProductForm, ProductId, SiteSettings};
use poojabdi_storefront::view::catalog_text;
use poojabdi_storefront::{CatalogClient, CatalogView, ShopClient, StorefrontConfig};

use super::{CommandError, confirm_on_terminal, emit};

#[derive(Subcommand)]
pub enum AdminAction {
    /// Create a product
    Create(ProductArgs),
    /// Replace a product's fields
    Update {
        /// Product id
        id: ProductId,

        #[command(flatten)]
        fields: ProductArgs,
    },
    /// Delete a product
    Delete {
        /// Product id
        id: ProductId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Save site settings
    Settings {
        /// Setting as key=value; repeatable
        #[arg(long = "set", value_name = "KEY=VALUE", required = true)]
        values: Vec<String>,
    },
    /// Change a product's name and/or display price in place
    Edit {
        /// Product id
        id: ProductId,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New display price
        #[arg(long)]
        price: Option<String>,
    },
}

/// Product form fields.
#[derive(Args)]
pub struct ProductArgs {
    /// Hindi name
    #[arg(long, default_value = "")]
    name_hi: String,

    /// English name
    #[arg(long, default_value = "")]
    name_en: String,

    /// Display price, e.g. "₹60 / 250g"
    #[arg(long, default_value = "")]
    price: String,

    /// Numeric price used for cart totals
    #[arg(long, default_value = "")]
    price_num: String,

    /// Image URL
    #[arg(long, default_value = "")]
    img: String,
}

impl ProductArgs {
    fn into_form(self, id: Option<ProductId>) -> ProductForm {
        ProductForm {
            id,
            name_hi: self.name_hi,
            name_en: self.name_en,
            price: self.price,
            price_num: self.price_num,
            img: self.img,
        }
    }
}

pub async fn run(action: AdminAction, config: &StorefrontConfig) -> Result<(), CommandError> {
    let client = AdminClient::new(config)?;
    let catalog = CatalogClient::new(ShopClient::new(config)?);
    let mut panel = AdminPanel::open(client, catalog).await?;

    let outcome = match action {
        AdminAction::Create(fields) => panel.create(&fields.into_form(None)).await?,
        AdminAction::Update { id, fields } => panel.update(&fields.into_form(Some(id))).await?,
        AdminAction::Delete { id, yes } => {
            panel
                .delete(id, |prompt| yes || confirm_on_terminal(prompt))
                .await?
        }
        AdminAction::Edit { id, name, price } => {
            panel.edit(id, &InlineEdit { name, price }).await?
        }
        AdminAction::Settings { values } => {
            panel.save_settings(&parse_settings(&values)?).await?;
            emit("Settings saved\n")?;
            return Ok(());
        }
    };

    match outcome {
        AdminOutcome::Applied => emit(&catalog_text(&CatalogView::new(panel.products())))?,
        AdminOutcome::Cancelled => emit("Cancelled\n")?,
    }
    Ok(())
}

fn parse_settings(values: &[String]) -> Result<SiteSettings, CommandError> {
    values
        .iter()
        .map(|raw| {
            raw.split_once('=')
                .filter(|(key, _)| !key.trim().is_empty())
                .map(|(key, value)| (key.trim().to_string(), value.to_string()))
                .ok_or_else(|| CommandError::InvalidSetting(raw.clone()))
        })
        .collect()
}
