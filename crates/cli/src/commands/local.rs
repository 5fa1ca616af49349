//! Local cart commands.
//!
//! The local cart lives in the storage file named by `POOJABDI_CART_FILE`
//! (or `--storage`) and survives between invocations.

use clap::Subcommand;
use tracing::info;

use poojabdi_core::ProductId;
use poojabdi_storefront::view::cart_text;
use poojabdi_storefront::{
    CatalogClient, JsonFileStore, LocalCartStore, ShopClient, StorefrontConfig,
};

use super::{CommandError, emit};

#[derive(Subcommand)]
pub enum LocalAction {
    /// Show the cart with the titles and prices captured when added
    Show,
    /// Print the total item count
    Count,
    /// Add one unit of a catalog product
    Add {
        /// Product id
        id: ProductId,
    },
    /// Place the order and clear the cart
    Checkout,
}

pub async fn run(action: LocalAction, config: &StorefrontConfig) -> Result<(), CommandError> {
    let cart = LocalCartStore::new(JsonFileStore::new(&config.storage_path));

    match action {
        LocalAction::Show => {}
        LocalAction::Count => {
            emit(&format!("{}\n", cart.count()))?;
            return Ok(());
        }
        LocalAction::Add { id } => {
            let catalog = CatalogClient::new(ShopClient::new(config)?);
            let products = catalog.fetch().await?;
            let product = products
                .iter()
                .find(|p| p.id == id)
                .ok_or(CommandError::UnknownProduct(id))?;
            cart.add(id, product.display_name(), product.price_num)?;
        }
        LocalAction::Checkout => {
            let count = cart.count();
            cart.checkout()?;
            info!(items = count, "Order placed");
            emit("Order placed\n")?;
            return Ok(());
        }
    }

    emit(&cart_text(&cart.view()))?;
    Ok(())
}
