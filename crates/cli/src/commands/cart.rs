//! Session cart commands.
//!
//! The session cookie is saved in the storage file (`POOJABDI_CART_FILE`)
//! after every command and restored before the next, so consecutive
//! invocations work on the same server cart.

use clap::Subcommand;

use poojabdi_core::ProductId;
use poojabdi_storefront::view::cart_text;
use poojabdi_storefront::{
    JsonFileStore, SessionCart, SessionCookies, ShopClient, StorefrontConfig,
};

use super::{CommandError, emit};

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart joined against the current catalog
    Show,
    /// Print the total item count
    Count,
    /// Add units of a product
    Add {
        /// Product id
        id: ProductId,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        qty: u32,
    },
    /// Remove a product entirely
    Remove {
        /// Product id
        id: ProductId,
    },
    /// Set a product's quantity; zero or less removes it
    Set {
        /// Product id
        id: ProductId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        qty: i64,
    },
}

pub async fn run(action: CartAction, config: &StorefrontConfig) -> Result<(), CommandError> {
    let client = ShopClient::new(config)?;
    let cookies = SessionCookies::new(JsonFileStore::new(&config.storage_path));
    cookies.restore(&client)?;

    let result = apply(action, &SessionCart::over_http(&client)).await;
    // A failed command may still have started a session
    cookies.persist(&client)?;
    result
}

async fn apply(action: CartAction, cart: &SessionCart) -> Result<(), CommandError> {
    match action {
        CartAction::Show => {}
        CartAction::Count => {
            emit(&format!("{}\n", cart.count().await?))?;
            return Ok(());
        }
        CartAction::Add { id, qty } => cart.add(id, qty).await?,
        CartAction::Remove { id } => cart.remove(id).await?,
        CartAction::Set { id, qty } => cart.change_quantity(id, qty).await?,
    }

    emit(&cart_text(&cart.view().await?))?;
    Ok(())
}
