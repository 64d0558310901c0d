//! # Inventory Loading
//!
//! Fetches the stock list once per POS session and turns it into the
//! read-only [`InventorySnapshot`] the cart checks stock ceilings against.

use tally_core::InventorySnapshot;
use tracing::{info, instrument};

use crate::backend::PosBackend;
use crate::context::SessionContext;
use crate::error::{BackendError, ClientResult};

/// Loads the session inventory.
///
/// A single record with a negative price or stock fails the whole load.
#[instrument(skip_all)]
pub async fn load_inventory(
    backend: &dyn PosBackend,
    session: &SessionContext,
) -> ClientResult<InventorySnapshot> {
    let records = backend.fetch_inventory(session).await?;

    let items = records
        .into_iter()
        .map(|record| record.into_item())
        .collect::<Result<Vec<_>, BackendError>>()?;

    let snapshot = InventorySnapshot::new(items);
    info!(
        items = snapshot.len(),
        low_stock = snapshot.low_stock().len(),
        "Inventory snapshot loaded"
    );
    Ok(snapshot)
}
