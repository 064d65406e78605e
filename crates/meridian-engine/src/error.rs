use meridian_bank::BankError;
use meridian_pricefeed::PriceFeedError;
use meridian_stablecoin::StablecoinError;
use meridian_store::StoreError;
use meridian_types::decimal::DecimalError;
use meridian_vpool::VpoolError;

/// Any failure surfaced by an [`App`](crate::App) call.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    PriceFeed(#[from] PriceFeedError),

    #[error(transparent)]
    Vpool(#[from] VpoolError),

    #[error(transparent)]
    Stablecoin(#[from] StablecoinError),

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Decimal(#[from] DecimalError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
