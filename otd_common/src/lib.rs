mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use money::{Money, MoneyConversionError, DEFAULT_CURRENCY_SYMBOL, MISSING_AMOUNT};
pub use secret::Secret;
