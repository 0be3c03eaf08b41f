//! Pure state transitions. Each takes the current state by value and hands
//! back the next one; hosts commit the returned value by replacement.

mod accrual;
mod castle;
mod purchase;

pub use accrual::tick;
pub use castle::upgrade_castle;
pub use purchase::purchase_tile;
