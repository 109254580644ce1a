mod name;
mod vesting;

pub use name::is_valid_account_name;
pub use vesting::{CddVestingPolicy, LinearVestingPolicy, VestingContext, VestingPolicy};
