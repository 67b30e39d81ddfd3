pub mod category;
pub mod error;
pub mod money;
pub mod rule;
pub mod transaction;

pub use category::{find_subcategory, Subcategory};
pub use error::CoreError;
pub use money::Money;
pub use rule::{blank, non_blank, Rule, RuleActions, RuleMatch, RuleOptions, Terms};
pub use transaction::{Confidence, DraftTransaction, HistoricalTransaction};
