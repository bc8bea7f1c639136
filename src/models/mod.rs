pub mod invoice;
pub mod ledger;
pub mod result;
pub mod table;

pub use invoice::InvoiceRecord;
pub use ledger::{GroupKey, LedgerGroup, LedgerLine};
pub use result::{
    MatchResult, MatchSummary, MatchTier, ReconciledRow, ResultTable, MANUAL_REVIEW,
};
pub use table::{Cell, RawTable};
