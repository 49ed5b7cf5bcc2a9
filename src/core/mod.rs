pub mod etl;
pub mod extract;
pub mod load;
pub mod query;
pub mod transform;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{Dataset, EnrichedRecord, Extracted, QueryResult, RawRecord};
pub use crate::domain::ports::{PageSource, ProgressLog};
pub use crate::utils::error::Result;
