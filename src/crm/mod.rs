pub mod fetcher;
pub mod records;
pub mod traits;

pub use fetcher::LimeFetcher;
pub use traits::CrmSource;
