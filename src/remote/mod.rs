pub mod fetcher;
pub mod lister;
pub mod static_fetcher;

pub use fetcher::{FetchedResponse, Fetcher, HttpFetcher};
pub use lister::{parse_listing, RemoteLister};
pub use static_fetcher::StaticFetcher;
