pub mod aggregator;
pub mod notifications;

pub use aggregator::{
    parse_population, population_stats, summarize_delimited, Aggregator, END_YEAR, START_YEAR,
};
pub use notifications::{BatchItemFailure, BatchResponse, NotificationHandler, QueueBatch, QueueMessage};
