pub mod entry;
pub mod ledger;
pub mod new_entries;
pub mod observed_rate;
pub mod price;
pub mod price_graph;
pub mod projector;
