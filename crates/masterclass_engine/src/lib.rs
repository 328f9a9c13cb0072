/* 📖 # What is in masterclass_engine?

The site search pipeline (index source, term extraction, ranking,
highlighting, card rendering and the query controller that drives them) plus
the HTTP services that expose search and the feedback relay.
*/

pub mod api;
pub mod cards;
pub mod config;
pub mod controller;
pub mod highlight;
pub mod persistence;
pub mod ranking;
pub mod record;
pub mod source;
pub mod terms;

pub use api::{ApiService, Feedback, FeedbackService};
pub use cards::{CardRow, build_card_rows, render_cards_html};
pub use config::{Config, load_config};
pub use controller::{QueryController, QueryState, QueryTicket};
pub use highlight::{Segment, TextElement, highlight, highlight_elements};
pub use persistence::{AddressBar, MemoryQueryState, QueryPersistence};
pub use ranking::{Match, Tier, filter, rank};
pub use record::ResultRecord;
pub use source::{IndexSource, SourceError, fetch_results, parse_index};
pub use terms::extract_terms;
