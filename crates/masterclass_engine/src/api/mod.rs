/* 📖 # What does the api module serve?

HTTP services built on masterclass_base's HttpService trait, so they run
unchanged behind RealPal's server and MockPal's simulated requests.
*/

mod feedback;
mod service;

pub use feedback::{Feedback, FeedbackService};
pub use service::ApiService;
