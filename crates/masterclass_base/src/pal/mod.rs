/* 📖 # What is the Platform Abstraction Layer?

The PAL puts files, outgoing HTTP and the HTTP server behind one trait so that
the search pipeline and the feedback relay run unchanged against RealPal in
production and MockPal in tests.
*/

mod file_path;
pub mod http;
pub mod mock;
pub mod real_pal;
mod traits;

pub use file_path::FilePath;
pub use mock::MockPal;
pub use real_pal::RealPal;
pub use traits::{Pal, PalHandle};
