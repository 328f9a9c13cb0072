/* 📖 # Why have masterclass_base as a core library?
masterclass_base provides the error type, tracing setup and platform abstraction
used by the engine and the CLI. Keeping them here prevents circular dependencies
and gives every crate the same error handling.
*/

pub mod error;
pub mod pal;
pub mod tracing;

pub use error::{ErrorKind, MasterclassError, MasterclassResult, ResultExt};
pub use pal::{FilePath, MockPal, Pal, PalHandle, RealPal};
