pub mod controller;
pub mod policy;
pub mod traits;
pub mod url_state;

pub use controller::{ClientSearchController, ControllerState, SearchEvent};
pub use traits::{HistoryBinding, MemoryHistory, SearchBackend};
pub use url_state::{read_from_url, write_to_url, SearchKey};
