pub mod choices;
pub mod session;

pub use choices::{ChoiceStore, JsonFileChoiceStore};
pub use session::{JsonFileSessionStore, SessionStore, STORAGE_KEY};
