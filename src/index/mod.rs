//! Inverted symbol index and its published store
//!
//! - `tokenizer` - splits names into searchable keys
//! - `result` - the records an index hands back
//! - `inverted` - key to record mapping built during one index build
//! - `store` - holder of the last published build

pub mod inverted;
pub mod result;
pub mod store;
pub mod tokenizer;

pub use inverted::{Posting, SearchIndex};
pub use result::{ResultEntry, ResultKind, SearchResult};
pub use store::{IndexSnapshot, IndexStore};
pub use tokenizer::{Tokenizer, DEFAULT_MIN_TOKEN_LEN, SEPARATORS};
