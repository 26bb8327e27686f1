pub mod item;

pub use item::{ActionItem, Field, HistoryEntry, ItemId, ItemPatch, ParseStatusError, Status};
