pub mod bucket_index;
pub mod chrono_list;
pub mod skip_index;
pub mod slot_arena;

pub use bucket_index::{
    BucketLink, HashedIndex, DEFAULT_BUCKET_COUNT, DEFAULT_MAX_LOAD_FACTOR,
};
pub use chrono_list::{ChronoLinks, ChronoList};
pub use skip_index::{OrderedIndex, SkipLink};
pub use slot_arena::{SlotArena, SlotId};
