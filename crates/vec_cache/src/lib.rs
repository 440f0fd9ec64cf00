/*!
# Vector Cache

Bounded in-memory caches that let the pipeline skip recomputing embeddings,
query results and derived artifacts.

One generic [`Cache`] carries all the mechanics:

- capacity checked on every `set`, evicting the least-frequently-used entry
  (oldest first among ties)
- optional TTL, enforced lazily on `get`
- injectable [`Clock`] so expiry is testable without sleeping

[`EmbeddingCache`], [`QueryCache`] and [`ResultCache`] are instantiations of it
that differ only in key meaning and defaults ([`CacheKind`]).

Caches are not synchronized; wrap them in a lock when sharing across tasks.
*/

pub mod cache;
pub mod clock;
pub mod entry;
pub mod kinds;
pub mod stats;

pub use cache::Cache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use kinds::{CacheKind, EmbeddingCache, QueryCache, ResultCache};
pub use stats::CacheStats;
