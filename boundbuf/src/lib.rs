//! # boundbuf - Bounded Buffer With Graceful Shutdown
//!
//! A fixed-capacity FIFO shared by one producing thread and any number of
//! consuming threads. Producers block while the buffer is full, consumers
//! block while it is empty, and a one-shot shutdown transition releases
//! every blocked party without discarding buffered items.
//!
//! ## Creating a Buffer
//!
//! ```rust
//! use boundbuf::BoundedBuffer;
//!
//! let buffer = BoundedBuffer::<u64>::new(8)?;
//! assert_eq!(buffer.capacity(), 8);
//! # Ok::<(), boundbuf::BoundBufError>(())
//! ```
//!
//! Capacity must be at least 1. Storage is allocated once, up front.
//!
//! ## Putting and Taking
//!
//! ```rust
//! use boundbuf::{BoundedBuffer, PutOutcome, TakeOutcome};
//!
//! let buffer = BoundedBuffer::new(2)?;
//!
//! assert_eq!(buffer.put(1u64), PutOutcome::Stored { count: 1 });
//! assert_eq!(buffer.take(), TakeOutcome::Taken { value: 1, count: 0 });
//! # Ok::<(), boundbuf::BoundBufError>(())
//! ```
//!
//! `put` blocks while all slots are occupied and `take` blocks while none are.
//! The returned `count` is the occupancy right after the operation.
//!
//! ## Shutting Down
//!
//! ```rust
//! use boundbuf::{BoundedBuffer, PutOutcome, TakeOutcome};
//!
//! let buffer = BoundedBuffer::new(4)?;
//! let _ = buffer.put(10u64);
//!
//! assert!(buffer.trigger_shutdown());
//! assert!(!buffer.trigger_shutdown()); // already shut down
//!
//! // New work is refused and handed back...
//! assert_eq!(buffer.put(11), PutOutcome::Rejected(11));
//!
//! // ...while accepted work is still delivered.
//! assert_eq!(buffer.take(), TakeOutcome::Taken { value: 10, count: 0 });
//! assert_eq!(buffer.take(), TakeOutcome::Drained);
//! # Ok::<(), boundbuf::BoundBufError>(())
//! ```
//!
//! ## Threads
//!
//! ```rust
//! use boundbuf::{BoundedBuffer, TakeOutcome};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let buffer = Arc::new(BoundedBuffer::new(4)?);
//!
//! let consumer = {
//!     let buffer = buffer.clone();
//!     thread::spawn(move || {
//!         let mut sum = 0u64;
//!         while let TakeOutcome::Taken { value, .. } = buffer.take() {
//!             sum += value;
//!         }
//!         sum
//!     })
//! };
//!
//! for value in 1..=100u64 {
//!     let _ = buffer.put(value);
//! }
//! buffer.trigger_shutdown();
//!
//! assert_eq!(consumer.join().unwrap(), 5050);
//! # Ok::<(), boundbuf::BoundBufError>(())
//! ```
//!
//! ## Monitoring
//!
//! ```rust
//! # use boundbuf::BoundedBuffer;
//! # let buffer = BoundedBuffer::<u64>::new(4)?;
//! let snapshot = buffer.snapshot();
//! assert_eq!(snapshot.produced - snapshot.consumed, snapshot.count as u64);
//! # Ok::<(), boundbuf::BoundBufError>(())
//! ```

pub use buffer::{BoundedBuffer, PutOutcome, Snapshot, TakeOutcome};
pub use error::BoundBufError;
pub use ring::RingSlots;

mod trace_macro;

pub(crate) mod buffer;
pub mod error;
#[cfg(all(test, feature = "loom"))]
pub(crate) mod loom;
pub mod ring;
pub(crate) mod sync;
