//! Job state & progress stream (C7) and the results store (C8): the
//! per-job singleton, its WebSocket stream actor, and write-once/read-many
//! result storage (§4.7, §4.8).

pub mod job;
pub mod messages;
pub mod registry;
pub mod results_store;
pub mod stream;

pub use job::{JobHandle, WaitForReadyOutcome};
pub use messages::{ClientMessage, StreamMessage, StreamPayload, PROTOCOL_VERSION};
pub use registry::JobRegistry;
pub use results_store::{ResultsStore, ResultsStoreError, MAX_PAYLOAD_BYTES, RESULTS_TTL};
pub use stream::JobStreamActor;
