//! Placeholder lib target. The actual content of this crate is the
//! black-box integration suite under `tests/`, exercised against the
//! public APIs of the other workspace crates (§10 of `SPEC_FULL.md`).
