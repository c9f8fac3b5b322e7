//! Pipeline stages between a chosen file and the service reply.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the transport can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ gemini
//! (%PDF?)   (base64)   (generateContent)
//! ```
//!
//! 1. [`input`]: check the user's path is a readable PDF before it is
//!    selected
//! 2. [`encode`]: read the file once and base64-wrap it for the JSON body
//! 3. [`gemini`]: the single network call; the only stage with network I/O

pub mod encode;
pub mod gemini;
pub mod input;
