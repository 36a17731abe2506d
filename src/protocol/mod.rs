//! # Output Protocols
//!
//! Low-level builders for the byte formats labels are emitted in.
//!
//! ## Module Structure
//!
//! - [`epl`]: EPL positional commands (`N`, `q`, `Q`, `A`, `B`, `P`)
//! - [`pdf`]: Minimal PDF object and content-stream writer
//! - [`charset`]: ASCII and WinAnsi single-byte encoders
//!
//! ## Usage Example
//!
//! ```
//! use scale_labeler::protocol::epl::{self, EplJob};
//!
//! let mut job = EplJob::new(406, 406, epl::DEFAULT_GAP_DOTS);
//! job.push(epl::text(20, 20, "TEST PRINT"));
//! assert_eq!(job.finish(1), "N\nq406\nQ406,24\nA20,20,0,3,1,1,N,\"TEST PRINT\"\nP1");
//! ```

pub mod charset;
pub mod epl;
pub mod pdf;
