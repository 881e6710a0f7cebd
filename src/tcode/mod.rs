//! TCode wire protocol.
//!
//! Every tick produces one line of space-separated tokens, each made of the
//! axis code followed by a four digit magnitude, terminated by `\n`:
//!
//! ```text
//! L04800 R05000 A29999
//! ```

mod encoder;

pub use encoder::{decode_value, encode_line, encode_value, parse_token, value_code, MAX_CODE};
