//! XMLTV document handling
//!
//! The lexer extracts channel and programme records structurally (the input
//! is well-formed upstream XMLTV, not arbitrary XML), the time module is the
//! timestamp codec and the writer streams the merged guide back out.

pub mod lexer;
pub mod time;
pub mod writer;
