//! Integration tests for Layer 0: Foundation
//!
//! Tests for attribute value kinds and the text and binary codecs.

mod values;
