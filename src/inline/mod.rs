//! Inline scanning: the mid-line half of the dispatch.

mod delimiter;
