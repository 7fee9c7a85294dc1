//! Tests for the graph resolver module.
//!
//! Organized by functionality:
//! - Direct tuples, wildcards and userset tuples
//! - Computed usersets and tuple-to-userset
//! - Union, intersection and exclusion
//! - Safety features (depth limiting, cycle handling, deadlines, cancellation)
//! - Store failures


mod resolver_tests;
