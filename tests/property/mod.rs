//! Property-based tests for ordering and retry guarantees

mod resolver_order;
