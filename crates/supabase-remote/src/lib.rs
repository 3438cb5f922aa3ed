//! Supabase implementation of the coupon client capabilities.
//!
//! [`SupabaseRemote`] talks to GoTrue for auth, to an edge function for
//! favourite counters and to the `Stats` table for telemetry. The access
//! token lives in memory only.

mod client;
mod error;

pub use client::{stats_event_type, SupabaseRemote};
pub use error::{SupabaseError, SupabaseResult};
