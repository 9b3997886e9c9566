//! Shared data models for the hotel CRM client.
//!
//! This crate provides Serde-serializable types for:
//! - Hotels, contacts, bookings, guests and support tickets
//! - Normalization of loosely-typed API payloads into those records
//! - Sort and filter specifications for hotel queries
//! - The paged result envelope

pub mod booking;
pub mod contact;
pub mod error;
pub mod guest;
pub mod hotel;
pub mod paging;
pub mod query;
pub mod record;
pub mod serde_helpers;
pub mod ticket;

// Re-export common types
pub use booking::{Booking, BookingStatus, RawBooking};
pub use contact::{Contact, RawContact};
pub use error::{ModelError, ModelResult};
pub use guest::{Guest, RawGuest};
pub use hotel::{Hotel, RawHotel};
pub use paging::{PageEnvelope, PagedResult};
pub use query::{FilterSpec, HotelSortField, SortOrder, SortSpec};
pub use record::{normalize_items, Record};
pub use ticket::{RawTicket, Ticket, TicketPriority, TicketStatus};
