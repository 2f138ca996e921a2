//! Contains the [FilterOpt] trait for selecting the packet ids to read.

/// Options for filtering the packets read from the input.
pub trait FilterOpt {
    /// Packet ids to keep, all packets are kept if empty.
    fn filter_packet_ids(&self) -> &[i32];

    /// Whether a packet with `packet_id` passes the filter.
    fn is_filter_target(&self, packet_id: i32) -> bool {
        let ids = self.filter_packet_ids();
        ids.is_empty() || ids.contains(&packet_id)
    }
}

impl<T> FilterOpt for &T
where
    T: FilterOpt,
{
    fn filter_packet_ids(&self) -> &[i32] {
        (*self).filter_packet_ids()
    }
}

impl<T> FilterOpt for Box<T>
where
    T: FilterOpt,
{
    fn filter_packet_ids(&self) -> &[i32] {
        (**self).filter_packet_ids()
    }
}

impl<T> FilterOpt for std::sync::Arc<T>
where
    T: FilterOpt,
{
    fn filter_packet_ids(&self) -> &[i32] {
        (**self).filter_packet_ids()
    }
}
