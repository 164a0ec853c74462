pub(crate) mod message_hash;
pub(crate) mod network;
pub(crate) mod sign;
pub(crate) mod status;
pub(crate) mod tx_hash;
