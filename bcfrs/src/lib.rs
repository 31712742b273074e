#[cfg(feature = "core")]
#[doc(inline)]
pub use bcfrs_core as core;

#[cfg(feature = "codec")]
#[doc(inline)]
pub use bcfrs_codec as codec;

#[cfg(feature = "reader")]
#[doc(inline)]
pub use bcfrs_reader as reader;
