//! Transport layer: carrier wire formats (encoding/decoding), no I/O.

pub mod chuanglan;
mod money;
pub mod yunpian;
