//! Integration test crate for LutCam.
//!
//! Holds cross-crate scenarios driving a full capture session against
//! recording fakes. No camera or GPU required.

#[cfg(test)]
mod fakes;

#[cfg(test)]
mod forwarding;

#[cfg(test)]
mod lifecycle;
