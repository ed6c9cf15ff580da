//! Flutter bridge surface for Pendulum.

pub mod api;
